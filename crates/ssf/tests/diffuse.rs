//! Diffuse filter: invariances of the diffuse likelihood.

use approx::assert_abs_diff_eq;
use kalmar_ssf::{DiffuseConfig, DiffuseFilter, DiffuseStrategy, FilterResults, MatrixSsf, Ssf};
use ndarray::{Array1, Array2, array};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

fn series(n: usize, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut level = 0.0;
    (0..n)
        .map(|_| {
            level += 0.3 * normal.sample(&mut rng);
            level + normal.sample(&mut rng)
        })
        .collect()
}

fn trend_model(b: Array2<f64>) -> MatrixSsf {
    MatrixSsf::new(
        array![[1.0, 1.0], [0.0, 1.0]],
        array![[0.1, 0.0], [0.0, 0.01]],
        array![1.0, 0.0],
        1.0,
        Array2::zeros((2, 2)),
    )
    .unwrap()
    .with_diffuse_constraints(b)
    .unwrap()
}

fn total_determinant(res: &FilterResults) -> f64 {
    res.likelihood().log_determinant() + res.likelihood().diffuse_correction()
}

#[test]
fn likelihood_does_not_depend_on_the_diffuse_basis() {
    let y = series(30, 11);
    let filter = DiffuseFilter::default();
    let a = filter
        .filter(&trend_model(Array2::eye(2)), y.view())
        .unwrap();
    let b = filter
        .filter(&trend_model(array![[2.0, 1.0], [0.0, 3.0]]), y.view())
        .unwrap();
    assert_abs_diff_eq!(a.likelihood().ssq(), b.likelihood().ssq(), epsilon = 1e-9);
    assert_abs_diff_eq!(total_determinant(&a), total_determinant(&b), epsilon = 1e-9);
    assert_abs_diff_eq!(
        a.likelihood().log_likelihood(),
        b.likelihood().log_likelihood(),
        epsilon = 1e-9
    );
    assert_eq!(a.likelihood().degrees_of_freedom(), 28);
}

#[test]
fn collapsing_and_augmented_strategies_agree() {
    let y = series(25, 3);
    let model = Ssf::from(trend_model(Array2::eye(2)));
    let collapsing = DiffuseFilter::default().filter(&model, y.view()).unwrap();
    let augmented = DiffuseFilter::new(DiffuseConfig::new().with_strategy(DiffuseStrategy::Augmented))
        .filter(&model, y.view())
        .unwrap();
    assert!(collapsing.collapse_position().is_some());
    assert_eq!(augmented.collapse_position(), None);
    assert_abs_diff_eq!(
        collapsing.likelihood().ssq(),
        augmented.likelihood().ssq(),
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        total_determinant(&collapsing),
        total_determinant(&augmented),
        epsilon = 1e-9
    );
    assert_eq!(
        collapsing.likelihood().degrees_of_freedom(),
        augmented.likelihood().degrees_of_freedom()
    );
}

#[test]
fn leading_missing_values_delay_the_collapse() {
    let mut y = series(12, 5);
    y[0] = f64::NAN;
    y[1] = f64::NAN;
    let res = DiffuseFilter::default()
        .filter(&trend_model(Array2::eye(2)), y.view())
        .unwrap();
    assert_eq!(res.likelihood().n(), 10);
    assert_eq!(res.collapse_position(), Some(3));
}

#[test]
fn unidentified_direction_is_dropped() {
    // The second state element never reaches the observation.
    let model = MatrixSsf::new(
        Array2::eye(2),
        array![[0.5, 0.0], [0.0, 0.2]],
        array![1.0, 0.0],
        0.0,
        array![[0.0, 0.0], [0.0, 0.0]],
    )
    .unwrap()
    .with_diffuse_constraints(Array2::eye(2))
    .unwrap();
    let noisy = Ssf::composite(vec![
        Ssf::from(model),
        Ssf::noise(1.0).unwrap(),
    ])
    .unwrap();
    let reference = Ssf::composite(vec![Ssf::local_level(0.5).unwrap(), Ssf::noise(1.0).unwrap()])
        .unwrap();

    let y = series(15, 9);
    let res = DiffuseFilter::default().filter(&noisy, y.view()).unwrap();
    let expected = DiffuseFilter::default().filter(&reference, y.view()).unwrap();

    assert_eq!(res.collapse_position(), None);
    assert_eq!(res.dropped_directions(), 1);
    assert_eq!(res.likelihood().diffuse_dim(), 1);
    assert_eq!(res.likelihood().degrees_of_freedom(), 14);
    assert_abs_diff_eq!(res.likelihood().ssq(), expected.likelihood().ssq(), epsilon = 1e-9);
    assert_abs_diff_eq!(total_determinant(&res), total_determinant(&expected), epsilon = 1e-9);
}

#[test]
fn regression_coefficients_are_concentrated_out() {
    // y_t = β·x_t + ε_t with a diffuse β: the likelihood is the OLS one.
    let x = array![[1.0], [2.0], [0.5], [-1.0], [3.0]];
    let y = array![2.1, 3.9, 1.2, -1.8, 6.1];
    let ssf = Ssf::noise(1.0)
        .unwrap()
        .with_regression(x.clone(), kalmar_ssf::Coefficients::Fixed)
        .unwrap();
    let res = DiffuseFilter::default().filter(&ssf, y.view()).unwrap();

    let xx: f64 = x.column(0).iter().map(|v| v * v).sum();
    let xy: f64 = x.column(0).iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let beta = xy / xx;
    let rss: f64 = x
        .column(0)
        .iter()
        .zip(y.iter())
        .map(|(a, b)| (b - beta * a).powi(2))
        .sum();
    let ll = res.likelihood();
    assert_eq!(ll.degrees_of_freedom(), 4);
    assert_abs_diff_eq!(ll.ssq(), rss, epsilon = 1e-10);
    assert_abs_diff_eq!(total_determinant(&res), xx.ln(), epsilon = 1e-10);
}
