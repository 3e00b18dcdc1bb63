use kalmar_arima::SarimaMapping;
use kalmar_regarima::{EstimationConfig, RegArimaEstimator, RegArimaModel};
use ndarray::{Array1, Array2};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

#[test]
fn recovers_arima_110_with_a_regression_effect() {
    let (n, phi, beta) = (400, 0.5, 2.0);
    let mut rng = StdRng::seed_from_u64(2024);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let x = Array2::from_shape_fn((n, 1), |(t, _)| if t % 7 == 0 { 1.0 } else { 0.0 });

    let mut w = 0.0;
    let mut level = 0.0;
    let mut y = Array1::zeros(n);
    for t in 0..n {
        w = phi * w + normal.sample(&mut rng);
        level += w;
        y[t] = level + beta * x[[t, 0]];
    }
    y[100] = f64::NAN;

    let model = RegArimaModel::builder(y).with_regressors(x).build().unwrap();
    let fit = RegArimaEstimator::new(EstimationConfig::new().with_max_iters(500))
        .estimate(&model, SarimaMapping::new(1, 1, 0))
        .unwrap();

    let arima = fit.model().arima();
    assert_eq!(arima.differencing_order(), 1);
    let estimated_phi = -arima.ar().get(1);
    assert!((estimated_phi - phi).abs() < 0.1, "phi = {estimated_phi}");
    let estimated_beta = fit.likelihood().coefficients()[0];
    assert!((estimated_beta - beta).abs() < 0.3, "beta = {estimated_beta}");
    assert_eq!(fit.likelihood().missing_estimates().len(), 1);
    assert_eq!(fit.statistics().parameters(), 3);
    assert!(fit.statistics().aic() > fit.statistics().log_likelihood() * -2.0);
}
