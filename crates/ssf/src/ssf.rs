//! The closed set of state-space models.

use kalmar_arima::ArimaModel;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::arima::ArimaSsf;
use crate::arma::ArmaSsf;
use crate::composite::CompositeSsf;
use crate::error::SsfError;
use crate::matrix::MatrixSsf;
use crate::model::{Dynamics, Initialization, Measurement};
use crate::regression::{Coefficients, RegSsf};
use crate::structural::{LocalLevel, LocalLinearTrend, Noise, Seasonal};

/// A state-space model.
///
/// Every variant implements [`Initialization`], [`Dynamics`] and
/// [`Measurement`]; the enum forwards to the variant, so the filters are
/// monomorphic over `Ssf` and composites nest without boxing each call.
#[derive(Clone, Debug, PartialEq)]
pub enum Ssf {
    /// Stationary ARMA.
    Arma(ArmaSsf),
    /// ARIMA with diffuse unit roots.
    Arima(ArimaSsf),
    /// White noise.
    Noise(Noise),
    /// Random-walk level.
    LocalLevel(LocalLevel),
    /// Level and slope.
    LocalLinearTrend(LocalLinearTrend),
    /// Dummy seasonal.
    Seasonal(Seasonal),
    /// Dense time-invariant model.
    Matrix(MatrixSsf),
    /// Independent components sharing one observation.
    Composite(CompositeSsf),
    /// Base model with regression effects in the state.
    Regression(RegSsf),
}

macro_rules! dispatch {
    ($self:ident, $m:ident => $body:expr) => {
        match $self {
            Ssf::Arma($m) => $body,
            Ssf::Arima($m) => $body,
            Ssf::Noise($m) => $body,
            Ssf::LocalLevel($m) => $body,
            Ssf::LocalLinearTrend($m) => $body,
            Ssf::Seasonal($m) => $body,
            Ssf::Matrix($m) => $body,
            Ssf::Composite($m) => $body,
            Ssf::Regression($m) => $body,
        }
    };
}

impl Ssf {
    /// Stationary ARMA model.
    pub fn arma(model: &ArimaModel) -> Result<Self, SsfError> {
        Ok(Self::Arma(ArmaSsf::new(model)?))
    }

    /// ARIMA model; the unit roots become diffuse lags.
    pub fn arima(model: &ArimaModel) -> Result<Self, SsfError> {
        Ok(Self::Arima(ArimaSsf::new(model)?))
    }

    /// White noise of variance `var`.
    pub fn noise(var: f64) -> Result<Self, SsfError> {
        Ok(Self::Noise(Noise::new(var)?))
    }

    /// Local level with disturbance variance `var`.
    pub fn local_level(var: f64) -> Result<Self, SsfError> {
        Ok(Self::LocalLevel(LocalLevel::new(var)?))
    }

    /// Local linear trend.
    pub fn local_linear_trend(level_var: f64, slope_var: f64) -> Result<Self, SsfError> {
        Ok(Self::LocalLinearTrend(LocalLinearTrend::new(
            level_var, slope_var,
        )?))
    }

    /// Dummy seasonal.
    pub fn seasonal(period: usize, var: f64) -> Result<Self, SsfError> {
        Ok(Self::Seasonal(Seasonal::new(period, var)?))
    }

    /// Sum of independent components.
    pub fn composite(components: Vec<Ssf>) -> Result<Self, SsfError> {
        Ok(Self::Composite(CompositeSsf::new(components)?))
    }

    /// `self` with the regression variables `x` in the state.
    pub fn with_regression(
        self,
        x: Array2<f64>,
        coefficients: Coefficients,
    ) -> Result<Self, SsfError> {
        Ok(Self::Regression(RegSsf::new(self, x, coefficients)?))
    }
}

impl From<MatrixSsf> for Ssf {
    fn from(m: MatrixSsf) -> Self {
        Self::Matrix(m)
    }
}

impl Initialization for Ssf {
    fn dim(&self) -> usize {
        dispatch!(self, m => m.dim())
    }

    fn diffuse_dim(&self) -> usize {
        dispatch!(self, m => m.diffuse_dim())
    }

    fn a0(&self, a: ArrayViewMut1<'_, f64>) {
        dispatch!(self, m => m.a0(a))
    }

    fn pf0(&self, p: ArrayViewMut2<'_, f64>) {
        dispatch!(self, m => m.pf0(p))
    }

    fn diffuse_constraints(&self, b: ArrayViewMut2<'_, f64>) {
        dispatch!(self, m => m.diffuse_constraints(b))
    }
}

impl Dynamics for Ssf {
    fn state_dim(&self) -> usize {
        dispatch!(self, m => m.state_dim())
    }

    fn is_time_invariant(&self) -> bool {
        dispatch!(self, m => Dynamics::is_time_invariant(m))
    }

    fn innovations_dim(&self) -> usize {
        dispatch!(self, m => m.innovations_dim())
    }

    fn has_innovations(&self, t: usize) -> bool {
        dispatch!(self, m => m.has_innovations(t))
    }

    fn v(&self, t: usize, v: ArrayViewMut2<'_, f64>) {
        dispatch!(self, m => m.v(t, v))
    }

    fn s(&self, t: usize, s: ArrayViewMut2<'_, f64>) {
        dispatch!(self, m => m.s(t, s))
    }

    fn tx(&self, t: usize, x: ArrayViewMut1<'_, f64>) {
        dispatch!(self, m => m.tx(t, x))
    }

    fn xt(&self, t: usize, x: ArrayViewMut1<'_, f64>) {
        dispatch!(self, m => m.xt(t, x))
    }

    fn add_v(&self, t: usize, p: ArrayViewMut2<'_, f64>) {
        dispatch!(self, m => m.add_v(t, p))
    }

    fn tm(&self, t: usize, x: ArrayViewMut2<'_, f64>) {
        dispatch!(self, m => m.tm(t, x))
    }

    fn tvt(&self, t: usize, p: ArrayViewMut2<'_, f64>) {
        dispatch!(self, m => m.tvt(t, p))
    }

    fn tnt(&self, t: usize, n: ArrayViewMut2<'_, f64>) {
        dispatch!(self, m => m.tnt(t, n))
    }
}

impl Measurement for Ssf {
    fn loading_dim(&self) -> usize {
        dispatch!(self, m => m.loading_dim())
    }

    fn is_time_invariant(&self) -> bool {
        dispatch!(self, m => Measurement::is_time_invariant(m))
    }

    fn observation_capacity(&self) -> Option<usize> {
        dispatch!(self, m => m.observation_capacity())
    }

    fn z(&self, t: usize, z: ArrayViewMut1<'_, f64>) {
        dispatch!(self, m => m.z(t, z))
    }

    fn zx(&self, t: usize, x: ArrayView1<'_, f64>) -> f64 {
        dispatch!(self, m => m.zx(t, x))
    }

    fn zm(&self, t: usize, x: ArrayView2<'_, f64>, out: ArrayViewMut1<'_, f64>) {
        dispatch!(self, m => m.zm(t, x, out))
    }

    fn zvz(&self, t: usize, v: ArrayView2<'_, f64>) -> f64 {
        dispatch!(self, m => m.zvz(t, v))
    }

    fn vpzdz(&self, t: usize, v: ArrayViewMut2<'_, f64>, d: f64) {
        dispatch!(self, m => m.vpzdz(t, v, d))
    }

    fn xpzd(&self, t: usize, x: ArrayViewMut1<'_, f64>, d: f64) {
        dispatch!(self, m => m.xpzd(t, x, d))
    }

    fn has_error(&self, t: usize) -> bool {
        dispatch!(self, m => m.has_error(t))
    }

    fn error_variance(&self, t: usize) -> f64 {
        dispatch!(self, m => m.error_variance(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StateSpaceModel;
    use approx::assert_abs_diff_eq;
    use kalmar_arima::Polynomial;
    use ndarray::Array2;

    fn all_variants() -> Vec<Ssf> {
        let arma = ArimaModel::arma(
            Polynomial::from_lags(&[-0.5]),
            Polynomial::from_lags(&[0.3]),
            1.5,
        )
        .unwrap();
        let arima = ArimaModel::new(
            Polynomial::one(),
            Polynomial::from_lags(&[-1.0]),
            Polynomial::from_lags(&[-0.4]),
            1.0,
        )
        .unwrap();
        let matrix = MatrixSsf::new(
            ndarray::array![[0.9, 0.1], [0.0, 0.5]],
            ndarray::array![[1.0, 0.2], [0.2, 0.5]],
            ndarray::array![1.0, 1.0],
            0.1,
            Array2::eye(2),
        )
        .unwrap();
        vec![
            Ssf::arma(&arma).unwrap(),
            Ssf::arima(&arima).unwrap(),
            Ssf::noise(2.0).unwrap(),
            Ssf::local_level(0.5).unwrap(),
            Ssf::local_linear_trend(1.0, 0.2).unwrap(),
            Ssf::seasonal(4, 0.3).unwrap(),
            matrix.into(),
            Ssf::composite(vec![
                Ssf::local_level(1.0).unwrap(),
                Ssf::noise(1.0).unwrap(),
            ])
            .unwrap(),
            Ssf::noise(1.0)
                .unwrap()
                .with_regression(Array2::ones((5, 1)), Coefficients::Fixed)
                .unwrap(),
        ]
    }

    #[test]
    fn every_variant_is_consistent() {
        for ssf in all_variants() {
            ssf.check().unwrap();
        }
    }

    #[test]
    fn noise_factor_reproduces_covariance() {
        for ssf in all_variants() {
            let n = ssf.dim();
            let k = ssf.innovations_dim();
            let mut s = Array2::zeros((n, k));
            ssf.s(0, s.view_mut());
            let mut v = Array2::zeros((n, n));
            ssf.v(0, v.view_mut());
            let sst = s.dot(&s.t());
            for (a, b) in sst.iter().zip(v.iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn sparse_operations_match_dense_loading() {
        for ssf in all_variants() {
            let n = ssf.dim();
            let p = Array2::from_shape_fn((n, n), |(i, j)| {
                if i == j { 2.0 } else { 0.3 / (1.0 + (i + j) as f64) }
            });
            let mut z = ndarray::Array1::zeros(n);
            ssf.z(1, z.view_mut());
            assert_abs_diff_eq!(ssf.zvz(1, p.view()), z.dot(&p.dot(&z)), epsilon = 1e-12);

            let mut q = p.clone();
            ssf.vpzdz(1, q.view_mut(), -0.5);
            for i in 0..n {
                for j in 0..n {
                    assert_abs_diff_eq!(q[[i, j]], p[[i, j]] - 0.5 * z[i] * z[j], epsilon = 1e-12);
                }
            }
        }
    }
}
