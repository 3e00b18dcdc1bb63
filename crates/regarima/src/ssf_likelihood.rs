//! The RegArima likelihood through the diffuse Kalman filter.
//!
//! The ARIMA disturbance is put in state-space form with diffuse unit-root
//! lags, the regression effects become diffuse state elements, and missing
//! observations are skipped. The sum of squares equals the one of the
//! concentrated estimator; the degrees of freedom also discount the
//! regression effects.

use kalmar_ssf::{Coefficients, DiffuseConfig, DiffuseFilter, FilterResults, Ssf};
use ndarray::Array2;
use tracing::instrument;

use crate::error::RegArimaError;
use crate::model::RegArimaModel;

/// Diffuse-filter evaluation of a [`RegArimaModel`].
#[derive(Clone, Debug, Default)]
pub struct SsfLikelihood {
    filter: DiffuseFilter,
}

impl SsfLikelihood {
    /// Evaluator with the given diffuse settings.
    pub fn new(config: DiffuseConfig) -> Self {
        Self {
            filter: DiffuseFilter::new(config),
        }
    }

    /// State-space form of `model`: `RegSsf(ArimaSsf, [m | X])`.
    pub fn state_space(model: &RegArimaModel) -> Result<Ssf, RegArimaError> {
        let base = Ssf::arima(model.arima())?;
        let k = model.regression_count();
        if k == 0 {
            return Ok(base);
        }
        let n = model.len();
        let mut x = Array2::zeros((n, k));
        let mut j = 0;
        if model.has_mean() {
            x.column_mut(0).assign(&model.mean_regressor());
            j = 1;
        }
        x.columns_mut()
            .into_iter()
            .skip(j)
            .zip(model.regressors().columns())
            .for_each(|(mut dst, src)| dst.assign(&src));
        Ok(base.with_regression(x, Coefficients::Fixed)?)
    }

    /// Filters `model`.
    #[instrument(skip_all, fields(n = model.len()))]
    pub fn compute(&self, model: &RegArimaModel) -> Result<FilterResults, RegArimaError> {
        let ssf = Self::state_space(model)?;
        Ok(self.filter.filter(&ssf, model.y())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use kalmar_arima::{ArimaModel, Polynomial};
    use ndarray::array;

    #[test]
    fn random_walk_with_drift() {
        // Δy_t = μ + ε_t: the ssq is the one of the demeaned differences.
        let arima = ArimaModel::new(
            Polynomial::one(),
            Polynomial::from_lags(&[-1.0]),
            Polynomial::one(),
            1.0,
        )
        .unwrap();
        let y = array![1.0, 2.5, 3.0, 5.0, 5.5];
        let model = RegArimaModel::builder(y)
            .with_mean(true)
            .with_arima(arima)
            .build()
            .unwrap();
        let res = SsfLikelihood::default().compute(&model).unwrap();
        let dy = [1.5, 0.5, 2.0, 0.5];
        let mean = dy.iter().sum::<f64>() / 4.0;
        let ssq: f64 = dy.iter().map(|v| (v - mean).powi(2)).sum();
        let ll = res.likelihood();
        assert_eq!(ll.diffuse_dim(), 2);
        assert_eq!(ll.degrees_of_freedom(), 3);
        assert_abs_diff_eq!(ll.ssq(), ssq, epsilon = 1e-9);
    }
}
