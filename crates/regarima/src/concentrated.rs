//! Regression coefficients concentrated out of the likelihood by GLS.
//!
//! The differenced series and each differenced regressor are whitened by
//! the stationary ARMA filter, `ỹ = L⁻¹·y`, `X̃ = L⁻¹·X`, and the
//! regression is solved by a rank-revealing QR of `X̃`:
//!
//! ```text
//! b = argmin ‖ỹ - X̃·b‖²,   ssq = ‖ỹ - X̃·b‖²,   cov(b) = σ²·(RᵀR)⁻¹
//! ```

use std::f64::consts::PI;

use kalmar_arima::{ArimaModel, ArmaFilter, KalmanArmaFilter};
use kalmar_linalg::{Qr, invert_upper};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use tracing::{debug, instrument};

use crate::config::ConcentratedLikelihoodConfig;
use crate::error::RegArimaError;
use crate::linear_model::LinearModel;
use crate::model::RegArimaModel;

/// Likelihood with the regression coefficients and the scale concentrated
/// out.
///
/// Missing-value indicators are separated from the regression: their
/// coefficients are the [`missing_estimates`](Self::missing_estimates) and
/// they add [`missing_correction`](Self::missing_correction) to the
/// log-determinant, so that the likelihood is the one of the observed data.
#[derive(Clone, Debug, PartialEq)]
pub struct ConcentratedLikelihood {
    n: usize,
    coefficients: Array1<f64>,
    unscaled_covariance: Array2<f64>,
    r: Array2<f64>,
    used: Vec<usize>,
    ssq: f64,
    ldet: f64,
    missing_correction: f64,
    residuals: Array1<f64>,
    missing_estimates: Array1<f64>,
    missing_variances: Array1<f64>,
}

impl ConcentratedLikelihood {
    /// Number of observations, missing values excluded.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Regression coefficients, mean first (zero for redundant columns).
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// `(X̃ᵀX̃)⁻¹` restricted to the regression columns.
    pub fn unscaled_covariance(&self) -> &Array2<f64> {
        &self.unscaled_covariance
    }

    /// Coefficient covariance `σ̂²·(X̃ᵀX̃)⁻¹`.
    pub fn covariance(&self) -> Array2<f64> {
        &self.unscaled_covariance * self.sigma2()
    }

    /// Standard errors of the coefficients.
    pub fn standard_errors(&self) -> Array1<f64> {
        let sigma2 = self.sigma2();
        self.unscaled_covariance
            .diag()
            .mapv(|v| (v * sigma2).sqrt())
    }

    /// Upper-triangular factor of the whitened design over its used
    /// columns; see [`used_columns`](Self::used_columns).
    pub fn r_factor(&self) -> ArrayView2<'_, f64> {
        self.r.view()
    }

    /// Design columns (missing indicators first) that entered the QR.
    pub fn used_columns(&self) -> &[usize] {
        &self.used
    }

    /// Residual sum of squares of the whitened regression.
    pub fn ssq(&self) -> f64 {
        self.ssq
    }

    /// `ln|Σ|` of the differenced disturbance.
    pub fn log_determinant(&self) -> f64 {
        self.ldet
    }

    /// `2·Σ ln|R_ii|` over the missing-value columns.
    pub fn missing_correction(&self) -> f64 {
        self.missing_correction
    }

    /// Whitened residuals `ỹ - X̃·b`.
    pub fn residuals(&self) -> &Array1<f64> {
        &self.residuals
    }

    /// Estimates of the missing observations, in position order.
    pub fn missing_estimates(&self) -> &Array1<f64> {
        &self.missing_estimates
    }

    /// Unscaled variances of the missing-value estimates.
    pub fn missing_unscaled_variances(&self) -> &Array1<f64> {
        &self.missing_variances
    }

    /// `σ̂² = ssq / n`.
    pub fn sigma2(&self) -> f64 {
        self.ssq / self.n as f64
    }

    /// Concentrated log-likelihood
    /// `-½·(n·ln 2π + n·(1 + ln σ̂²) + ldet + missing_correction)`.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.n as f64;
        -0.5 * (n * (2.0 * PI).ln()
            + n * (1.0 + (self.ssq / n).ln())
            + self.ldet
            + self.missing_correction)
    }

    /// Objective minimized by the estimation driver, `ssq · |Σ|^{1/n}`; it
    /// is a monotone transform of the negative log-likelihood.
    pub fn objective(&self) -> f64 {
        self.ssq * self.determinant_factor().powi(2)
    }

    /// Residuals scaled by `|Σ|^{1/2n}`, whose squared norm is the
    /// [`objective`](Self::objective).
    pub fn objective_residuals(&self) -> Array1<f64> {
        &self.residuals * self.determinant_factor()
    }

    fn determinant_factor(&self) -> f64 {
        ((self.ldet + self.missing_correction) / (2.0 * self.n as f64)).exp()
    }
}

/// Concentrated likelihood of a [`LinearModel`] with ARMA disturbances.
///
/// The ARMA filter is prepared for every evaluation, so one estimator
/// serves a whole optimization; parallel evaluations each need their own.
#[derive(Clone, Debug, Default)]
pub struct ConcentratedLikelihoodEstimator<F = KalmanArmaFilter> {
    config: ConcentratedLikelihoodConfig,
    filter: F,
}

impl ConcentratedLikelihoodEstimator<KalmanArmaFilter> {
    /// Estimator using the fast ARMA filter.
    pub fn new(config: ConcentratedLikelihoodConfig) -> Self {
        Self::with_filter(config, KalmanArmaFilter::new())
    }
}

impl<F: ArmaFilter> ConcentratedLikelihoodEstimator<F> {
    /// Estimator using `filter`.
    pub fn with_filter(config: ConcentratedLikelihoodConfig, filter: F) -> Self {
        Self { config, filter }
    }

    /// The settings.
    pub fn config(&self) -> &ConcentratedLikelihoodConfig {
        &self.config
    }

    /// Differences `model` by its unit roots and estimates it.
    pub fn compute(&mut self, model: &RegArimaModel) -> Result<ConcentratedLikelihood, RegArimaError> {
        let linear = model.differenced_model()?;
        self.estimate(&linear, model.arima())
    }

    /// Estimates `model` with the stationary part of `arima` as the
    /// disturbance; its unit roots are ignored, `model` being differenced
    /// already.
    ///
    /// # Errors
    ///
    /// [`RegArimaError::NoDegreesOfFreedom`] if every observation is
    /// missing, and the numerical failures of the filter and of the
    /// decomposition.
    #[instrument(skip_all, fields(n = model.len(), columns = model.x().ncols()))]
    pub fn estimate(
        &mut self,
        model: &LinearModel,
        arima: &ArimaModel,
    ) -> Result<ConcentratedLikelihood, RegArimaError> {
        let nd = model.len();
        let nm = model.missing_count();
        if nd <= nm {
            return Err(RegArimaError::NoDegreesOfFreedom);
        }
        let n = nd - nm;
        let ncols = model.x().ncols();
        self.filter.prepare(&arima.stationary(), nd)?;
        let ldet = self.filter.log_determinant();

        let (yf, ys) = self.whiten(model.y())?;
        let mut xf = Array2::zeros((nd, ncols));
        let mut xs = vec![1.0; ncols];
        for (j, col) in model.x().columns().into_iter().enumerate() {
            let (c, scale) = self.whiten(col)?;
            xf.column_mut(j).assign(&c);
            xs[j] = scale;
        }

        let qr = Qr::decompose(xf.view(), self.config.rank_tolerance());
        if qr.rank() < ncols {
            debug!(rank = qr.rank(), columns = ncols, "rank-deficient regression");
        }
        if qr.rank() == 0 {
            let residuals = yf / ys;
            return Ok(ConcentratedLikelihood {
                n,
                coefficients: Array1::zeros(ncols - nm),
                unscaled_covariance: Array2::zeros((ncols - nm, ncols - nm)),
                r: Array2::zeros((0, 0)),
                used: Vec::new(),
                ssq: residuals.dot(&residuals),
                ldet,
                missing_correction: 0.0,
                residuals,
                missing_estimates: Array1::zeros(nm),
                missing_variances: Array1::zeros(nm),
            });
        }

        let ls = qr.least_squares(yf.view())?;
        let scaled = ls.coefficients();
        let residuals = (&yf - &xf.dot(scaled)) / ys;
        let b = Array1::from_shape_fn(ncols, |j| scaled[j] * xs[j] / ys);

        let used = qr.used().to_vec();
        let mut r = qr.r().to_owned();
        for (l, &j) in used.iter().enumerate() {
            r.column_mut(l).mapv_inplace(|v| v / xs[j]);
        }
        let rinv = invert_upper(r.view())?;
        let cov_used = rinv.dot(&rinv.t());
        let mut cov = Array2::zeros((ncols, ncols));
        for (l, &j) in used.iter().enumerate() {
            for (k, &i) in used.iter().enumerate() {
                cov[[j, i]] = cov_used[[l, k]];
            }
        }
        let missing_correction = used
            .iter()
            .enumerate()
            .filter(|&(_, &j)| j < nm)
            .map(|(l, _)| 2.0 * r[[l, l]].abs().ln())
            .sum();

        Ok(ConcentratedLikelihood {
            n,
            coefficients: b.slice(s![nm..]).to_owned(),
            unscaled_covariance: cov.slice(s![nm.., nm..]).to_owned(),
            r,
            used,
            ssq: residuals.dot(&residuals),
            ldet,
            missing_correction,
            residuals,
            missing_estimates: b.slice(s![..nm]).to_owned(),
            missing_variances: cov.diag().slice(s![..nm]).to_owned(),
        })
    }

    /// Scales `v` (if enabled) and whitens it; returns the filtered vector
    /// and the scale applied.
    fn whiten(&self, v: ArrayView1<'_, f64>) -> Result<(Array1<f64>, f64), RegArimaError> {
        let scale = if self.config.scaling() {
            scale_factor(v)
        } else {
            1.0
        };
        let input = &v * scale;
        let mut out = Array1::zeros(v.len());
        self.filter.apply(input.view(), out.view_mut())?;
        Ok((out, scale))
    }
}

/// `n / ‖v‖₂`, or 1 for a zero vector.
fn scale_factor(v: ArrayView1<'_, f64>) -> f64 {
    let norm = v.dot(&v).sqrt();
    if norm > 0.0 && norm.is_finite() {
        v.len() as f64 / norm
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use kalmar_arima::Polynomial;
    use ndarray::array;

    fn estimator() -> ConcentratedLikelihoodEstimator {
        ConcentratedLikelihoodEstimator::new(ConcentratedLikelihoodConfig::default())
    }

    fn white_noise() -> ArimaModel {
        ArimaModel::arma(Polynomial::one(), Polynomial::one(), 1.0).unwrap()
    }

    #[test]
    fn ordinary_least_squares_under_white_noise() {
        let y = array![1.0, 2.0, 2.5, 4.5, 5.0];
        let x = array![[1.0], [1.0], [1.0], [1.0], [1.0]];
        let lm = LinearModel::new(y.clone(), x, 0, true).unwrap();
        let cl = estimator().estimate(&lm, &white_noise()).unwrap();
        let mean = y.sum() / 5.0;
        assert_abs_diff_eq!(cl.coefficients()[0], mean, epsilon = 1e-12);
        let ssq: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
        assert_abs_diff_eq!(cl.ssq(), ssq, epsilon = 1e-12);
        assert_abs_diff_eq!(cl.unscaled_covariance()[[0, 0]], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(cl.log_determinant(), 0.0, epsilon = 1e-12);
        assert_eq!(cl.used_columns(), &[0]);
    }

    #[test]
    fn objective_residuals_square_to_the_objective() {
        let ar = ArimaModel::arma(Polynomial::from_lags(&[-0.6]), Polynomial::one(), 1.0).unwrap();
        let lm = LinearModel::new(
            array![0.5, 1.2, -0.3, 0.8, 1.9, 0.1],
            Array2::ones((6, 1)),
            0,
            true,
        )
        .unwrap();
        let cl = estimator().estimate(&lm, &ar).unwrap();
        let r = cl.objective_residuals();
        assert_abs_diff_eq!(r.dot(&r), cl.objective(), epsilon = 1e-12);
        let n = 6.0;
        let expected = -0.5 * n * ((2.0 * PI).ln() + 1.0) - 0.5 * n * cl.objective().ln()
            + 0.5 * n * n.ln();
        assert_abs_diff_eq!(cl.log_likelihood(), expected, epsilon = 1e-10);
    }

    #[test]
    fn non_stationary_disturbance_fails() {
        let ar = ArimaModel::arma(Polynomial::from_lags(&[-1.5]), Polynomial::one(), 1.0).unwrap();
        let lm = LinearModel::new(array![1.0, 2.0, 3.0], Array2::zeros((3, 0)), 0, false).unwrap();
        let err = estimator().estimate(&lm, &ar).unwrap_err();
        assert!(err.is_numerical());
    }

    #[test]
    fn all_missing_has_no_degrees_of_freedom() {
        let lm = LinearModel::new(array![0.0], array![[-1.0]], 1, false).unwrap();
        assert_eq!(
            estimator().estimate(&lm, &white_noise()).unwrap_err(),
            RegArimaError::NoDegreesOfFreedom
        );
    }
}
