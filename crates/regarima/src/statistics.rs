//! Information criteria of a fitted likelihood.

use crate::concentrated::ConcentratedLikelihood;

/// Log-likelihood and information criteria for `n` observations and `k`
/// estimated parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LikelihoodStatistics {
    observations: usize,
    parameters: usize,
    log_likelihood: f64,
    ssq: f64,
}

impl LikelihoodStatistics {
    /// Statistics of a log-likelihood `log_likelihood` with residual sum of
    /// squares `ssq`.
    pub fn new(observations: usize, parameters: usize, log_likelihood: f64, ssq: f64) -> Self {
        Self {
            observations,
            parameters,
            log_likelihood,
            ssq,
        }
    }

    /// Statistics of a concentrated likelihood; `parameters` counts the
    /// ARMA parameters, the regression coefficients and the scale.
    pub fn from_concentrated(likelihood: &ConcentratedLikelihood, parameters: usize) -> Self {
        Self::new(
            likelihood.n(),
            parameters,
            likelihood.log_likelihood(),
            likelihood.ssq(),
        )
    }

    /// Number of observations.
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Number of estimated parameters.
    pub fn parameters(&self) -> usize {
        self.parameters
    }

    /// Log-likelihood.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Maximum-likelihood innovation variance `ssq / n`.
    pub fn sigma2(&self) -> f64 {
        self.ssq / self.observations as f64
    }

    /// `-2·ln L + 2k`.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood + 2.0 * self.parameters as f64
    }

    /// AIC with the small-sample correction `2k(k+1)/(n-k-1)`; infinite
    /// when `n ≤ k + 1`.
    pub fn aicc(&self) -> f64 {
        let n = self.observations as f64;
        let k = self.parameters as f64;
        if n <= k + 1.0 {
            return f64::INFINITY;
        }
        self.aic() + 2.0 * k * (k + 1.0) / (n - k - 1.0)
    }

    /// `-2·ln L + k·ln n`.
    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood + self.parameters as f64 * (self.observations as f64).ln()
    }
}
