//! Error types for the kalmar-arima crate.

use kalmar_linalg::LinalgError;

/// Error type for all fallible operations in the kalmar-arima crate.
///
/// Covers invalid model definitions, non-stationary parameter points and
/// misuse of the stationary ARMA filter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArimaError {
    /// Returned when a lag polynomial does not start with 1.
    #[error("lag polynomial must have a unit constant term, got {0}")]
    InvalidLeadingCoefficient(f64),

    /// Returned when the innovation variance is not positive and finite.
    #[error("innovation variance must be positive and finite, got {0}")]
    InvalidVariance(f64),

    /// Returned when the autoregressive polynomial has a root on or inside
    /// the unit circle.
    #[error("autoregressive polynomial is not stationary")]
    NonStationary,

    /// Returned when a stationary operation receives a model with unit roots.
    #[error("model has a differencing polynomial of degree {degree}")]
    UnitRoots {
        /// Degree of the differencing polynomial.
        degree: usize,
    },

    /// Returned when a parameter vector has the wrong length.
    #[error("expected {expected} parameters, got {got}")]
    ParameterCount {
        /// Number of parameters the mapping expects.
        expected: usize,
        /// Number supplied.
        got: usize,
    },

    /// Returned when a parameter is NaN or infinite.
    #[error("parameter {0} is not finite")]
    NonFiniteParameter(usize),

    /// Returned when a seasonal period is smaller than 2.
    #[error("invalid seasonal period {0}")]
    InvalidPeriod(usize),

    /// Returned when the filter is applied to a series of the wrong length.
    #[error("filter prepared for {expected} observations, got {got}")]
    LengthMismatch {
        /// Length given to `prepare`.
        expected: usize,
        /// Length of the input.
        got: usize,
    },

    /// Returned when [`ArmaFilter::apply`](crate::ArmaFilter::apply) runs
    /// before [`ArmaFilter::prepare`](crate::ArmaFilter::prepare).
    #[error("filter used before prepare()")]
    NotPrepared,

    /// A decomposition failed while solving for autocovariances.
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}
