//! Error types for the kalmar-ssf crate.

use kalmar_arima::ArimaError;
use kalmar_linalg::LinalgError;

/// Error type for model construction and for the Kalman recursions.
///
/// Construction errors (dimensions, variances, capacities) are contract
/// violations raised before any recursion runs. The remaining variants are
/// numerical failures that an optimizer treats as a rejected parameter
/// point; see [`SsfError::is_numerical`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SsfError {
    /// Returned when two parts of a model disagree on a dimension.
    #[error("{what}: expected dimension {expected}, got {got}")]
    DimensionMismatch {
        /// The offending quantity.
        what: &'static str,
        /// Dimension required by the rest of the model.
        expected: usize,
        /// Dimension supplied.
        got: usize,
    },

    /// Returned when a variance parameter is negative or not finite.
    #[error("variance must be non-negative and finite, got {0}")]
    InvalidVariance(f64),

    /// Returned when a seasonal component has a period below 2.
    #[error("seasonal period must be at least 2, got {0}")]
    InvalidPeriod(usize),

    /// Returned when a composite model has no components.
    #[error("composite model needs at least one component")]
    EmptyComposite,

    /// Returned when a series is longer than a time-varying model supports.
    #[error("model covers {capacity} periods, series has {requested}")]
    ObservationCapacity {
        /// Number of periods the model is defined for.
        capacity: usize,
        /// Length of the series.
        requested: usize,
    },

    /// Returned when a diffuse model receives no usable observation.
    #[error("diffuse model of dimension {diffuse_dim} has no observations")]
    NoObservations {
        /// Number of diffuse directions.
        diffuse_dim: usize,
    },

    /// Returned when the diffuse directions use up every observation, so
    /// the scale cannot be estimated.
    #[error("{n} observations leave no degrees of freedom after {diffuse_dim} diffuse directions")]
    NoDegreesOfFreedom {
        /// Observations used.
        n: usize,
        /// Diffuse directions identified by the data.
        diffuse_dim: usize,
    },

    /// Returned when an operation that needs a proper initial state is
    /// given a diffuse model.
    #[error("{operation} requires a model without diffuse initialization")]
    DiffuseInitialization {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// Returned when an observation is infinite (missing values are NaN).
    #[error("observation at t = {t} is infinite")]
    NonFiniteObservation {
        /// Time index.
        t: usize,
    },

    /// Returned when a prediction-error variance is negative.
    #[error("negative prediction variance {f} at t = {t}")]
    NonPositiveVariance {
        /// Time index.
        t: usize,
        /// Offending variance.
        f: f64,
    },

    /// Returned when an observation has zero prediction variance but a
    /// non-zero prediction error.
    #[error("zero prediction variance with residual {e} at t = {t}")]
    DegenerateObservation {
        /// Time index.
        t: usize,
        /// Prediction error.
        e: f64,
    },

    /// An ARIMA model could not be represented.
    #[error(transparent)]
    Arima(#[from] ArimaError),

    /// A decomposition failed.
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

impl SsfError {
    /// Returns `true` for failures caused by the parameter point rather than
    /// by the way the model was put together.
    pub fn is_numerical(&self) -> bool {
        match self {
            Self::NonPositiveVariance { .. }
            | Self::DegenerateObservation { .. }
            | Self::Linalg(_) => true,
            Self::Arima(e) => matches!(e, ArimaError::NonStationary | ArimaError::Linalg(_)),
            _ => false,
        }
    }
}
