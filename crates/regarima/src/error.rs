//! Error types for the kalmar-regarima crate.

use kalmar_arima::ArimaError;
use kalmar_linalg::LinalgError;
use kalmar_ssf::SsfError;

/// Error type for model construction, likelihood evaluation and estimation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegArimaError {
    /// Returned when the series is empty.
    #[error("series is empty")]
    EmptySeries,

    /// Returned when the regressors do not have one row per observation.
    #[error("regressors have {rows} rows, series has {n} observations")]
    RegressorRows {
        /// Rows of the regression matrix.
        rows: usize,
        /// Length of the series.
        n: usize,
    },

    /// Returned when a design matrix has fewer columns than its declared
    /// missing-value and mean columns.
    #[error("design has {columns} columns, {required} required")]
    ColumnCount {
        /// Columns supplied.
        columns: usize,
        /// Indicator and mean columns declared.
        required: usize,
    },

    /// Returned when missing positions are unsorted, repeated or out of
    /// range.
    #[error("invalid missing position {position} for a series of length {n}")]
    InvalidMissingPosition {
        /// The offending position.
        position: usize,
        /// Length of the series.
        n: usize,
    },

    /// Returned when a value that is not declared missing is not finite.
    #[error("non-finite value in {input} at index {index}")]
    NonFiniteInput {
        /// `"series"` or `"regressors"`.
        input: &'static str,
        /// Row of the value.
        index: usize,
    },

    /// Returned when differencing leaves fewer observations than the model
    /// needs.
    #[error("{n} observations leave none after differencing of degree {degree}")]
    InsufficientData {
        /// Length of the series.
        n: usize,
        /// Degree of the differencing polynomial.
        degree: usize,
    },

    /// Returned when every differenced observation is explained by a
    /// missing-value regressor.
    #[error("no degrees of freedom left")]
    NoDegreesOfFreedom,

    /// Returned when a configuration value is out of range.
    #[error("invalid {name}: {value}")]
    InvalidConfig {
        /// The setting.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when the Nelder-Mead driver fails to produce a point.
    #[error("optimization failed")]
    OptimizationFailed,

    /// A failure in the ARIMA layer.
    #[error(transparent)]
    Arima(#[from] ArimaError),

    /// A failure in the state-space layer.
    #[error(transparent)]
    Ssf(#[from] SsfError),

    /// A decomposition failure.
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

impl RegArimaError {
    /// Returns `true` for failures caused by the parameter point rather
    /// than by the inputs; an optimizer rejects such a point and goes on.
    pub fn is_numerical(&self) -> bool {
        match self {
            Self::Arima(e) => matches!(e, ArimaError::NonStationary | ArimaError::Linalg(_)),
            Self::Ssf(e) => e.is_numerical(),
            Self::Linalg(_) => true,
            _ => false,
        }
    }
}
