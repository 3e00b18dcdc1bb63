//! Error types for the kalmar-linalg crate.

/// Error type for the decompositions and solvers of this crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinalgError {
    /// A Cholesky pivot or diagonal element was non-positive (or non-finite).
    #[error("matrix is not positive definite (pivot {index} = {value})")]
    NotPositiveDefinite {
        /// Index of the failing pivot.
        index: usize,
        /// Value of the pivot (or diagonal element) before the square root.
        value: f64,
    },

    /// A triangular or LU solve met a zero pivot.
    #[error("matrix is singular")]
    Singular,

    /// The operand shapes do not agree.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Length actually supplied.
        got: usize,
    },

    /// A LAPACK routine rejected its operand.
    #[error("LAPACK routine failed: {0}")]
    Lapack(String),

    /// A square matrix was required.
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },
}

pub(crate) fn check_square(rows: usize, cols: usize) -> Result<usize, LinalgError> {
    if rows != cols {
        return Err(LinalgError::NotSquare { rows, cols });
    }
    Ok(rows)
}

impl From<ndarray_linalg::error::LinalgError> for LinalgError {
    fn from(err: ndarray_linalg::error::LinalgError) -> Self {
        LinalgError::Lapack(err.to_string())
    }
}
