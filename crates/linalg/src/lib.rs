//! # kalmar-linalg
//!
//! Dense linear algebra used by the state-space filters and the
//! concentrated-likelihood estimator.
//!
//! All routines operate on `ndarray` storage. Functions taking an
//! `ArrayViewMut*` write through the view, so a window into a larger
//! buffer (a diagonal block of a covariance, one column of a design
//! matrix) is updated in place and the owner sees the result immediately.
//!
//! The positive-definite Cholesky, LU and triangular solves call LAPACK
//! through `ndarray-linalg`. The semi-definite Cholesky, QR and Givens
//! routines are native since they track rank and unused columns.
//!
//! | Routine | Module | Used by |
//! |---------|--------|---------|
//! | [`cholesky`], [`cholesky_psd`] | `cholesky` | proper/degenerate noise factors |
//! | [`Qr`], [`LeastSquares`] | `qr` | concentrated likelihood, diffuse rank checks |
//! | [`triangularize_row`] | `givens` | augmented (diffuse) Kalman filter |
//! | [`solve_upper`], [`invert_upper`] | `triangular` | coefficient covariances, collapse |
//! | [`lu_solve`] | `lu` | autocovariance systems |

mod cholesky;
mod error;
mod givens;
mod lu;
mod qr;
mod symmetric;
mod triangular;

pub use cholesky::{cholesky, cholesky_psd};
pub use error::LinalgError;
pub use givens::triangularize_row;
pub use lu::lu_solve;
pub use qr::{DEFAULT_RANK_TOLERANCE, LeastSquares, Qr};
pub use symmetric::{add_outer, symmetrize};
pub use triangular::{invert_upper, solve_upper};
