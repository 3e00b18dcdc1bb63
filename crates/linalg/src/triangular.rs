//! Upper-triangular solves and inverses, by LAPACK `trtrs`.

use ndarray::{Array2, ArrayView2, ArrayViewMut1};
use ndarray_linalg::{Diag, SolveTriangular, UPLO};

use crate::error::{LinalgError, check_square};

fn check_diagonal(r: &ArrayView2<f64>) -> Result<(), LinalgError> {
    if r.diag().iter().any(|&d| d == 0.0 || !d.is_finite()) {
        return Err(LinalgError::Singular);
    }
    Ok(())
}

/// Solves `R·x = b` in place by back substitution. Only the upper triangle
/// of `r` is read.
///
/// # Errors
///
/// [`LinalgError::Singular`] on a zero diagonal element,
/// [`LinalgError::DimensionMismatch`] if `b` does not match `R`.
pub fn solve_upper(r: ArrayView2<f64>, mut b: ArrayViewMut1<f64>) -> Result<(), LinalgError> {
    let n = check_square(r.nrows(), r.ncols())?;
    if b.len() != n {
        return Err(LinalgError::DimensionMismatch {
            expected: n,
            got: b.len(),
        });
    }
    if n == 0 {
        return Ok(());
    }
    check_diagonal(&r)?;
    let x = r
        .to_owned()
        .solve_triangular(UPLO::Upper, Diag::NonUnit, &b.to_owned())
        .map_err(|_| LinalgError::Singular)?;
    b.assign(&x);
    Ok(())
}

/// Inverse of an upper-triangular matrix (itself upper triangular).
pub fn invert_upper(r: ArrayView2<f64>) -> Result<Array2<f64>, LinalgError> {
    let n = check_square(r.nrows(), r.ncols())?;
    if n == 0 {
        return Ok(Array2::zeros((0, 0)));
    }
    check_diagonal(&r)?;
    r.to_owned()
        .solve_triangular(UPLO::Upper, Diag::NonUnit, &Array2::<f64>::eye(n))
        .map_err(|_| LinalgError::Singular)
}
