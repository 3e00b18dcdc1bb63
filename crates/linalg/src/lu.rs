//! LU solves with partial pivoting, factorized by LAPACK `getrf`.

use ndarray::{Array1, Array2};
use ndarray_linalg::{FactorizeInto, Solve};

use crate::error::{LinalgError, check_square};

/// Solves `A·x = b`, consuming copies of both operands.
///
/// # Errors
///
/// [`LinalgError::Singular`] if a pivot of `U` is (numerically) zero,
/// relative to the largest entry of `A`.
pub fn lu_solve(a: Array2<f64>, b: Array1<f64>) -> Result<Array1<f64>, LinalgError> {
    let n = check_square(a.nrows(), a.ncols())?;
    if b.len() != n {
        return Err(LinalgError::DimensionMismatch {
            expected: n,
            got: b.len(),
        });
    }
    if n == 0 {
        return Ok(b);
    }
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if !scale.is_finite() {
        return Err(LinalgError::Singular);
    }
    let eps = f64::EPSILON * scale * n as f64;
    let lu = a.factorize_into().map_err(|_| LinalgError::Singular)?;
    if lu.a.diag().iter().any(|u| !(u.abs() > eps)) {
        return Err(LinalgError::Singular);
    }
    Ok(lu.solve_into(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn solves_with_pivoting() {
        let a = array![[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [2.0, 0.0, 3.0]];
        let x = array![1.0, -1.0, 2.0];
        let b = a.dot(&x);
        let sol = lu_solve(a, b).unwrap();
        for (u, v) in sol.iter().zip(x.iter()) {
            assert_abs_diff_eq!(u, v, epsilon = 1e-12);
        }
    }

    #[test]
    fn singular_matrix() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert_eq!(lu_solve(a, b), Err(LinalgError::Singular));
    }

    #[test]
    fn nearly_singular_matrix() {
        let a = array![[1e3, 1e3], [1e3, 1e3 + 1e-13]];
        let b = array![1.0, 2.0];
        assert_eq!(lu_solve(a, b), Err(LinalgError::Singular));
    }

    #[test]
    fn rejects_wrong_rhs_length() {
        let a = array![[1.0, 0.0], [0.0, 1.0]];
        let b = array![1.0];
        assert_eq!(
            lu_solve(a, b),
            Err(LinalgError::DimensionMismatch { expected: 2, got: 1 })
        );
    }
}
