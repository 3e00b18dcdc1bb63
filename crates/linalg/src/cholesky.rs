//! Cholesky factorizations, `A = L·Lᵀ` with `L` lower triangular.

use ndarray::ArrayViewMut2;
use ndarray_linalg::{Cholesky, UPLO};

use crate::error::{LinalgError, check_square};

/// In-place Cholesky factorization of a symmetric positive-definite matrix,
/// computed by LAPACK `potrf`.
///
/// Only the lower triangle of `a` is read. On success `a` holds `L` and its
/// strict upper triangle is zeroed. `a` may be a window into a larger
/// buffer; the factor is written back through the view.
///
/// # Errors
///
/// [`LinalgError::NotPositiveDefinite`] when a diagonal element is not
/// strictly positive, [`LinalgError::Lapack`] when the factorization
/// breaks down on a later pivot. `a` is unchanged in both cases.
pub fn cholesky(mut a: ArrayViewMut2<f64>) -> Result<(), LinalgError> {
    let n = check_square(a.nrows(), a.ncols())?;
    if n == 0 {
        return Ok(());
    }
    for j in 0..n {
        let d = a[[j, j]];
        if !(d > 0.0) || !d.is_finite() {
            return Err(LinalgError::NotPositiveDefinite { index: j, value: d });
        }
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(LinalgError::Lapack("non-finite matrix entry".into()));
    }
    let l = a.to_owned().cholesky(UPLO::Lower)?;
    a.assign(&l);
    Ok(())
}

/// In-place Cholesky factorization of a positive semi-definite matrix.
///
/// Pivots below `tol * max(diag(a))` are treated as zero: the whole column
/// of `L` is set to zero and the factorization continues, so that
/// `L·Lᵀ` reproduces `a` on its range. Returns the numerical rank.
///
/// # Errors
///
/// [`LinalgError::NotPositiveDefinite`] if a pivot is clearly negative
/// (below `-tol * max(diag(a))`), i.e. the matrix is indefinite.
pub fn cholesky_psd(mut a: ArrayViewMut2<f64>, tol: f64) -> Result<usize, LinalgError> {
    let n = check_square(a.nrows(), a.ncols())?;
    let scale = (0..n).map(|i| a[[i, i]].abs()).fold(0.0, f64::max);
    let eps = tol * scale.max(f64::MIN_POSITIVE);
    let mut rank = 0;
    for j in 0..n {
        let mut d = a[[j, j]];
        for k in 0..j {
            d -= a[[j, k]] * a[[j, k]];
        }
        if !d.is_finite() || d < -eps {
            return Err(LinalgError::NotPositiveDefinite { index: j, value: d });
        }
        if d <= eps {
            for i in j..n {
                a[[i, j]] = 0.0;
            }
        } else {
            let l = d.sqrt();
            a[[j, j]] = l;
            for i in j + 1..n {
                let mut s = a[[i, j]];
                for k in 0..j {
                    s -= a[[i, k]] * a[[j, k]];
                }
                a[[i, j]] = s / l;
            }
            rank += 1;
        }
        for i in 0..j {
            a[[i, j]] = 0.0;
        }
    }
    Ok(rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    fn reconstruct(l: &Array2<f64>) -> Array2<f64> {
        l.dot(&l.t())
    }

    #[test]
    fn cholesky_2x2() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let mut l = a.clone();
        cholesky(l.view_mut()).unwrap();
        assert_abs_diff_eq!(l[[0, 0]], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(l[[1, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(l[[1, 1]], 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(l[[0, 1]], 0.0);
        let back = reconstruct(&l);
        for (x, y) in back.iter().zip(a.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn cholesky_rejects_indefinite() {
        let a = array![[1.0, 2.0], [2.0, 1.0]];
        let mut l = a.clone();
        let err = cholesky(l.view_mut()).unwrap_err();
        assert!(matches!(err, LinalgError::Lapack(_)));
        assert_eq!(l, a);
    }

    #[test]
    fn cholesky_reports_non_positive_diagonal() {
        let mut a = array![[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -3.0]];
        assert_eq!(
            cholesky(a.view_mut()),
            Err(LinalgError::NotPositiveDefinite { index: 2, value: -3.0 })
        );
    }

    #[test]
    fn cholesky_of_empty_matrix() {
        let mut a = Array2::<f64>::zeros((0, 0));
        assert!(cholesky(a.view_mut()).is_ok());
    }

    #[test]
    fn cholesky_ignores_upper_triangle() {
        let mut a = array![[4.0, 99.0], [2.0, 3.0]];
        cholesky(a.view_mut()).unwrap();
        assert_abs_diff_eq!(a[[1, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a[[1, 1]], 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(a[[0, 1]], 0.0);
    }

    #[test]
    fn cholesky_rejects_non_square() {
        let mut a = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            cholesky(a.view_mut()),
            Err(LinalgError::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn cholesky_on_window_writes_through() {
        let mut big = Array2::<f64>::zeros((3, 3));
        big[[1, 1]] = 9.0;
        big[[2, 2]] = 16.0;
        cholesky(big.slice_mut(ndarray::s![1.., 1..])).unwrap();
        assert_abs_diff_eq!(big[[1, 1]], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(big[[2, 2]], 4.0, epsilon = 1e-12);
        assert_eq!(big[[0, 0]], 0.0);
    }

    #[test]
    fn psd_rank_deficient() {
        // rank-1 matrix v·vᵀ with v = [1, 2, 3]
        let v = array![1.0, 2.0, 3.0];
        let a = Array2::from_shape_fn((3, 3), |(i, j)| v[i] * v[j]);
        let mut l = a.clone();
        let rank = cholesky_psd(l.view_mut(), 1e-12).unwrap();
        assert_eq!(rank, 1);
        let back = reconstruct(&l);
        for (x, y) in back.iter().zip(a.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
    }

    #[test]
    fn psd_full_rank_matches_cholesky() {
        let a = array![[2.0, 0.5, 0.1], [0.5, 1.0, 0.2], [0.1, 0.2, 3.0]];
        let mut l1 = a.clone();
        let mut l2 = a.clone();
        cholesky(l1.view_mut()).unwrap();
        assert_eq!(cholesky_psd(l2.view_mut(), 1e-12).unwrap(), 3);
        for (x, y) in l1.iter().zip(l2.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-14);
        }
    }

    #[test]
    fn psd_zero_matrix() {
        let mut a = Array2::<f64>::zeros((2, 2));
        assert_eq!(cholesky_psd(a.view_mut(), 1e-12).unwrap(), 0);
    }

    #[test]
    fn psd_rejects_negative_pivot() {
        let mut a = array![[1.0, 0.0], [0.0, -1.0]];
        assert!(cholesky_psd(a.view_mut(), 1e-12).is_err());
    }
}
