//! Rank-revealing Householder QR.
//!
//! Columns are processed left to right. A column whose norm, after the
//! reflections of the previous columns, drops below `tol` times its
//! original norm is declared *unused*: it produces no reflector and no row
//! of `R`. The decomposition is therefore the QR of the used columns only,
//! which is what a least-squares fit with the redundant columns pinned at
//! zero requires.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, s};

use crate::error::LinalgError;

/// Relative tolerance below which a column is considered linearly dependent.
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-12;

#[derive(Clone, Debug)]
struct Reflector {
    row: usize,
    v: Array1<f64>,
    beta: f64,
}

impl Reflector {
    fn apply(&self, mut x: ArrayViewMut1<f64>) {
        if self.beta == 0.0 {
            return;
        }
        let mut tail = x.slice_mut(s![self.row..]);
        let w = self.beta * self.v.dot(&tail);
        tail.scaled_add(-w, &self.v);
    }
}

/// Householder QR decomposition `A·P = Q·R` restricted to the used columns.
#[derive(Clone, Debug)]
pub struct Qr {
    nrows: usize,
    ncols: usize,
    reflectors: Vec<Reflector>,
    used: Vec<usize>,
    unused: Vec<usize>,
    r: Array2<f64>,
}

/// Solution of `min ‖y - A·b‖²` computed from a [`Qr`].
#[derive(Clone, Debug)]
pub struct LeastSquares {
    coefficients: Array1<f64>,
    residuals: Array1<f64>,
    ssq: f64,
}

impl Qr {
    /// Decomposes `a` (rows × columns) with the relative rank tolerance `tol`.
    pub fn decompose(a: ArrayView2<f64>, tol: f64) -> Self {
        let (n, m) = a.dim();
        let mut work = a.to_owned();
        let mut reflectors = Vec::with_capacity(m.min(n));
        let mut used = Vec::with_capacity(m);
        let mut unused = Vec::new();

        for j in 0..m {
            let k = reflectors.len();
            let original = a.column(j).dot(&a.column(j)).sqrt();
            if k >= n {
                unused.push(j);
                continue;
            }
            let x = work.slice(s![k.., j]);
            let norm = x.dot(&x).sqrt();
            if !(norm > tol * original) || norm == 0.0 {
                unused.push(j);
                continue;
            }
            let alpha = if x[0] > 0.0 { -norm } else { norm };
            let mut v = x.to_owned();
            v[0] -= alpha;
            let vv = v.dot(&v);
            let beta = if vv > 0.0 { 2.0 / vv } else { 0.0 };
            let reflector = Reflector { row: k, v, beta };
            for c in j + 1..m {
                reflector.apply(work.column_mut(c));
            }
            work[[k, j]] = alpha;
            for i in k + 1..n {
                work[[i, j]] = 0.0;
            }
            reflectors.push(reflector);
            used.push(j);
        }

        let rank = used.len();
        let mut r = Array2::zeros((rank, rank));
        for (l, &j) in used.iter().enumerate() {
            for i in 0..=l {
                r[[i, l]] = work[[i, j]];
            }
        }

        Self {
            nrows: n,
            ncols: m,
            reflectors,
            used,
            unused,
            r,
        }
    }

    /// Number of rows of the decomposed matrix.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns of the decomposed matrix.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Numerical rank (number of used columns).
    pub fn rank(&self) -> usize {
        self.used.len()
    }

    /// Indices of the columns that entered the decomposition, in order.
    pub fn used(&self) -> &[usize] {
        &self.used
    }

    /// Indices of the columns declared linearly dependent.
    pub fn unused(&self) -> &[usize] {
        &self.unused
    }

    /// Upper-triangular factor (rank × rank) over the used columns.
    pub fn r(&self) -> ArrayView2<'_, f64> {
        self.r.view()
    }

    /// Diagonal of `R`.
    pub fn rdiagonal(&self) -> Array1<f64> {
        self.r.diag().to_owned()
    }

    /// Applies `Qᵀ` to `y` in place.
    ///
    /// # Errors
    ///
    /// [`LinalgError::DimensionMismatch`] if `y.len() != nrows`.
    pub fn apply_qt(&self, mut y: ArrayViewMut1<f64>) -> Result<(), LinalgError> {
        if y.len() != self.nrows {
            return Err(LinalgError::DimensionMismatch {
                expected: self.nrows,
                got: y.len(),
            });
        }
        for reflector in &self.reflectors {
            reflector.apply(y.view_mut());
        }
        Ok(())
    }

    /// Orthonormal basis of the span of the used columns (nrows × rank).
    pub fn thin_q(&self) -> Array2<f64> {
        let rank = self.rank();
        let mut q = Array2::zeros((self.nrows, rank));
        for l in 0..rank {
            let mut col = q.column_mut(l);
            col[l] = 1.0;
            for reflector in self.reflectors.iter().rev() {
                reflector.apply(col.view_mut());
            }
        }
        q
    }

    /// Least-squares solution of `A·b ≈ y`.
    ///
    /// Coefficients of unused columns are zero. The residual vector is the
    /// trailing `nrows - rank` part of `Qᵀ·y`; its squared norm is the
    /// residual sum of squares.
    pub fn least_squares(&self, y: ArrayView1<f64>) -> Result<LeastSquares, LinalgError> {
        let mut qty = y.to_owned();
        self.apply_qt(qty.view_mut())?;
        let rank = self.rank();
        let mut b = qty.slice(s![..rank]).to_owned();
        crate::triangular::solve_upper(self.r.view(), b.view_mut())?;
        let mut coefficients = Array1::zeros(self.ncols);
        for (l, &j) in self.used.iter().enumerate() {
            coefficients[j] = b[l];
        }
        let residuals = qty.slice(s![rank..]).to_owned();
        let ssq = residuals.dot(&residuals);
        Ok(LeastSquares {
            coefficients,
            residuals,
            ssq,
        })
    }
}

impl LeastSquares {
    /// Coefficients, one per column of `A` (zero for unused columns).
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// Residuals in the rotated space (length `nrows - rank`).
    pub fn residuals(&self) -> &Array1<f64> {
        &self.residuals
    }

    /// Residual sum of squares.
    pub fn ssq(&self) -> f64 {
        self.ssq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn full_rank_reconstruction_of_rtr() {
        let a = array![[1.0, 2.0], [3.0, 4.0], [5.0, 7.0], [1.0, -1.0]];
        let qr = Qr::decompose(a.view(), DEFAULT_RANK_TOLERANCE);
        assert_eq!(qr.rank(), 2);
        assert!(qr.unused().is_empty());
        // RᵀR = AᵀA
        let rtr = qr.r().t().dot(&qr.r());
        let ata = a.t().dot(&a);
        for (x, y) in rtr.iter().zip(ata.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
    }

    #[test]
    fn least_squares_exact_fit() {
        let a = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let qr = Qr::decompose(a.view(), DEFAULT_RANK_TOLERANCE);
        let ls = qr.least_squares(y.view()).unwrap();
        assert_abs_diff_eq!(ls.coefficients()[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ls.coefficients()[1], 2.0, epsilon = 1e-12);
        assert_eq!(ls.residuals().len(), 2);
        assert_abs_diff_eq!(ls.ssq(), 0.0, epsilon = 1e-20);
    }

    #[test]
    fn least_squares_residual_ssq_matches_direct() {
        let a = array![[1.0, 0.5], [1.0, -1.0], [1.0, 2.0], [1.0, 0.0], [1.0, 1.5]];
        let y = array![0.3, -0.7, 2.4, 0.1, 1.0];
        let qr = Qr::decompose(a.view(), DEFAULT_RANK_TOLERANCE);
        let ls = qr.least_squares(y.view()).unwrap();
        let fitted = a.dot(ls.coefficients());
        let direct: f64 = (&y - &fitted).mapv(|e| e * e).sum();
        assert_abs_diff_eq!(ls.ssq(), direct, epsilon = 1e-12);
    }

    #[test]
    fn dependent_column_is_unused() {
        let a = array![[1.0, 2.0, 0.0], [2.0, 4.0, 1.0], [3.0, 6.0, 0.0], [4.0, 8.0, 1.0]];
        let qr = Qr::decompose(a.view(), DEFAULT_RANK_TOLERANCE);
        assert_eq!(qr.rank(), 2);
        assert_eq!(qr.used(), &[0, 2]);
        assert_eq!(qr.unused(), &[1]);
        let y = array![1.0, 2.0, 3.0, 4.5];
        let ls = qr.least_squares(y.view()).unwrap();
        assert_eq!(ls.coefficients()[1], 0.0);
    }

    #[test]
    fn zero_column_is_unused() {
        let a = array![[0.0, 1.0], [0.0, 2.0], [0.0, 3.0]];
        let qr = Qr::decompose(a.view(), DEFAULT_RANK_TOLERANCE);
        assert_eq!(qr.rank(), 1);
        assert_eq!(qr.unused(), &[0]);
    }

    #[test]
    fn all_zero_matrix_has_rank_zero() {
        let a = Array2::<f64>::zeros((4, 2));
        let qr = Qr::decompose(a.view(), DEFAULT_RANK_TOLERANCE);
        assert_eq!(qr.rank(), 0);
        let y = array![1.0, 2.0, 3.0, 4.0];
        let ls = qr.least_squares(y.view()).unwrap();
        assert_abs_diff_eq!(ls.ssq(), 30.0, epsilon = 1e-12);
    }

    #[test]
    fn more_columns_than_rows() {
        let a = array![[1.0, 0.0, 1.0], [0.0, 1.0, 1.0]];
        let qr = Qr::decompose(a.view(), DEFAULT_RANK_TOLERANCE);
        assert_eq!(qr.rank(), 2);
        assert_eq!(qr.unused(), &[2]);
    }

    #[test]
    fn apply_qt_preserves_norm() {
        let a = array![[1.0, 2.0], [3.0, 4.0], [5.0, 7.0]];
        let qr = Qr::decompose(a.view(), DEFAULT_RANK_TOLERANCE);
        let mut y = array![1.0, -2.0, 0.5];
        let before = y.dot(&y);
        qr.apply_qt(y.view_mut()).unwrap();
        assert_abs_diff_eq!(y.dot(&y), before, epsilon = 1e-12);
    }

    #[test]
    fn thin_q_is_orthonormal_and_spans_used_columns() {
        let a = array![[1.0, 2.0, 2.0], [0.0, 1.0, 0.0], [1.0, 0.0, 2.0], [2.0, 1.0, 4.0]];
        let qr = Qr::decompose(a.view(), DEFAULT_RANK_TOLERANCE);
        assert_eq!(qr.unused(), &[2]);
        let q = qr.thin_q();
        assert_eq!(q.dim(), (4, 2));
        let qtq = q.t().dot(&q);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(qtq[[i, j]], expected, epsilon = 1e-12);
            }
        }
        // Q·R reproduces the used columns.
        let qr_prod = q.dot(&qr.r());
        for (l, &j) in qr.used().iter().enumerate() {
            for i in 0..4 {
                assert_abs_diff_eq!(qr_prod[[i, l]], a[[i, j]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn apply_qt_rejects_wrong_length() {
        let a = array![[1.0], [2.0]];
        let qr = Qr::decompose(a.view(), DEFAULT_RANK_TOLERANCE);
        let mut y = array![1.0, 2.0, 3.0];
        assert!(matches!(
            qr.apply_qt(y.view_mut()),
            Err(LinalgError::DimensionMismatch { expected: 2, got: 3 })
        ));
    }
}
