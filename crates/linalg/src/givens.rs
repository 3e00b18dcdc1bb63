//! Givens row updates of an upper-triangular factor.

use ndarray::{ArrayViewMut1, ArrayViewMut2};

/// Folds `row` into the upper-triangular matrix `r` with Givens rotations.
///
/// After the call `r` is the triangular factor of the stacked matrix
/// `[r; rowᵀ]` and `row` is zero. Diagonal elements of `r` stay
/// non-negative. A zero entry `row[k]` skips rotation `k`, so a column that
/// never receives data keeps a zero diagonal.
pub fn triangularize_row(mut r: ArrayViewMut2<f64>, mut row: ArrayViewMut1<f64>) {
    let m = row.len();
    debug_assert_eq!(r.nrows(), m);
    debug_assert_eq!(r.ncols(), m);
    for k in 0..m {
        let x = row[k];
        if x == 0.0 {
            continue;
        }
        let d = r[[k, k]];
        let h = d.hypot(x);
        let c = d / h;
        let s = x / h;
        r[[k, k]] = h;
        row[k] = 0.0;
        for j in k + 1..m {
            let rkj = r[[k, j]];
            let xj = row[j];
            r[[k, j]] = c * rkj + s * xj;
            row[j] = c * xj - s * rkj;
        }
    }
}
