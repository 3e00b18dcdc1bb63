//! Symmetric-matrix utilities.

use ndarray::{ArrayView1, ArrayViewMut2};

/// Replaces `p` by `(p + pᵀ) / 2`.
pub fn symmetrize(mut p: ArrayViewMut2<f64>) {
    let n = p.nrows();
    for i in 0..n {
        for j in 0..i {
            let v = 0.5 * (p[[i, j]] + p[[j, i]]);
            p[[i, j]] = v;
            p[[j, i]] = v;
        }
    }
}

/// Rank-one update `p += alpha · x·xᵀ`.
pub fn add_outer(mut p: ArrayViewMut2<f64>, x: ArrayView1<f64>, alpha: f64) {
    if alpha == 0.0 {
        return;
    }
    let n = x.len();
    for i in 0..n {
        let ai = alpha * x[i];
        if ai == 0.0 {
            continue;
        }
        for j in 0..n {
            p[[i, j]] += ai * x[j];
        }
    }
}
