//! Unit-root (differencing) polynomials and their application to series.

use ndarray::{Array1, ArrayView1};

use crate::polynomial::Polynomial;

/// `(1 - B)^d · (1 - B^period)^bd`.
///
/// `period` is ignored when `bd == 0`.
pub fn differencing_polynomial(period: usize, d: usize, bd: usize) -> Polynomial {
    let regular = Polynomial::from_lags(&[-1.0]);
    let mut out = Polynomial::one();
    for _ in 0..d {
        out = out.times(&regular);
    }
    if bd > 0 && period > 0 {
        let seasonal = Polynomial::seasonal(&[-1.0], period);
        for _ in 0..bd {
            out = out.times(&seasonal);
        }
    }
    out
}

/// Applies `delta(B)` to `x`: `out_t = Σ_k δ_k · x_{t+deg-k}`.
///
/// The first `deg(delta)` observations are consumed; a series shorter than
/// that yields an empty output.
pub fn difference(delta: &Polynomial, x: ArrayView1<f64>) -> Array1<f64> {
    let deg = delta.degree();
    let n = x.len();
    if n <= deg {
        return Array1::zeros(0);
    }
    let c = delta.coefficients();
    Array1::from_shape_fn(n - deg, |t| {
        c.iter()
            .enumerate()
            .filter(|(_, ck)| **ck != 0.0)
            .map(|(k, ck)| ck * x[t + deg - k])
            .sum()
    })
}
