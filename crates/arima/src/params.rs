//! PACF parametrization of stationary (or invertible) lag polynomials
//! (Jones 1980, Monahan 1984).
//!
//! `r_k = tanh(alpha_k)` maps each unconstrained parameter into (-1, 1);
//! the Levinson-Durbin recursion then turns the partial autocorrelations
//! into coefficients `phi` of `1 - phi_1·B - … - phi_p·Bᵖ`, whose roots lie
//! outside the unit circle by construction.

use crate::error::ArimaError;
use crate::polynomial::Polynomial;

/// Maps unconstrained parameters to the coefficients `phi` of a stable
/// polynomial `1 - Σ phi_k·Bᵏ`.
pub fn unconstrained_to_coeffs(alpha: &[f64]) -> Vec<f64> {
    let p = alpha.len();
    if p == 0 {
        return Vec::new();
    }

    let r: Vec<f64> = alpha.iter().map(|a| a.tanh()).collect();

    let mut phi = vec![0.0; p];
    let mut prev = vec![0.0; p];
    phi[0] = r[0];
    for k in 1..p {
        prev[..k].copy_from_slice(&phi[..k]);
        phi[k] = r[k];
        for j in 0..k {
            phi[j] = prev[j] - r[k] * prev[k - 1 - j];
        }
    }
    phi
}

/// Inverse of [`unconstrained_to_coeffs`].
///
/// # Errors
///
/// [`ArimaError::NonStationary`] if some partial autocorrelation has modulus
/// of at least one.
pub fn coeffs_to_unconstrained(phi: &[f64]) -> Result<Vec<f64>, ArimaError> {
    let p = phi.len();
    let mut cur = phi.to_vec();
    let mut alpha = vec![0.0; p];
    for k in (0..p).rev() {
        let rk = cur[k];
        if !rk.is_finite() || rk.abs() >= 1.0 {
            return Err(ArimaError::NonStationary);
        }
        alpha[k] = rk.atanh();
        let denom = 1.0 - rk * rk;
        let prev: Vec<f64> = (0..k).map(|j| (cur[j] + rk * cur[k - 1 - j]) / denom).collect();
        cur.truncate(k);
        cur.copy_from_slice(&prev);
    }
    Ok(alpha)
}

/// Stable lag polynomial `1 - Σ phi_k·B^{k·period}` from unconstrained
/// parameters.
pub(crate) fn stable_polynomial(alpha: &[f64], period: usize) -> Polynomial {
    let lags: Vec<f64> = unconstrained_to_coeffs(alpha).iter().map(|c| -c).collect();
    if period == 1 {
        Polynomial::from_lags(&lags)
    } else {
        Polynomial::seasonal(&lags, period)
    }
}
