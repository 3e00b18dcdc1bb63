//! Autocovariance function of a stationary ARMA process.

use kalmar_linalg::lu_solve;
use ndarray::{Array1, Array2};

use crate::error::ArimaError;
use crate::polynomial::Polynomial;

/// Autocovariances `γ(0), …, γ(nlags)` of `Φ(B)·y_t = Θ(B)·ε_t`,
/// `Var(ε_t) = var`.
///
/// Multiplying the model by `y_{t-k}` and taking expectations gives
/// `Σᵢ aᵢ·γ(k-i) = var · Σ_{j≥k} θ_j·ψ_{j-k}`. The first `p + 1` equations
/// are solved jointly; later lags follow from the AR recursion.
///
/// # Errors
///
/// [`ArimaError::NonStationary`] if `ar` has a root on or inside the unit
/// circle.
pub fn autocovariances(
    ar: &Polynomial,
    ma: &Polynomial,
    var: f64,
    nlags: usize,
) -> Result<Vec<f64>, ArimaError> {
    if !ar.is_stationary() {
        return Err(ArimaError::NonStationary);
    }
    let p = ar.degree();
    let q = ma.degree();
    let psi = Polynomial::expand_ratio(ma, ar, q + 1);
    let c: Vec<f64> = (0..=q)
        .map(|k| (k..=q).map(|j| ma.get(j) * psi[j - k]).sum::<f64>() * var)
        .collect();
    let rhs_at = |k: usize| if k <= q { c[k] } else { 0.0 };

    let mut m = Array2::zeros((p + 1, p + 1));
    let mut rhs = Array1::zeros(p + 1);
    for k in 0..=p {
        for i in 0..=p {
            let lag = k.abs_diff(i);
            m[[k, lag]] += ar.get(i);
        }
        rhs[k] = rhs_at(k);
    }
    let head = lu_solve(m, rhs)?;

    let len = nlags + 1;
    let mut gamma = vec![0.0; len.max(p + 1)];
    for (g, h) in gamma.iter_mut().zip(head.iter()) {
        *g = *h;
    }
    for k in p + 1..len {
        let mut s = rhs_at(k);
        for i in 1..=p {
            s -= ar.get(i) * gamma[k - i];
        }
        gamma[k] = s;
    }
    gamma.truncate(len);
    Ok(gamma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn white_noise() {
        let g = autocovariances(&Polynomial::one(), &Polynomial::one(), 2.0, 3).unwrap();
        assert_eq!(g.len(), 4);
        assert_abs_diff_eq!(g[0], 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(g[1], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn ar1_closed_form() {
        let phi: f64 = 0.5;
        let ar = Polynomial::from_lags(&[-phi]);
        let g = autocovariances(&ar, &Polynomial::one(), 1.0, 4).unwrap();
        let g0 = 1.0 / (1.0 - phi * phi);
        for (k, v) in g.iter().enumerate() {
            assert_abs_diff_eq!(*v, g0 * phi.powi(k as i32), epsilon = 1e-12);
        }
    }

    #[test]
    fn ma1_closed_form() {
        let theta = 0.6;
        let ma = Polynomial::from_lags(&[theta]);
        let g = autocovariances(&Polynomial::one(), &ma, 1.5, 3).unwrap();
        assert_abs_diff_eq!(g[0], 1.5 * (1.0 + theta * theta), epsilon = 1e-12);
        assert_abs_diff_eq!(g[1], 1.5 * theta, epsilon = 1e-12);
        assert_abs_diff_eq!(g[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn arma11_closed_form() {
        let (phi, theta): (f64, f64) = (0.7, 0.3);
        let ar = Polynomial::from_lags(&[-phi]);
        let ma = Polynomial::from_lags(&[theta]);
        let g = autocovariances(&ar, &ma, 1.0, 3).unwrap();
        let g0 = (1.0 + 2.0 * phi * theta + theta * theta) / (1.0 - phi * phi);
        let g1 = (1.0 + phi * theta) * (phi + theta) / (1.0 - phi * phi);
        assert_abs_diff_eq!(g[0], g0, epsilon = 1e-12);
        assert_abs_diff_eq!(g[1], g1, epsilon = 1e-12);
        assert_abs_diff_eq!(g[2], phi * g1, epsilon = 1e-12);
    }

    #[test]
    fn ar2_yule_walker() {
        let (phi1, phi2) = (0.5, -0.3);
        let ar = Polynomial::from_lags(&[-phi1, -phi2]);
        let g = autocovariances(&ar, &Polynomial::one(), 1.0, 5).unwrap();
        // Yule-Walker: γ(k) = φ1 γ(k-1) + φ2 γ(k-2) for k >= 2, and γ(0) = φ1γ1 + φ2γ2 + 1
        for k in 2..=5 {
            assert_abs_diff_eq!(g[k], phi1 * g[k - 1] + phi2 * g[k - 2], epsilon = 1e-12);
        }
        assert_abs_diff_eq!(g[0], phi1 * g[1] + phi2 * g[2] + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn short_request_with_long_ar() {
        let ar = Polynomial::from_lags(&[-0.5, 0.2, -0.1]);
        let g = autocovariances(&ar, &Polynomial::one(), 1.0, 0).unwrap();
        assert_eq!(g.len(), 1);
        assert!(g[0] > 1.0);
    }

    #[test]
    fn non_stationary_rejected() {
        let ar = Polynomial::from_lags(&[-1.0]);
        assert_eq!(
            autocovariances(&ar, &Polynomial::one(), 1.0, 2),
            Err(ArimaError::NonStationary)
        );
    }
}
