//! Lag polynomials `c₀ + c₁·B + … + c_p·Bᵖ`.

use crate::error::ArimaError;

/// A polynomial in the backshift operator `B`.
///
/// Coefficients are stored by increasing power. ARIMA operators are
/// normalised (`c₀ = 1`); the AR operator of `y_t = φ₁·y_{t-1} + ε_t` is
/// `1 - φ₁·B`.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Builds a polynomial from its coefficients; trailing zeros are dropped.
    pub fn new(coefficients: Vec<f64>) -> Self {
        let mut coefficients = coefficients;
        while coefficients.len() > 1 && coefficients.last() == Some(&0.0) {
            coefficients.pop();
        }
        if coefficients.is_empty() {
            coefficients.push(0.0);
        }
        Self { coefficients }
    }

    /// The identity operator `1`.
    pub fn one() -> Self {
        Self {
            coefficients: vec![1.0],
        }
    }

    /// Builds `1 + c₁·B + … + c_p·Bᵖ` from `[c₁, …, c_p]`.
    pub fn from_lags(lags: &[f64]) -> Self {
        let mut coefficients = Vec::with_capacity(lags.len() + 1);
        coefficients.push(1.0);
        coefficients.extend_from_slice(lags);
        Self::new(coefficients)
    }

    /// Builds `1 + c₁·Bˢ + … + c_P·B^{sP}` from `[c₁, …, c_P]`.
    pub fn seasonal(lags: &[f64], period: usize) -> Self {
        let mut coefficients = vec![0.0; lags.len() * period + 1];
        coefficients[0] = 1.0;
        for (k, &c) in lags.iter().enumerate() {
            coefficients[(k + 1) * period] = c;
        }
        Self::new(coefficients)
    }

    /// Degree of the polynomial.
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Coefficients by increasing power.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Coefficient of `Bⁱ` (zero beyond the degree).
    pub fn get(&self, i: usize) -> f64 {
        self.coefficients.get(i).copied().unwrap_or(0.0)
    }

    /// Returns `true` for the constant polynomial `1`.
    pub fn is_identity(&self) -> bool {
        self.coefficients.len() == 1 && self.coefficients[0] == 1.0
    }

    /// Product of two polynomials.
    pub fn times(&self, other: &Polynomial) -> Polynomial {
        let mut out = vec![0.0; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, &a) in self.coefficients.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            for (j, &b) in other.coefficients.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial::new(out)
    }

    /// Value of the polynomial at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Checks `c₀ = 1`.
    pub(crate) fn check_normalized(&self) -> Result<(), ArimaError> {
        if self.coefficients[0] != 1.0 {
            return Err(ArimaError::InvalidLeadingCoefficient(self.coefficients[0]));
        }
        Ok(())
    }

    /// Returns `true` if all roots lie strictly outside the unit circle.
    ///
    /// Uses the step-down (reverse Levinson) recursion: the polynomial is
    /// stable iff every reflection coefficient has modulus below one.
    pub fn is_stationary(&self) -> bool {
        let c0 = self.coefficients[0];
        if c0 == 0.0 {
            return false;
        }
        let mut a: Vec<f64> = self.coefficients.iter().map(|c| c / c0).collect();
        for k in (1..a.len()).rev() {
            let rk = a[k];
            if !rk.is_finite() || rk.abs() >= 1.0 {
                return false;
            }
            let denom = 1.0 - rk * rk;
            let prev: Vec<f64> = (0..k).map(|j| (a[j] - rk * a[k - j]) / denom).collect();
            a.truncate(k);
            a[1..k].copy_from_slice(&prev[1..k]);
        }
        true
    }

    /// First `n` coefficients of the power series `num(B) / den(B)`.
    ///
    /// For an ARMA model this gives the ψ-weights of the MA(∞) form.
    pub fn expand_ratio(num: &Polynomial, den: &Polynomial, n: usize) -> Vec<f64> {
        let d0 = den.coefficients[0];
        let mut psi = vec![0.0; n];
        for j in 0..n {
            let mut s = num.get(j);
            for i in 1..=den.degree().min(j) {
                s -= den.coefficients[i] * psi[j - i];
            }
            psi[j] = s / d0;
        }
        psi
    }
}

impl Default for Polynomial {
    fn default() -> Self {
        Self::one()
    }
}
