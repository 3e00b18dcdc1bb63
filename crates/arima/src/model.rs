//! ARIMA model: `Φ(B)·Δ(B)·y_t = Θ(B)·ε_t`, `Var(ε_t) = σ²`.

use crate::autocovariance::autocovariances;
use crate::error::ArimaError;
use crate::polynomial::Polynomial;

/// An ARIMA model with its unit roots kept apart from the stationary AR part.
///
/// The stationary operator `Φ`, the differencing operator `Δ` and the MA
/// operator `Θ` are normalised lag polynomials. The model is immutable; the
/// optimizer builds a new one for each parameter point.
#[derive(Clone, Debug, PartialEq)]
pub struct ArimaModel {
    ar: Polynomial,
    delta: Polynomial,
    ma: Polynomial,
    var: f64,
}

impl ArimaModel {
    /// Creates a model from its three operators and innovation variance.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArimaError::InvalidLeadingCoefficient`] | an operator does not start with 1 |
    /// | [`ArimaError::InvalidVariance`] | `var` is not positive and finite |
    pub fn new(
        ar: Polynomial,
        delta: Polynomial,
        ma: Polynomial,
        var: f64,
    ) -> Result<Self, ArimaError> {
        ar.check_normalized()?;
        delta.check_normalized()?;
        ma.check_normalized()?;
        if !var.is_finite() || var <= 0.0 {
            return Err(ArimaError::InvalidVariance(var));
        }
        Ok(Self { ar, delta, ma, var })
    }

    /// Stationary ARMA model (no unit roots).
    pub fn arma(ar: Polynomial, ma: Polynomial, var: f64) -> Result<Self, ArimaError> {
        Self::new(ar, Polynomial::one(), ma, var)
    }

    /// Stationary AR operator `Φ`.
    pub fn ar(&self) -> &Polynomial {
        &self.ar
    }

    /// Differencing operator `Δ`.
    pub fn delta(&self) -> &Polynomial {
        &self.delta
    }

    /// MA operator `Θ`.
    pub fn ma(&self) -> &Polynomial {
        &self.ma
    }

    /// Innovation variance `σ²`.
    pub fn innovation_variance(&self) -> f64 {
        self.var
    }

    /// Full AR operator `Φ·Δ`.
    pub fn full_ar(&self) -> Polynomial {
        self.ar.times(&self.delta)
    }

    /// Degree of `Δ`, i.e. the number of observations lost by differencing.
    pub fn differencing_order(&self) -> usize {
        self.delta.degree()
    }

    /// Returns `true` if the model has no unit roots.
    pub fn is_stationary_model(&self) -> bool {
        self.delta.is_identity()
    }

    /// The ARMA model followed by `Δ(B)·y`.
    pub fn stationary(&self) -> ArimaModel {
        Self {
            ar: self.ar.clone(),
            delta: Polynomial::one(),
            ma: self.ma.clone(),
            var: self.var,
        }
    }

    /// Same operators with a different innovation variance.
    pub fn with_innovation_variance(&self, var: f64) -> Result<ArimaModel, ArimaError> {
        Self::new(self.ar.clone(), self.delta.clone(), self.ma.clone(), var)
    }

    /// Autocovariances `γ(0..=nlags)` of the stationary part.
    pub fn autocovariances(&self, nlags: usize) -> Result<Vec<f64>, ArimaError> {
        autocovariances(&self.ar, &self.ma, self.var, nlags)
    }

    /// First `n` ψ-weights `Θ(B) / Φ(B)` of the stationary part.
    pub fn psi_weights(&self, n: usize) -> Vec<f64> {
        Polynomial::expand_ratio(&self.ma, &self.ar, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differencing::differencing_polynomial;

    #[test]
    fn validation() {
        let bad = Polynomial::new(vec![2.0, 1.0]);
        assert!(matches!(
            ArimaModel::arma(bad, Polynomial::one(), 1.0),
            Err(ArimaError::InvalidLeadingCoefficient(_))
        ));
        assert!(matches!(
            ArimaModel::arma(Polynomial::one(), Polynomial::one(), 0.0),
            Err(ArimaError::InvalidVariance(_))
        ));
        assert!(matches!(
            ArimaModel::arma(Polynomial::one(), Polynomial::one(), f64::NAN),
            Err(ArimaError::InvalidVariance(_))
        ));
    }

    #[test]
    fn stationary_part_drops_unit_roots() {
        let m = ArimaModel::new(
            Polynomial::from_lags(&[-0.5]),
            differencing_polynomial(12, 1, 1),
            Polynomial::from_lags(&[0.3]),
            2.0,
        )
        .unwrap();
        assert_eq!(m.differencing_order(), 13);
        assert!(!m.is_stationary_model());
        let s = m.stationary();
        assert!(s.is_stationary_model());
        assert_eq!(s.ar(), m.ar());
        assert_eq!(s.innovation_variance(), 2.0);
        assert_eq!(m.full_ar().degree(), 14);
    }

    #[test]
    fn with_variance() {
        let m = ArimaModel::arma(Polynomial::from_lags(&[-0.5]), Polynomial::one(), 1.0).unwrap();
        let m2 = m.with_innovation_variance(3.0).unwrap();
        assert_eq!(m2.innovation_variance(), 3.0);
        assert_eq!(m2.ar(), m.ar());
    }

    #[test]
    fn model_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ArimaModel>();
    }
}
