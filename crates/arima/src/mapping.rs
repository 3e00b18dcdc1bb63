//! Parameter boundary between an optimizer and ARIMA models.

use crate::differencing::differencing_polynomial;
use crate::error::ArimaError;
use crate::model::ArimaModel;
use crate::params::stable_polynomial;
use crate::polynomial::Polynomial;

/// Maps a vector of unconstrained parameters to an [`ArimaModel`].
///
/// Implementations must be pure: the same parameters always give the same
/// model, so evaluations at different points can run on different threads.
pub trait ArimaMapping: Send + Sync {
    /// Number of parameters.
    fn dim(&self) -> usize;

    /// Builds the model for `params`.
    fn map(&self, params: &[f64]) -> Result<ArimaModel, ArimaError>;

    /// Starting point for an optimizer.
    fn default_parameters(&self) -> Vec<f64> {
        vec![0.0; self.dim()]
    }
}

/// Seasonal ARIMA `(p, d, q)(bp, bd, bq)_period` with unit innovation
/// variance.
///
/// Parameters are laid out as `[regular AR | seasonal AR | regular MA |
/// seasonal MA]`, each block in PACF form so every point maps to a
/// stationary and invertible model.
#[derive(Clone, Debug, PartialEq)]
pub struct SarimaMapping {
    period: usize,
    p: usize,
    d: usize,
    q: usize,
    bp: usize,
    bd: usize,
    bq: usize,
    delta: Polynomial,
}

impl SarimaMapping {
    /// Non-seasonal ARIMA `(p, d, q)`.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            period: 1,
            p,
            d,
            q,
            bp: 0,
            bd: 0,
            bq: 0,
            delta: differencing_polynomial(1, d, 0),
        }
    }

    /// Adds a seasonal part `(bp, bd, bq)` with the given period.
    ///
    /// # Errors
    ///
    /// [`ArimaError::InvalidPeriod`] if `period < 2`.
    pub fn with_seasonal(
        mut self,
        period: usize,
        bp: usize,
        bd: usize,
        bq: usize,
    ) -> Result<Self, ArimaError> {
        if period < 2 {
            return Err(ArimaError::InvalidPeriod(period));
        }
        self.period = period;
        self.bp = bp;
        self.bd = bd;
        self.bq = bq;
        self.delta = differencing_polynomial(period, self.d, bd);
        Ok(self)
    }

    /// Seasonal period (1 when there is no seasonal part).
    pub fn period(&self) -> usize {
        self.period
    }

    /// Regular orders `(p, d, q)`.
    pub fn regular_orders(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    /// Seasonal orders `(bp, bd, bq)`.
    pub fn seasonal_orders(&self) -> (usize, usize, usize) {
        (self.bp, self.bd, self.bq)
    }

    /// The differencing polynomial shared by every model of the mapping.
    pub fn delta(&self) -> &Polynomial {
        &self.delta
    }
}

impl ArimaMapping for SarimaMapping {
    fn dim(&self) -> usize {
        self.p + self.bp + self.q + self.bq
    }

    fn map(&self, params: &[f64]) -> Result<ArimaModel, ArimaError> {
        if params.len() != self.dim() {
            return Err(ArimaError::ParameterCount {
                expected: self.dim(),
                got: params.len(),
            });
        }
        if let Some(i) = params.iter().position(|x| !x.is_finite()) {
            return Err(ArimaError::NonFiniteParameter(i));
        }
        let (ar, rest) = params.split_at(self.p);
        let (sar, rest) = rest.split_at(self.bp);
        let (ma, sma) = rest.split_at(self.q);

        let phi = stable_polynomial(ar, 1).times(&stable_polynomial(sar, self.period));
        let theta = stable_polynomial(ma, 1).times(&stable_polynomial(sma, self.period));
        ArimaModel::new(phi, self.delta.clone(), theta, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn airline_layout() {
        let mapping = SarimaMapping::new(0, 1, 1).with_seasonal(12, 0, 1, 1).unwrap();
        assert_eq!(mapping.dim(), 2);
        assert_eq!(mapping.delta().degree(), 13);
        let model = mapping.map(&[0.4, -0.2]).unwrap();
        assert!(model.ar().is_identity());
        assert_eq!(model.ma().degree(), 13);
        assert_abs_diff_eq!(model.ma().get(1), -0.4_f64.tanh(), epsilon = 1e-15);
        assert_abs_diff_eq!(model.ma().get(12), 0.2_f64.tanh(), epsilon = 1e-15);
        assert_abs_diff_eq!(
            model.ma().get(13),
            -0.4_f64.tanh() * 0.2_f64.tanh(),
            epsilon = 1e-15
        );
        assert_eq!(model.innovation_variance(), 1.0);
    }

    #[test]
    fn every_point_is_stationary_and_invertible() {
        let mapping = SarimaMapping::new(2, 0, 2).with_seasonal(4, 1, 0, 1).unwrap();
        let model = mapping.map(&[3.0, -2.5, 1.7, 4.0, -4.0, 0.2]).unwrap();
        assert!(model.ar().is_stationary());
        assert!(model.ma().is_stationary());
    }

    #[test]
    fn rejects_bad_parameters() {
        let mapping = SarimaMapping::new(1, 0, 1);
        assert_eq!(
            mapping.map(&[0.1]),
            Err(ArimaError::ParameterCount { expected: 2, got: 1 })
        );
        assert_eq!(
            mapping.map(&[0.1, f64::NAN]),
            Err(ArimaError::NonFiniteParameter(1))
        );
    }

    #[test]
    fn rejects_bad_period() {
        assert_eq!(
            SarimaMapping::new(0, 1, 1).with_seasonal(1, 0, 1, 1),
            Err(ArimaError::InvalidPeriod(1))
        );
    }

    #[test]
    fn default_point_is_white_noise() {
        let mapping = SarimaMapping::new(1, 1, 1);
        let model = mapping.map(&mapping.default_parameters()).unwrap();
        assert!(model.ar().is_identity());
        assert!(model.ma().is_identity());
        assert_eq!(model.differencing_order(), 1);
    }
}
