//! Regression model with ARIMA disturbances.

use kalmar_arima::{ArimaModel, Polynomial};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::RegArimaError;
use crate::linear_model::LinearModel;

/// `y_t = μ·m_t + x_tᵀ·β + u_t` with `Δ(B)·Φ(B)·u_t = Θ(B)·ε_t`.
///
/// `m_t` is the regressor whose differences are constant, so `μ` is the
/// mean of the differenced series. Missing observations are listed by
/// position; their values in `y` are never read.
///
/// ```mermaid
/// graph LR
///     A["RegArimaModel::builder(y)"] --> B[".with_regressors(x)"]
///     B --> C[".with_mean(true)"]
///     C --> D[".with_arima(model)"]
///     D --> E[".build()?"]
///     E --> F[".differenced_model()?"]
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RegArimaModel {
    y: Array1<f64>,
    x: Array2<f64>,
    mean: bool,
    missing: Vec<usize>,
    arima: ArimaModel,
}

/// Builder for [`RegArimaModel`].
#[derive(Clone, Debug)]
pub struct RegArimaModelBuilder {
    y: Array1<f64>,
    x: Option<Array2<f64>>,
    mean: bool,
    missing: Option<Vec<usize>>,
    arima: Option<ArimaModel>,
}

impl RegArimaModel {
    /// Starts a model of the series `y` (NaN marks a missing value).
    pub fn builder(y: Array1<f64>) -> RegArimaModelBuilder {
        RegArimaModelBuilder {
            y,
            x: None,
            mean: false,
            missing: None,
            arima: None,
        }
    }

    /// The series, NaN at the missing positions.
    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }

    /// Regression variables (observations × variables, possibly empty).
    pub fn regressors(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    /// Whether the mean of the differenced series is estimated.
    pub fn has_mean(&self) -> bool {
        self.mean
    }

    /// Sorted positions of the missing observations.
    pub fn missing(&self) -> &[usize] {
        &self.missing
    }

    /// The ARIMA disturbance model.
    pub fn arima(&self) -> &ArimaModel {
        &self.arima
    }

    /// Number of observations, missing ones included.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Returns `true` for an empty series (never, for a built model).
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Number of regression effects: the mean (if any) and the columns of
    /// `X`.
    pub fn regression_count(&self) -> usize {
        usize::from(self.mean) + self.x.ncols()
    }

    /// The same regression with another disturbance model.
    pub fn with_arima(&self, arima: ArimaModel) -> Self {
        Self {
            arima,
            ..self.clone()
        }
    }

    /// Differenced model under the unit roots of [`arima`](Self::arima).
    pub fn differenced_model(&self) -> Result<LinearModel, RegArimaError> {
        self.differenced_by(self.arima.delta())
    }

    /// Differenced model under the unit-root operator `delta`.
    ///
    /// # Errors
    ///
    /// [`RegArimaError::InsufficientData`] if nothing is left after
    /// differencing.
    pub fn differenced_by(&self, delta: &Polynomial) -> Result<LinearModel, RegArimaError> {
        LinearModel::from_regarima(self, delta)
    }

    /// The regressor `m_t` of the mean on the undifferenced scale:
    /// `Δ(B)·m_t = 1` with `m_t = 0` before the sample.
    pub fn mean_regressor(&self) -> Array1<f64> {
        let delta = self.arima.delta();
        let mut m = Array1::zeros(self.y.len());
        for t in 0..m.len() {
            let lagged: f64 = (1..=delta.degree().min(t))
                .map(|k| delta.get(k) * m[t - k])
                .sum();
            m[t] = 1.0 - lagged;
        }
        m
    }
}

impl RegArimaModelBuilder {
    /// Sets the regression variables (one row per observation).
    pub fn with_regressors(mut self, x: Array2<f64>) -> Self {
        self.x = Some(x);
        self
    }

    /// Estimates the mean of the differenced series.
    pub fn with_mean(mut self, mean: bool) -> Self {
        self.mean = mean;
        self
    }

    /// Declares the missing positions explicitly; values there are ignored.
    ///
    /// Without this call the missing positions are the NaN entries of `y`.
    pub fn with_missing(mut self, positions: Vec<usize>) -> Self {
        self.missing = Some(positions);
        self
    }

    /// Sets the disturbance model (white noise by default).
    pub fn with_arima(mut self, arima: ArimaModel) -> Self {
        self.arima = Some(arima);
        self
    }

    /// Validates and builds the model.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`RegArimaError::EmptySeries`] | `y` is empty |
    /// | [`RegArimaError::RegressorRows`] | `X` rows ≠ `y.len()` |
    /// | [`RegArimaError::InvalidMissingPosition`] | unsorted, repeated or out-of-range position |
    /// | [`RegArimaError::NonFiniteInput`] | NaN/∞ in `X`, or in `y` outside the missing positions |
    pub fn build(self) -> Result<RegArimaModel, RegArimaError> {
        let n = self.y.len();
        if n == 0 {
            return Err(RegArimaError::EmptySeries);
        }
        let x = self.x.unwrap_or_else(|| Array2::zeros((n, 0)));
        if x.nrows() != n {
            return Err(RegArimaError::RegressorRows { rows: x.nrows(), n });
        }
        if let Some(((index, _), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(RegArimaError::NonFiniteInput {
                input: "regressors",
                index,
            });
        }

        let missing = match self.missing {
            Some(positions) => {
                for (i, &p) in positions.iter().enumerate() {
                    if p >= n || (i > 0 && positions[i - 1] >= p) {
                        return Err(RegArimaError::InvalidMissingPosition { position: p, n });
                    }
                }
                positions
            }
            None => (0..n).filter(|&t| self.y[t].is_nan()).collect(),
        };

        let mut y = self.y;
        let mut next = missing.iter().peekable();
        for t in 0..n {
            if next.peek() == Some(&&t) {
                next.next();
                y[t] = f64::NAN;
            } else if !y[t].is_finite() {
                return Err(RegArimaError::NonFiniteInput {
                    input: "series",
                    index: t,
                });
            }
        }

        let arima = match self.arima {
            Some(arima) => arima,
            None => ArimaModel::arma(Polynomial::one(), Polynomial::one(), 1.0)?,
        };
        Ok(RegArimaModel {
            y,
            x,
            mean: self.mean,
            missing,
            arima,
        })
    }
}
