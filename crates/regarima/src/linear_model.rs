//! Differenced regression `Δy = Δ[−e_missing | m | X]·b + w`.

use kalmar_arima::{Polynomial, difference};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};

use crate::error::RegArimaError;
use crate::model::RegArimaModel;

/// Linear model of the differenced series with a stationary disturbance.
///
/// Columns are ordered as missing-value indicators, then the mean, then
/// the user regressors. A missing observation is set to zero in `y` and
/// gets the indicator `−e_t`, whose coefficient is the estimate of the
/// missing value.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearModel {
    y: Array1<f64>,
    x: Array2<f64>,
    missing: usize,
    mean: bool,
}

impl LinearModel {
    /// Creates a model from already differenced data.
    ///
    /// # Errors
    ///
    /// [`RegArimaError::RegressorRows`] if `x` and `y` disagree,
    /// [`RegArimaError::ColumnCount`] if `x` cannot hold the indicator and
    /// mean columns, [`RegArimaError::InsufficientData`] for an empty `y`.
    pub fn new(
        y: Array1<f64>,
        x: Array2<f64>,
        missing: usize,
        mean: bool,
    ) -> Result<Self, RegArimaError> {
        if y.is_empty() {
            return Err(RegArimaError::InsufficientData { n: 0, degree: 0 });
        }
        if x.nrows() != y.len() {
            return Err(RegArimaError::RegressorRows {
                rows: x.nrows(),
                n: y.len(),
            });
        }
        if missing + usize::from(mean) > x.ncols() {
            return Err(RegArimaError::ColumnCount {
                columns: x.ncols(),
                required: missing + usize::from(mean),
            });
        }
        Ok(Self { y, x, missing, mean })
    }

    pub(crate) fn from_regarima(
        model: &RegArimaModel,
        delta: &Polynomial,
    ) -> Result<Self, RegArimaError> {
        let n = model.len();
        let degree = delta.degree();
        if n <= degree {
            return Err(RegArimaError::InsufficientData { n, degree });
        }
        let nd = n - degree;
        let missing = model.missing();
        let nm = missing.len();
        let xin = model.regressors();
        let ncols = nm + usize::from(model.has_mean()) + xin.ncols();

        let mut y = model.y().to_owned();
        for &t in missing {
            y[t] = 0.0;
        }
        let y = difference(delta, y.view());

        let mut x = Array2::zeros((nd, ncols));
        let mut indicator = Array1::zeros(n);
        for (j, &t) in missing.iter().enumerate() {
            indicator[t] = -1.0;
            x.column_mut(j).assign(&difference(delta, indicator.view()));
            indicator[t] = 0.0;
        }
        let mut j = nm;
        if model.has_mean() {
            x.column_mut(j).fill(1.0);
            j += 1;
        }
        for col in xin.columns() {
            x.column_mut(j).assign(&difference(delta, col));
            j += 1;
        }
        Ok(Self {
            y,
            x,
            missing: nm,
            mean: model.has_mean(),
        })
    }

    /// Differenced series.
    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }

    /// Differenced regressors, all columns.
    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Always `false` for a constructed model.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Number of leading missing-value columns.
    pub fn missing_count(&self) -> usize {
        self.missing
    }

    /// Whether the column after the missing indicators is the mean.
    pub fn has_mean(&self) -> bool {
        self.mean
    }

    /// Number of columns that are not missing-value indicators.
    pub fn regression_count(&self) -> usize {
        self.x.ncols() - self.missing
    }

    /// The regression columns without the missing-value indicators.
    pub fn regression_columns(&self) -> ArrayView2<'_, f64> {
        self.x.slice(s![.., self.missing..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kalmar_arima::{ArimaModel, differencing_polynomial};
    use ndarray::array;

    fn airline_delta() -> Polynomial {
        differencing_polynomial(4, 1, 1)
    }

    #[test]
    fn columns_are_missing_then_mean_then_regressors() {
        let delta = differencing_polynomial(1, 1, 0);
        let arima = ArimaModel::new(Polynomial::one(), delta, Polynomial::one(), 1.0).unwrap();
        let model = RegArimaModel::builder(array![1.0, f64::NAN, 4.0, 7.0])
            .with_regressors(array![[1.0], [2.0], [4.0], [8.0]])
            .with_mean(true)
            .with_arima(arima)
            .build()
            .unwrap();
        let lm = model.differenced_model().unwrap();
        assert_eq!(lm.len(), 3);
        assert_eq!(lm.missing_count(), 1);
        assert_eq!(lm.regression_count(), 2);
        // y with the missing value set to zero: [1, 0, 4, 7].
        assert_eq!(lm.y(), array![-1.0, 4.0, 3.0]);
        // Δ(−e_1) = [−1, 1, 0].
        assert_eq!(lm.x().column(0), array![-1.0, 1.0, 0.0]);
        assert_eq!(lm.x().column(1), array![1.0, 1.0, 1.0]);
        assert_eq!(lm.x().column(2), array![1.0, 2.0, 4.0]);
    }

    #[test]
    fn too_short_for_the_differencing() {
        let arima =
            ArimaModel::new(Polynomial::one(), airline_delta(), Polynomial::one(), 1.0).unwrap();
        let model = RegArimaModel::builder(Array1::ones(5)).with_arima(arima).build().unwrap();
        assert_eq!(
            model.differenced_model().unwrap_err(),
            RegArimaError::InsufficientData { n: 5, degree: 5 }
        );
    }

    #[test]
    fn undifferenced_model_keeps_the_data() {
        let model = RegArimaModel::builder(array![2.0, 3.0]).with_mean(true).build().unwrap();
        let lm = model.differenced_model().unwrap();
        assert_eq!(lm.y(), array![2.0, 3.0]);
        assert_eq!(lm.x().column(0), array![1.0, 1.0]);
    }
}
