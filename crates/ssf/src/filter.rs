//! Ordinary Kalman filter.

use kalmar_linalg::{add_outer, symmetrize};
use ndarray::{Array1, ArrayView1};
use tracing::{debug, instrument};

use crate::error::SsfError;
use crate::likelihood::{DiffuseLikelihood, LikelihoodAccumulator};
use crate::model::StateSpaceModel;
use crate::state::{PredictionError, State, StepKind};

/// Prediction variances at or below this value are treated as zero.
pub const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Relative size of a residual that a zero-variance step may leave.
pub(crate) const DEGENERATE_RESIDUAL: f64 = 1e-9;

/// Output of a filter run.
#[derive(Clone, Debug)]
pub struct FilterResults {
    pub(crate) likelihood: DiffuseLikelihood,
    pub(crate) errors: Vec<PredictionError>,
    pub(crate) states: Option<Vec<State>>,
    pub(crate) collapse: Option<usize>,
    pub(crate) dropped: usize,
}

impl FilterResults {
    /// The likelihood of the series.
    pub fn likelihood(&self) -> &DiffuseLikelihood {
        &self.likelihood
    }

    /// Prediction errors, one per time step.
    pub fn errors(&self) -> &[PredictionError] {
        &self.errors
    }

    /// Predicted states `(a_t, P_t)`, if storage was requested.
    pub fn states(&self) -> Option<&[State]> {
        self.states.as_deref()
    }

    /// Standardized errors `e_t / √f_t` of the observed steps after the
    /// diffuse part is resolved; missing, degenerate and diffuse steps are
    /// left out.
    pub fn standardized_errors(&self) -> Array1<f64> {
        self.errors
            .iter()
            .filter(|pe| pe.kind() == StepKind::Observed)
            .map(PredictionError::standardized)
            .collect()
    }

    /// Time step after which the diffuse part was collapsed.
    pub fn collapse_position(&self) -> Option<usize> {
        self.collapse
    }

    /// Diffuse directions never identified by the data.
    pub fn dropped_directions(&self) -> usize {
        self.dropped
    }
}

/// Update with observation `y` at `t` followed by the prediction for
/// `t + 1`.
pub(crate) fn ordinary_step<M: StateSpaceModel + ?Sized>(
    model: &M,
    t: usize,
    y: f64,
    state: &mut State,
    tolerance: f64,
    c: &mut Array1<f64>,
) -> Result<PredictionError, SsfError> {
    let pe = if y.is_nan() {
        PredictionError::missing()
    } else {
        if y.is_infinite() {
            return Err(SsfError::NonFiniteObservation { t });
        }
        let f = model.zvz(t, state.p.view()) + model.error_variance(t);
        let e = y - model.zx(t, state.a.view());
        if !f.is_finite() || f < -tolerance {
            return Err(SsfError::NonPositiveVariance { t, f });
        }
        if f <= tolerance {
            if e.abs() > DEGENERATE_RESIDUAL * (1.0 + y.abs()) {
                return Err(SsfError::DegenerateObservation { t, e });
            }
            PredictionError::new(e, f, StepKind::Degenerate)
        } else {
            model.zm(t, state.p.view(), c.view_mut());
            state.a.scaled_add(e / f, c);
            add_outer(state.p.view_mut(), c.view(), -1.0 / f);
            PredictionError::new(e, f, StepKind::Observed)
        }
    };
    predict(model, t, state);
    Ok(pe)
}

/// `a ← T·a`, `P ← T·P·Tᵀ + V`.
pub(crate) fn predict<M: StateSpaceModel + ?Sized>(model: &M, t: usize, state: &mut State) {
    model.tx(t, state.a.view_mut());
    model.tvt(t, state.p.view_mut());
    model.add_v(t, state.p.view_mut());
    symmetrize(state.p.view_mut());
}

/// Kalman filter for models with a proper initial distribution.
#[derive(Clone, Debug)]
pub struct OrdinaryFilter {
    tolerance: f64,
    store_states: bool,
}

impl Default for OrdinaryFilter {
    fn default() -> Self {
        Self {
            tolerance: ZERO_VARIANCE_TOLERANCE,
            store_states: false,
        }
    }
}

impl OrdinaryFilter {
    /// Filter with the default zero-variance tolerance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the zero-variance tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Keeps the predicted states, as needed by the smoother.
    pub fn with_state_storage(mut self, store: bool) -> Self {
        self.store_states = store;
        self
    }

    /// Runs the filter on `y` (NaN marks a missing value).
    ///
    /// # Errors
    ///
    /// Model-contract errors from [`StateSpaceModel::check`], a
    /// [`SsfError::DiffuseInitialization`] for a diffuse model, and the
    /// numerical failures of the recursion.
    #[instrument(skip_all, fields(n = y.len()))]
    pub fn filter<M: StateSpaceModel + ?Sized>(
        &self,
        model: &M,
        y: ArrayView1<'_, f64>,
    ) -> Result<FilterResults, SsfError> {
        model.check()?;
        model.check_length(y.len())?;
        if model.is_diffuse() {
            return Err(SsfError::DiffuseInitialization {
                operation: "the ordinary filter",
            });
        }
        let mut state = State::initial(model);
        let mut acc = LikelihoodAccumulator::new();
        let mut errors = Vec::with_capacity(y.len());
        let mut states = self.store_states.then(|| Vec::with_capacity(y.len()));
        let mut c = Array1::zeros(state.dim());

        for (t, &yt) in y.iter().enumerate() {
            if let Some(states) = states.as_mut() {
                states.push(state.clone());
            }
            let pe = ordinary_step(model, t, yt, &mut state, self.tolerance, &mut c)
                .inspect_err(|e| debug!(t, error = %e, "ordinary filter failed"))?;
            if pe.kind() == StepKind::Observed {
                acc.add(pe.e(), pe.f());
            }
            errors.push(pe);
        }

        Ok(FilterResults {
            likelihood: acc.finish(0, 0.0),
            errors,
            states,
            collapse: None,
            dropped: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssf::Ssf;
    use approx::assert_abs_diff_eq;
    use kalmar_arima::{ArimaModel, Polynomial};
    use ndarray::array;

    fn ar1(phi: f64, var: f64) -> Ssf {
        Ssf::arma(&ArimaModel::arma(Polynomial::from_lags(&[-phi]), Polynomial::one(), var).unwrap())
            .unwrap()
    }

    #[test]
    fn missing_value_passes_prediction_through() {
        let ssf = ar1(0.5, 1.0);
        let y = array![1.0, f64::NAN, 0.5];
        let res = OrdinaryFilter::new().filter(&ssf, y.view()).unwrap();
        assert_eq!(res.likelihood().n(), 2);
        assert_eq!(res.errors()[1].kind(), StepKind::Missing);
        // Two-step-ahead prediction: 0.25·y_0, variance 1 + 0.25.
        assert_abs_diff_eq!(res.errors()[2].e(), 0.5 - 0.25, epsilon = 1e-14);
        assert_abs_diff_eq!(res.errors()[2].f(), 1.25, epsilon = 1e-14);
    }

    #[test]
    fn standardized_errors_skip_missing_steps() {
        let ssf = ar1(0.5, 1.0);
        let y = array![1.0, f64::NAN, 0.5, -0.2];
        let res = OrdinaryFilter::new().filter(&ssf, y.view()).unwrap();
        let u = res.standardized_errors();
        assert_eq!(u.len(), 3);
        assert_abs_diff_eq!(u[0], 1.0 / (4.0_f64 / 3.0).sqrt(), epsilon = 1e-14);
        assert_abs_diff_eq!(u[1], 0.25 / 1.25_f64.sqrt(), epsilon = 1e-14);
        assert_abs_diff_eq!(u.dot(&u), res.likelihood().ssq(), epsilon = 1e-12);
    }

    #[test]
    fn stores_predicted_states() {
        let ssf = ar1(0.5, 1.0);
        let y = array![1.0, 2.0];
        let res = OrdinaryFilter::new()
            .with_state_storage(true)
            .filter(&ssf, y.view())
            .unwrap();
        let states = res.states().unwrap();
        assert_eq!(states.len(), 2);
        assert_abs_diff_eq!(states[1].a()[0], 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(states[1].p()[[0, 0]], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn zero_variance_step_is_degenerate_or_error() {
        let ssf = ar1(0.5, 1.0)
            .with_regression(array![[0.0], [0.0]], crate::Coefficients::TimeVarying(array![[1.0]]))
            .unwrap();
        // Proper model, nothing degenerate.
        assert!(OrdinaryFilter::new().filter(&ssf, array![1.0, 2.0].view()).is_ok());

        let zero = Ssf::noise(0.0).unwrap();
        let ok = OrdinaryFilter::new().filter(&zero, array![0.0, 0.0].view()).unwrap();
        assert_eq!(ok.errors()[0].kind(), StepKind::Degenerate);
        assert_eq!(ok.likelihood().n(), 0);
        assert!(matches!(
            OrdinaryFilter::new().filter(&zero, array![1.0].view()),
            Err(SsfError::DegenerateObservation { t: 0, .. })
        ));
    }

    #[test]
    fn rejects_diffuse_and_infinite_input() {
        let ll = Ssf::local_level(1.0).unwrap();
        assert!(matches!(
            OrdinaryFilter::new().filter(&ll, array![1.0].view()),
            Err(SsfError::DiffuseInitialization { .. })
        ));
        let ssf = ar1(0.5, 1.0);
        assert_eq!(
            OrdinaryFilter::new()
                .filter(&ssf, array![1.0, f64::INFINITY].view())
                .unwrap_err(),
            SsfError::NonFiniteObservation { t: 1 }
        );
    }

    #[test]
    fn capacity_is_checked() {
        let ssf = ar1(0.5, 1.0)
            .with_regression(array![[1.0]], crate::Coefficients::TimeVarying(array![[1.0]]))
            .unwrap();
        assert_eq!(
            OrdinaryFilter::new()
                .filter(&ssf, array![1.0, 2.0].view())
                .unwrap_err(),
            SsfError::ObservationCapacity {
                capacity: 1,
                requested: 2
            }
        );
    }
}
