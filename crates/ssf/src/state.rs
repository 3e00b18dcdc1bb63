//! Filter state and per-step records.

use ndarray::{Array1, Array2};

use crate::model::Initialization;

/// Predicted state `(a_t, P_t)` for the next observation.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub(crate) a: Array1<f64>,
    pub(crate) p: Array2<f64>,
}

impl State {
    /// Zero mean and covariance of dimension `dim`.
    pub fn zeros(dim: usize) -> Self {
        Self {
            a: Array1::zeros(dim),
            p: Array2::zeros((dim, dim)),
        }
    }

    /// `(a_0, P_f0)` of a model; diffuse directions are not included.
    pub fn initial<M: Initialization + ?Sized>(model: &M) -> Self {
        let mut state = Self::zeros(model.dim());
        model.a0(state.a.view_mut());
        model.pf0(state.p.view_mut());
        state
    }

    /// State mean.
    pub fn a(&self) -> &Array1<f64> {
        &self.a
    }

    /// State covariance.
    pub fn p(&self) -> &Array2<f64> {
        &self.p
    }

    /// State dimension.
    pub fn dim(&self) -> usize {
        self.a.len()
    }
}

/// How a time step entered the likelihood.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// Ordinary update.
    Observed,
    /// Observation is NaN; no update.
    Missing,
    /// Zero prediction variance and zero residual; no update.
    Degenerate,
    /// Update during the diffuse period.
    Diffuse,
}

/// One-step prediction error `e_t` and its variance `f_t`.
///
/// During the diffuse period `f_t` is the variance of the finite part only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PredictionError {
    e: f64,
    f: f64,
    kind: StepKind,
}

impl PredictionError {
    pub(crate) fn new(e: f64, f: f64, kind: StepKind) -> Self {
        Self { e, f, kind }
    }

    pub(crate) fn missing() -> Self {
        Self::new(f64::NAN, f64::NAN, StepKind::Missing)
    }

    /// Prediction error.
    pub fn e(&self) -> f64 {
        self.e
    }

    /// Prediction-error variance.
    pub fn f(&self) -> f64 {
        self.f
    }

    /// Kind of step.
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Standardized error `e / √f` (NaN for missing steps).
    pub fn standardized(&self) -> f64 {
        match self.kind {
            StepKind::Missing => f64::NAN,
            StepKind::Degenerate => 0.0,
            StepKind::Observed | StepKind::Diffuse => self.e / self.f.sqrt(),
        }
    }
}
