//! Stationary ARMA component.

use kalmar_arima::{ArimaModel, ArmaStateSpace};
use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::error::SsfError;
use crate::model::{Dynamics, Initialization, Measurement};

/// ARMA model in forecast-function form; the observation is the first
/// state element and there is no measurement noise.
#[derive(Clone, Debug, PartialEq)]
pub struct ArmaSsf {
    ss: ArmaStateSpace,
}

impl ArmaSsf {
    /// Builds the component for a model without unit roots.
    pub fn new(model: &ArimaModel) -> Result<Self, SsfError> {
        Ok(Self {
            ss: ArmaStateSpace::new(model)?,
        })
    }

    /// Underlying representation.
    pub fn representation(&self) -> &ArmaStateSpace {
        &self.ss
    }
}

impl Initialization for ArmaSsf {
    fn dim(&self) -> usize {
        self.ss.dim()
    }

    fn diffuse_dim(&self) -> usize {
        0
    }

    fn a0(&self, _a: ArrayViewMut1<'_, f64>) {}

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) {
        p.assign(self.ss.initial_covariance());
    }

    fn diffuse_constraints(&self, _b: ArrayViewMut2<'_, f64>) {}
}

impl Dynamics for ArmaSsf {
    fn state_dim(&self) -> usize {
        self.ss.dim()
    }

    fn innovations_dim(&self) -> usize {
        1
    }

    fn s(&self, _t: usize, mut s: ArrayViewMut2<'_, f64>) {
        let scale = self.ss.innovation_variance().sqrt();
        s.column_mut(0).assign(&self.ss.psi().mapv(|v| v * scale));
    }

    fn tx(&self, _t: usize, x: ArrayViewMut1<'_, f64>) {
        self.ss.tx(x);
    }

    fn xt(&self, _t: usize, x: ArrayViewMut1<'_, f64>) {
        self.ss.xt(x);
    }

    fn add_v(&self, _t: usize, p: ArrayViewMut2<'_, f64>) {
        self.ss.add_v(p);
    }

    fn tvt(&self, _t: usize, p: ArrayViewMut2<'_, f64>) {
        self.ss.tvt(p);
    }
}

impl Measurement for ArmaSsf {
    fn loading_dim(&self) -> usize {
        self.ss.dim()
    }

    fn z(&self, _t: usize, mut z: ArrayViewMut1<'_, f64>) {
        z[0] = 1.0;
    }

    fn zx(&self, _t: usize, x: ArrayView1<'_, f64>) -> f64 {
        x[0]
    }

    fn zm(&self, _t: usize, m: ArrayView2<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        out.assign(&m.row(0));
    }

    fn zvz(&self, _t: usize, v: ArrayView2<'_, f64>) -> f64 {
        v[[0, 0]]
    }

    fn vpzdz(&self, _t: usize, mut v: ArrayViewMut2<'_, f64>, d: f64) {
        v[[0, 0]] += d;
    }

    fn xpzd(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>, d: f64) {
        x[0] += d;
    }

    fn error_variance(&self, _t: usize) -> f64 {
        0.0
    }
}
