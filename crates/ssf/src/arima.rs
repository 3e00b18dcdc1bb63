//! ARIMA component with diffuse unit roots.

use kalmar_arima::{ArimaModel, ArmaStateSpace};
use ndarray::{Array1, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, s};

use crate::error::SsfError;
use crate::model::{Dynamics, Initialization, Measurement};

/// `Δ(B)·y_t = w_t` with `w_t` a stationary ARMA process.
///
/// The state stacks the `d = deg Δ` previous observations and the ARMA
/// state of `w_t`:
///
/// ```text
/// α_t = [y_{t-1}, …, y_{t-d}, w_t, w_{t+1|t}, …]
/// y_t = w_t - δ_1·y_{t-1} - … - δ_d·y_{t-d}
/// ```
///
/// The lagged observations are diffuse at `t = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArimaSsf {
    d: usize,
    /// `δ_1..δ_d`.
    delta: Vec<f64>,
    arma: ArmaStateSpace,
    z: Array1<f64>,
}

impl ArimaSsf {
    /// Builds the component for any ARIMA model.
    pub fn new(model: &ArimaModel) -> Result<Self, SsfError> {
        let arma = ArmaStateSpace::new(&model.stationary())?;
        let d = model.differencing_order();
        let delta: Vec<f64> = (1..=d).map(|k| model.delta().get(k)).collect();
        let mut z = Array1::zeros(d + arma.dim());
        for (zk, dk) in z.iter_mut().zip(&delta) {
            *zk = -dk;
        }
        z[d] = 1.0;
        Ok(Self { d, delta, arma, z })
    }

    /// Number of lagged observations (degree of `Δ`).
    pub fn differencing_order(&self) -> usize {
        self.d
    }

    fn total_dim(&self) -> usize {
        self.d + self.arma.dim()
    }
}

impl Initialization for ArimaSsf {
    fn dim(&self) -> usize {
        self.total_dim()
    }

    fn diffuse_dim(&self) -> usize {
        self.d
    }

    fn a0(&self, _a: ArrayViewMut1<'_, f64>) {}

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) {
        p.slice_mut(s![self.d.., self.d..])
            .assign(self.arma.initial_covariance());
    }

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        for i in 0..self.d {
            b[[i, i]] = 1.0;
        }
    }
}

impl Dynamics for ArimaSsf {
    fn state_dim(&self) -> usize {
        self.total_dim()
    }

    fn innovations_dim(&self) -> usize {
        1
    }

    fn s(&self, _t: usize, mut s: ArrayViewMut2<'_, f64>) {
        let scale = self.arma.innovation_variance().sqrt();
        s.slice_mut(s![self.d.., 0])
            .assign(&self.arma.psi().mapv(|v| v * scale));
    }

    fn tx(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>) {
        let y = self.z.dot(&x);
        if self.d > 0 {
            for j in (1..self.d).rev() {
                x[j] = x[j - 1];
            }
            x[0] = y;
        }
        self.arma.tx(x.slice_mut(s![self.d..]));
    }

    fn xt(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>) {
        let head = if self.d > 0 { x[0] } else { 0.0 };
        for j in 0..self.d {
            let next = if j + 1 < self.d { x[j + 1] } else { 0.0 };
            x[j] = next - self.delta[j] * head;
        }
        self.arma.xt(x.slice_mut(s![self.d..]));
        if self.d > 0 {
            x[self.d] += head;
        }
    }

    fn add_v(&self, _t: usize, mut p: ArrayViewMut2<'_, f64>) {
        self.arma.add_v(p.slice_mut(s![self.d.., self.d..]));
    }
}

impl Measurement for ArimaSsf {
    fn loading_dim(&self) -> usize {
        self.total_dim()
    }

    fn z(&self, _t: usize, mut z: ArrayViewMut1<'_, f64>) {
        z.assign(&self.z);
    }

    fn zx(&self, _t: usize, x: ArrayView1<'_, f64>) -> f64 {
        self.z.dot(&x)
    }

    fn zvz(&self, _t: usize, v: ArrayView2<'_, f64>) -> f64 {
        self.z.dot(&v.dot(&self.z))
    }

    fn error_variance(&self, _t: usize) -> f64 {
        0.0
    }
}
