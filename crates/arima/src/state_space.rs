//! Forecast-function state-space form of a stationary ARMA model.
//!
//! ```text
//! x[t]   = [y_t, y_{t+1|t}, …, y_{t+r-1|t}]      r = max(p, q + 1)
//! x[t+1] = T · x[t] + √σ²·ψ · ε[t+1]
//! y[t]   = x[t][0]
//! ```
//!
//! `T` shifts the state up by one and its last row holds the AR
//! coefficients `φ_k` at column `r - k`. The noise loading is the first `r`
//! ψ-weights, so `V = σ²·ψψᵀ` and the measurement is the first unit vector.

use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, ArrayViewMut2, Axis};

use crate::error::ArimaError;
use crate::model::ArimaModel;

/// State-space form of a stationary ARMA model.
#[derive(Clone, Debug, PartialEq)]
pub struct ArmaStateSpace {
    r: usize,
    /// `φ_1..φ_r` of `y_t = Σ φ_k·y_{t-k} + …`, zero padded.
    phi: Vec<f64>,
    psi: Array1<f64>,
    var: f64,
    p0: Array2<f64>,
}

impl ArmaStateSpace {
    /// Builds the representation of a model without unit roots.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArimaError::UnitRoots`] | the model has a differencing polynomial |
    /// | [`ArimaError::NonStationary`] | the AR polynomial is not stable |
    pub fn new(model: &ArimaModel) -> Result<Self, ArimaError> {
        if !model.is_stationary_model() {
            return Err(ArimaError::UnitRoots {
                degree: model.differencing_order(),
            });
        }
        let p = model.ar().degree();
        let q = model.ma().degree();
        let r = p.max(q + 1);
        let var = model.innovation_variance();
        let gamma = model.autocovariances(r)?;
        let psi = Array1::from(model.psi_weights(r));
        let phi: Vec<f64> = (1..=r).map(|k| -model.ar().get(k)).collect();

        let mut p0 = Array2::zeros((r, r));
        for i in 0..r {
            for j in i..r {
                let h = j - i;
                let known: f64 = (0..i).map(|k| psi[k] * psi[k + h]).sum();
                let v = gamma[h] - var * known;
                p0[[i, j]] = v;
                p0[[j, i]] = v;
            }
        }
        Ok(Self {
            r,
            phi,
            psi,
            var,
            p0,
        })
    }

    /// State dimension `r`.
    pub fn dim(&self) -> usize {
        self.r
    }

    /// Last-row transition coefficients `φ_1..φ_r`.
    pub fn phi(&self) -> &[f64] {
        &self.phi
    }

    /// ψ-weights `ψ_0..ψ_{r-1}`.
    pub fn psi(&self) -> ArrayView1<'_, f64> {
        self.psi.view()
    }

    /// Innovation variance `σ²`.
    pub fn innovation_variance(&self) -> f64 {
        self.var
    }

    /// Unconditional covariance of the initial state.
    pub fn initial_covariance(&self) -> &Array2<f64> {
        &self.p0
    }

    /// Dense transition matrix.
    pub fn transition_matrix(&self) -> Array2<f64> {
        let r = self.r;
        let mut t = Array2::zeros((r, r));
        for i in 0..r - 1 {
            t[[i, i + 1]] = 1.0;
        }
        for k in 1..=r {
            t[[r - 1, r - k]] = self.phi[k - 1];
        }
        t
    }

    /// `x ← T·x`.
    pub fn tx(&self, mut x: ArrayViewMut1<'_, f64>) {
        let r = self.r;
        let last: f64 = (1..=r).map(|k| self.phi[k - 1] * x[r - k]).sum();
        for i in 0..r - 1 {
            x[i] = x[i + 1];
        }
        x[r - 1] = last;
    }

    /// `x ← Tᵀ·x` (the row vector `x'T`).
    pub fn xt(&self, mut x: ArrayViewMut1<'_, f64>) {
        let r = self.r;
        let tail = x[r - 1];
        for j in (1..r).rev() {
            x[j] = x[j - 1] + tail * self.phi[r - j - 1];
        }
        x[0] = tail * self.phi[r - 1];
    }

    /// `P ← T·P·Tᵀ`.
    pub fn tvt(&self, mut p: ArrayViewMut2<'_, f64>) {
        for col in p.axis_iter_mut(Axis(1)) {
            self.tx(col);
        }
        for row in p.axis_iter_mut(Axis(0)) {
            self.tx(row);
        }
    }

    /// `P ← P + σ²·ψψᵀ`.
    pub fn add_v(&self, mut p: ArrayViewMut2<'_, f64>) {
        for i in 0..self.r {
            for j in 0..self.r {
                p[[i, j]] += self.var * self.psi[i] * self.psi[j];
            }
        }
    }
}
