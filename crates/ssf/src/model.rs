//! Capability traits of a linear Gaussian state-space model.
//!
//! ```text
//! y_t     = Z_t·α_t + ε_t,        ε_t ~ N(0, h_t)
//! α_{t+1} = T_t·α_t + S_t·η_t,    η_t ~ N(0, I)
//! α_0     ~ N(a_0, P_f0 + κ·B·Bᵀ),  κ → ∞
//! ```
//!
//! Operators are applied through views; implementations never hold on to
//! a view beyond the call that receives it. Writes through an
//! `ArrayViewMut*` are the result of the operation; views that only
//! receive output (`a0`, `pf0`, `z`, …) are zero on entry.

use kalmar_linalg::add_outer;
use ndarray::{Array1, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis};

use crate::error::SsfError;

/// Distribution of the initial state.
pub trait Initialization {
    /// State dimension.
    fn dim(&self) -> usize;

    /// Number of diffuse directions (columns of `B`).
    fn diffuse_dim(&self) -> usize;

    /// Writes the initial mean `a_0`.
    fn a0(&self, a: ArrayViewMut1<'_, f64>);

    /// Writes the finite part `P_f0` of the initial covariance.
    fn pf0(&self, p: ArrayViewMut2<'_, f64>);

    /// Writes the diffuse constraints `B` (dim × diffuse_dim).
    fn diffuse_constraints(&self, b: ArrayViewMut2<'_, f64>);

    /// Returns `true` if some direction has unbounded initial variance.
    fn is_diffuse(&self) -> bool {
        self.diffuse_dim() > 0
    }
}

/// State transition and state noise.
pub trait Dynamics {
    /// Dimension of the state the transition acts on.
    fn state_dim(&self) -> usize;

    /// Returns `true` if `T`, `V` do not depend on `t`.
    fn is_time_invariant(&self) -> bool {
        true
    }

    /// Number of columns of `S`.
    fn innovations_dim(&self) -> usize;

    /// Returns `true` if state noise enters at `t`.
    fn has_innovations(&self, _t: usize) -> bool {
        self.innovations_dim() > 0
    }

    /// Writes `V_t = S_t·S_tᵀ`.
    fn v(&self, t: usize, mut v: ArrayViewMut2<'_, f64>) {
        self.add_v(t, v.view_mut());
    }

    /// Writes `S_t` (state_dim × innovations_dim).
    fn s(&self, t: usize, s: ArrayViewMut2<'_, f64>);

    /// `x ← T_t·x`.
    fn tx(&self, t: usize, x: ArrayViewMut1<'_, f64>);

    /// `x ← T_tᵀ·x`.
    fn xt(&self, t: usize, x: ArrayViewMut1<'_, f64>);

    /// `P ← P + V_t`.
    fn add_v(&self, t: usize, p: ArrayViewMut2<'_, f64>);

    /// `M ← T_t·M`, column by column.
    fn tm(&self, t: usize, mut m: ArrayViewMut2<'_, f64>) {
        for col in m.axis_iter_mut(Axis(1)) {
            self.tx(t, col);
        }
    }

    /// `P ← T_t·P·T_tᵀ`.
    fn tvt(&self, t: usize, mut p: ArrayViewMut2<'_, f64>) {
        self.tm(t, p.view_mut());
        for row in p.axis_iter_mut(Axis(0)) {
            self.tx(t, row);
        }
    }

    /// `N ← T_tᵀ·N·T_t`.
    fn tnt(&self, t: usize, mut n: ArrayViewMut2<'_, f64>) {
        for col in n.axis_iter_mut(Axis(1)) {
            self.xt(t, col);
        }
        for row in n.axis_iter_mut(Axis(0)) {
            self.xt(t, row);
        }
    }
}

/// Loading of the state on the observation.
///
/// Only [`z`](Self::z), [`zx`](Self::zx) and
/// [`error_variance`](Self::error_variance) are required. Sparse loadings
/// override the other operations so the row `Z_t` is never materialized.
pub trait Measurement {
    /// Dimension of the state the loading acts on.
    fn loading_dim(&self) -> usize;

    /// Returns `true` if `Z`, `h` do not depend on `t`.
    fn is_time_invariant(&self) -> bool {
        true
    }

    /// Number of periods the measurement is defined for (`None` if
    /// unbounded).
    fn observation_capacity(&self) -> Option<usize> {
        None
    }

    /// Writes `Z_t`.
    fn z(&self, t: usize, z: ArrayViewMut1<'_, f64>);

    /// `Z_t·x`.
    fn zx(&self, t: usize, x: ArrayView1<'_, f64>) -> f64;

    /// `Z_t·M`, one value per column.
    fn zm(&self, t: usize, m: ArrayView2<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        for (o, col) in out.iter_mut().zip(m.axis_iter(Axis(1))) {
            *o = self.zx(t, col);
        }
    }

    /// `Z_t·V·Z_tᵀ` for a symmetric `V`.
    fn zvz(&self, t: usize, v: ArrayView2<'_, f64>) -> f64 {
        let mut zv = Array1::zeros(v.ncols());
        self.zm(t, v, zv.view_mut());
        self.zx(t, zv.view())
    }

    /// `V ← V + d·Z_tᵀ·Z_t`.
    fn vpzdz(&self, t: usize, v: ArrayViewMut2<'_, f64>, d: f64) {
        let mut z = Array1::zeros(self.loading_dim());
        self.z(t, z.view_mut());
        add_outer(v, z.view(), d);
    }

    /// `x ← x + d·Z_tᵀ`.
    fn xpzd(&self, t: usize, mut x: ArrayViewMut1<'_, f64>, d: f64) {
        let mut z = Array1::zeros(self.loading_dim());
        self.z(t, z.view_mut());
        x.scaled_add(d, &z);
    }

    /// Returns `true` if the observation carries its own noise at `t`.
    fn has_error(&self, t: usize) -> bool {
        self.error_variance(t) > 0.0
    }

    /// Variance `h_t` of the observation noise.
    fn error_variance(&self, t: usize) -> f64;
}

/// A complete state-space model.
pub trait StateSpaceModel: Initialization + Dynamics + Measurement {
    /// Checks that the three parts agree on the state dimension.
    ///
    /// # Errors
    ///
    /// [`SsfError::DimensionMismatch`] naming the part that disagrees.
    fn check(&self) -> Result<(), SsfError> {
        let dim = self.dim();
        if self.state_dim() != dim {
            return Err(SsfError::DimensionMismatch {
                what: "dynamics",
                expected: dim,
                got: self.state_dim(),
            });
        }
        if self.loading_dim() != dim {
            return Err(SsfError::DimensionMismatch {
                what: "measurement",
                expected: dim,
                got: self.loading_dim(),
            });
        }
        if self.diffuse_dim() > dim {
            return Err(SsfError::DimensionMismatch {
                what: "diffuse constraints",
                expected: dim,
                got: self.diffuse_dim(),
            });
        }
        Ok(())
    }

    /// Checks that a series of length `n` can be filtered.
    fn check_length(&self, n: usize) -> Result<(), SsfError> {
        match self.observation_capacity() {
            Some(capacity) if capacity < n => Err(SsfError::ObservationCapacity {
                capacity,
                requested: n,
            }),
            _ => Ok(()),
        }
    }
}

impl<M: Initialization + Dynamics + Measurement + ?Sized> StateSpaceModel for M {}
