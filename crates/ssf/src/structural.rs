//! Unobserved components: white noise, local level, local linear trend and
//! dummy seasonal.
//!
//! None of them carries measurement noise; an irregular is added by
//! stacking a [`Noise`] component in a composite model.

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::error::SsfError;
use crate::model::{Dynamics, Initialization, Measurement};

fn check_variance(var: f64) -> Result<f64, SsfError> {
    if !var.is_finite() || var < 0.0 {
        return Err(SsfError::InvalidVariance(var));
    }
    Ok(var)
}

/// White noise `y_t = ε_t`, `Var(ε_t) = var`, carried as a one-dimensional
/// state with zero transition.
#[derive(Clone, Debug, PartialEq)]
pub struct Noise {
    var: f64,
}

impl Noise {
    /// Creates a noise component.
    pub fn new(var: f64) -> Result<Self, SsfError> {
        Ok(Self {
            var: check_variance(var)?,
        })
    }

    /// Variance of the noise.
    pub fn variance(&self) -> f64 {
        self.var
    }
}

impl Initialization for Noise {
    fn dim(&self) -> usize {
        1
    }

    fn diffuse_dim(&self) -> usize {
        0
    }

    fn a0(&self, _a: ArrayViewMut1<'_, f64>) {}

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] = self.var;
    }

    fn diffuse_constraints(&self, _b: ArrayViewMut2<'_, f64>) {}
}

impl Dynamics for Noise {
    fn state_dim(&self) -> usize {
        1
    }

    fn innovations_dim(&self) -> usize {
        1
    }

    fn s(&self, _t: usize, mut s: ArrayViewMut2<'_, f64>) {
        s[[0, 0]] = self.var.sqrt();
    }

    fn tx(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>) {
        x[0] = 0.0;
    }

    fn xt(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>) {
        x[0] = 0.0;
    }

    fn add_v(&self, _t: usize, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] += self.var;
    }
}

/// Random walk `μ_{t+1} = μ_t + η_t`, observed without noise, diffuse at
/// `t = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalLevel {
    var: f64,
}

impl LocalLevel {
    /// Creates a local level with level-disturbance variance `var`.
    pub fn new(var: f64) -> Result<Self, SsfError> {
        Ok(Self {
            var: check_variance(var)?,
        })
    }
}

impl Initialization for LocalLevel {
    fn dim(&self) -> usize {
        1
    }

    fn diffuse_dim(&self) -> usize {
        1
    }

    fn a0(&self, _a: ArrayViewMut1<'_, f64>) {}

    fn pf0(&self, _p: ArrayViewMut2<'_, f64>) {}

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        b[[0, 0]] = 1.0;
    }
}

impl Dynamics for LocalLevel {
    fn state_dim(&self) -> usize {
        1
    }

    fn innovations_dim(&self) -> usize {
        1
    }

    fn has_innovations(&self, _t: usize) -> bool {
        self.var > 0.0
    }

    fn s(&self, _t: usize, mut s: ArrayViewMut2<'_, f64>) {
        s[[0, 0]] = self.var.sqrt();
    }

    fn tx(&self, _t: usize, _x: ArrayViewMut1<'_, f64>) {}

    fn xt(&self, _t: usize, _x: ArrayViewMut1<'_, f64>) {}

    fn add_v(&self, _t: usize, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] += self.var;
    }

    fn tvt(&self, _t: usize, _p: ArrayViewMut2<'_, f64>) {}
}

/// Local linear trend
///
/// ```text
/// μ_{t+1} = μ_t + β_t + η_t,   Var(η) = level_var
/// β_{t+1} = β_t + ζ_t,         Var(ζ) = slope_var
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LocalLinearTrend {
    level_var: f64,
    slope_var: f64,
}

impl LocalLinearTrend {
    /// Creates a trend with the given disturbance variances.
    pub fn new(level_var: f64, slope_var: f64) -> Result<Self, SsfError> {
        Ok(Self {
            level_var: check_variance(level_var)?,
            slope_var: check_variance(slope_var)?,
        })
    }
}

impl Initialization for LocalLinearTrend {
    fn dim(&self) -> usize {
        2
    }

    fn diffuse_dim(&self) -> usize {
        2
    }

    fn a0(&self, _a: ArrayViewMut1<'_, f64>) {}

    fn pf0(&self, _p: ArrayViewMut2<'_, f64>) {}

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        b[[0, 0]] = 1.0;
        b[[1, 1]] = 1.0;
    }
}

impl Dynamics for LocalLinearTrend {
    fn state_dim(&self) -> usize {
        2
    }

    fn innovations_dim(&self) -> usize {
        2
    }

    fn s(&self, _t: usize, mut s: ArrayViewMut2<'_, f64>) {
        s[[0, 0]] = self.level_var.sqrt();
        s[[1, 1]] = self.slope_var.sqrt();
    }

    fn tx(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>) {
        x[0] += x[1];
    }

    fn xt(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>) {
        x[1] += x[0];
    }

    fn add_v(&self, _t: usize, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] += self.level_var;
        p[[1, 1]] += self.slope_var;
    }
}

/// Dummy seasonal: `γ_{t+1} = -(γ_t + … + γ_{t-s+2}) + ω_t`.
///
/// The state holds the last `s - 1` seasonal effects, all diffuse at
/// `t = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct Seasonal {
    period: usize,
    var: f64,
}

impl Seasonal {
    /// Creates a dummy seasonal of the given period.
    pub fn new(period: usize, var: f64) -> Result<Self, SsfError> {
        if period < 2 {
            return Err(SsfError::InvalidPeriod(period));
        }
        Ok(Self {
            period,
            var: check_variance(var)?,
        })
    }

    /// Seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }
}

impl Initialization for Seasonal {
    fn dim(&self) -> usize {
        self.period - 1
    }

    fn diffuse_dim(&self) -> usize {
        self.period - 1
    }

    fn a0(&self, _a: ArrayViewMut1<'_, f64>) {}

    fn pf0(&self, _p: ArrayViewMut2<'_, f64>) {}

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        for i in 0..self.period - 1 {
            b[[i, i]] = 1.0;
        }
    }
}

impl Dynamics for Seasonal {
    fn state_dim(&self) -> usize {
        self.period - 1
    }

    fn innovations_dim(&self) -> usize {
        1
    }

    fn s(&self, _t: usize, mut s: ArrayViewMut2<'_, f64>) {
        s[[0, 0]] = self.var.sqrt();
    }

    fn tx(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>) {
        let n = x.len();
        let first = -x.sum();
        for i in (1..n).rev() {
            x[i] = x[i - 1];
        }
        x[0] = first;
    }

    fn xt(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>) {
        let n = x.len();
        let head = x[0];
        for j in 0..n - 1 {
            x[j] = x[j + 1] - head;
        }
        x[n - 1] = -head;
    }

    fn add_v(&self, _t: usize, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] += self.var;
    }
}

macro_rules! first_element_measurement {
    ($($ty:ty),*) => {$(
        impl Measurement for $ty {
            fn loading_dim(&self) -> usize {
                Initialization::dim(self)
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
    )*};
}

first_element_measurement!(Noise, LocalLevel, LocalLinearTrend, Seasonal);
