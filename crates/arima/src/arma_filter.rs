//! Whitening filters for stationary ARMA processes.

use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, Axis};
use tracing::{debug, instrument};

use crate::error::ArimaError;
use crate::model::ArimaModel;
use crate::state_space::ArmaStateSpace;

/// A filter turning a stationary ARMA series into standardized innovations.
///
/// For `y ~ N(0, Σ)` with `Σ = L·Lᵀ`, [`apply`](Self::apply) computes
/// `L⁻¹·y`, and [`log_determinant`](Self::log_determinant) returns
/// `ln|Σ| = Σ ln f_t`.
///
/// A filter is prepared once per model and may then be applied to any
/// number of series of the prepared length (the response and each
/// regression column of a concentrated likelihood).
pub trait ArmaFilter: Send {
    /// Prepares the filter for `model` and `n` observations, returning the
    /// output length.
    fn prepare(&mut self, model: &ArimaModel, n: usize) -> Result<usize, ArimaError>;

    /// Writes the standardized innovations of `input` into `output`.
    fn apply(&self, input: ArrayView1<'_, f64>, output: ArrayViewMut1<'_, f64>)
    -> Result<(), ArimaError>;

    /// `Σ ln f_t` over the prepared length.
    fn log_determinant(&self) -> f64;
}

/// Relative distance to `σ²` at which the prediction variance is treated as
/// converged.
pub const STEADY_STATE_TOLERANCE: f64 = 1e-12;

#[derive(Clone, Debug)]
struct Prepared {
    ss: ArmaStateSpace,
    n: usize,
    /// Prediction variances `f_0..f_{k-1}`; `f_t = f_{k-1}` for `t ≥ k`.
    f: Vec<f64>,
    /// Gains `T·P_t·Z / f_t`, one row per stored step.
    gains: Array2<f64>,
    ldet: f64,
}

/// Fixed-state Kalman filter on the forecast-function representation.
///
/// Variances and gains depend only on the model, so they are computed once
/// in [`prepare`](ArmaFilter::prepare). Once `f_t` reaches `σ²` the filter
/// is in steady state and the last gain is reused.
#[derive(Clone, Debug, Default)]
pub struct KalmanArmaFilter {
    prepared: Option<Prepared>,
}

impl KalmanArmaFilter {
    /// Creates an unprepared filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps before the steady state (the prepared length if it
    /// was never reached).
    pub fn steady_state_position(&self) -> Option<usize> {
        self.prepared.as_ref().map(|p| p.f.len())
    }

    /// Prediction variance at step `t`.
    pub fn prediction_variance(&self, t: usize) -> Option<f64> {
        let p = self.prepared.as_ref()?;
        let last = p.f.len().checked_sub(1)?;
        Some(p.f[t.min(last)])
    }
}

impl ArmaFilter for KalmanArmaFilter {
    #[instrument(skip_all, fields(n = n))]
    fn prepare(&mut self, model: &ArimaModel, n: usize) -> Result<usize, ArimaError> {
        self.prepared = None;
        let ss = ArmaStateSpace::new(model)?;
        let r = ss.dim();
        let var = ss.innovation_variance();
        let mut p = ss.initial_covariance().clone();
        let mut f = Vec::new();
        let mut gains = Vec::new();
        let mut ldet = 0.0;

        for t in 0..n {
            let ft = p[[0, 0]];
            if !ft.is_finite() || ft <= 0.0 {
                return Err(ArimaError::NonStationary);
            }
            let mut k: Array1<f64> = p.column(0).to_owned();
            k /= ft;
            // P ← P - P·z·zᵀ·P / f
            let pz = p.column(0).to_owned();
            for i in 0..r {
                for j in 0..r {
                    p[[i, j]] -= pz[i] * pz[j] / ft;
                }
            }
            ss.tvt(p.view_mut());
            ss.add_v(p.view_mut());
            ss.tx(k.view_mut());

            f.push(ft);
            gains.push(k);
            if (ft - var).abs() <= STEADY_STATE_TOLERANCE * var {
                ldet += ft.ln() * (n - t) as f64;
                debug!(steady = t, "arma filter reached steady state");
                break;
            }
            ldet += ft.ln();
        }

        let mut g = Array2::zeros((gains.len(), r));
        for (mut row, k) in g.axis_iter_mut(Axis(0)).zip(&gains) {
            row.assign(k);
        }
        self.prepared = Some(Prepared {
            ss,
            n,
            f,
            gains: g,
            ldet,
        });
        Ok(n)
    }

    fn apply(
        &self,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
    ) -> Result<(), ArimaError> {
        let p = self.prepared.as_ref().ok_or(ArimaError::NotPrepared)?;
        if input.len() != p.n || output.len() != p.n {
            return Err(ArimaError::LengthMismatch {
                expected: p.n,
                got: input.len().min(output.len()),
            });
        }
        if p.n == 0 {
            return Ok(());
        }
        let last = p.f.len() - 1;
        let mut a = Array1::zeros(p.ss.dim());
        for t in 0..p.n {
            let s = t.min(last);
            let e = input[t] - a[0];
            output[t] = e / p.f[s].sqrt();
            p.ss.tx(a.view_mut());
            a.scaled_add(e, &p.gains.row(s));
        }
        Ok(())
    }

    fn log_determinant(&self) -> f64 {
        self.prepared.as_ref().map_or(0.0, |p| p.ldet)
    }
}
