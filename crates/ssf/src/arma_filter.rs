//! ARMA whitening through the generic state-space recursion.

use kalmar_arima::{ArimaError, ArimaModel, ArmaFilter};
use ndarray::{Array1, ArrayView1, ArrayViewMut1};

use crate::arma::ArmaSsf;
use crate::error::SsfError;
use crate::filter::{ZERO_VARIANCE_TOLERANCE, ordinary_step};
use crate::state::{State, StepKind};

/// [`ArmaFilter`] running the ordinary Kalman filter on [`ArmaSsf`].
///
/// Slower than [`kalmar_arima::KalmanArmaFilter`] (the covariance is
/// propagated on every call) and used as its reference.
#[derive(Clone, Debug, Default)]
pub struct SsfArmaFilter {
    prepared: Option<(ArmaSsf, usize, f64)>,
}

impl SsfArmaFilter {
    /// Creates an unprepared filter.
    pub fn new() -> Self {
        Self::default()
    }

    fn run(
        ssf: &ArmaSsf,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
    ) -> Result<f64, SsfError> {
        let mut state = State::initial(ssf);
        let mut c = Array1::zeros(state.dim());
        let mut ldet = 0.0;
        for (t, &y) in input.iter().enumerate() {
            let pe = ordinary_step(ssf, t, y, &mut state, ZERO_VARIANCE_TOLERANCE, &mut c)?;
            output[t] = pe.standardized();
            if pe.kind() == StepKind::Observed {
                ldet += pe.f().ln();
            }
        }
        Ok(ldet)
    }
}

fn to_arima_error(err: SsfError) -> ArimaError {
    match err {
        SsfError::Arima(e) => e,
        SsfError::Linalg(e) => ArimaError::Linalg(e),
        _ => ArimaError::NonStationary,
    }
}

impl ArmaFilter for SsfArmaFilter {
    fn prepare(&mut self, model: &ArimaModel, n: usize) -> Result<usize, ArimaError> {
        self.prepared = None;
        let ssf = ArmaSsf::new(model).map_err(to_arima_error)?;
        // Prediction variances do not depend on the data.
        let zeros = Array1::zeros(n);
        let mut out = Array1::zeros(n);
        let ldet = Self::run(&ssf, zeros.view(), out.view_mut()).map_err(to_arima_error)?;
        self.prepared = Some((ssf, n, ldet));
        Ok(n)
    }

    fn apply(
        &self,
        input: ArrayView1<'_, f64>,
        output: ArrayViewMut1<'_, f64>,
    ) -> Result<(), ArimaError> {
        let (ssf, n, _) = self.prepared.as_ref().ok_or(ArimaError::NotPrepared)?;
        if input.len() != *n || output.len() != *n {
            return Err(ArimaError::LengthMismatch {
                expected: *n,
                got: input.len().min(output.len()),
            });
        }
        Self::run(ssf, input, output).map_err(to_arima_error)?;
        Ok(())
    }

    fn log_determinant(&self) -> f64 {
        self.prepared.as_ref().map_or(0.0, |(_, _, ldet)| *ldet)
    }
}
