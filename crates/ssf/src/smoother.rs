//! Fixed-interval state smoother (de Jong 1989).
//!
//! Backward recursions over the output of an [`OrdinaryFilter`] run with
//! state storage, `r_{n-1} = 0`, `N_{n-1} = 0`:
//!
//! ```text
//! u = Tᵀ·r_t,  W = Tᵀ·N_t·T,  c = Z·P_t,  g = W·cᵀ
//! r_{t-1} = u + Zᵀ·(e_t - c·u) / f_t
//! N_{t-1} = W + ZᵀZ·(1/f_t + c·W·cᵀ/f_t²) - (Zᵀgᵀ + g·Z) / f_t
//! â_t = a_t + P_t·r_{t-1},   V_t = P_t - P_t·N_{t-1}·P_t
//! ```

use ndarray::{Array1, Array2, ArrayView1};
use tracing::instrument;

use crate::error::SsfError;
use crate::filter::{FilterResults, OrdinaryFilter};
use crate::model::StateSpaceModel;
use crate::state::StepKind;

/// Smoothed states `E[α_t | y]` and their variances.
#[derive(Clone, Debug)]
pub struct SmoothingResults {
    a: Vec<Array1<f64>>,
    v: Vec<Array2<f64>>,
}

impl SmoothingResults {
    /// Number of periods.
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// Returns `true` for an empty series.
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Smoothed state at `t`.
    pub fn state(&self, t: usize) -> &Array1<f64> {
        &self.a[t]
    }

    /// Smoothed state variance at `t`.
    pub fn variance(&self, t: usize) -> &Array2<f64> {
        &self.v[t]
    }

    /// Smoothed signal `Z_t·â_t` and its variance `Z_t·V_t·Z_tᵀ`.
    pub fn signal<M: StateSpaceModel + ?Sized>(&self, model: &M, t: usize) -> (f64, f64) {
        (
            model.zx(t, self.a[t].view()),
            model.zvz(t, self.v[t].view()),
        )
    }
}

/// Fixed-interval smoother for proper models.
#[derive(Clone, Debug, Default)]
pub struct Smoother {
    filter: OrdinaryFilter,
}

impl Smoother {
    /// Creates a smoother using `filter` for the forward pass.
    pub fn new(filter: OrdinaryFilter) -> Self {
        Self { filter }
    }

    /// Filters and smooths `y`.
    ///
    /// # Errors
    ///
    /// [`SsfError::DiffuseInitialization`] for diffuse models, otherwise the
    /// errors of [`OrdinaryFilter::filter`].
    #[instrument(skip_all, fields(n = y.len()))]
    pub fn smooth<M: StateSpaceModel + ?Sized>(
        &self,
        model: &M,
        y: ArrayView1<'_, f64>,
    ) -> Result<SmoothingResults, SsfError> {
        if model.is_diffuse() {
            return Err(SsfError::DiffuseInitialization {
                operation: "smoothing",
            });
        }
        let filtered = self
            .filter
            .clone()
            .with_state_storage(true)
            .filter(model, y)?;
        Ok(Self::backward(model, &filtered))
    }

    fn backward<M: StateSpaceModel + ?Sized>(
        model: &M,
        filtered: &FilterResults,
    ) -> SmoothingResults {
        let states = filtered.states().unwrap_or(&[]);
        let n = states.len();
        let dim = model.dim();
        let mut r = Array1::zeros(dim);
        let mut nmat = Array2::zeros((dim, dim));
        let mut c = Array1::zeros(dim);
        let mut z = Array1::zeros(dim);
        let mut a = vec![Array1::zeros(0); n];
        let mut v = vec![Array2::zeros((0, 0)); n];

        for t in (0..n).rev() {
            let state = &states[t];
            let pe = filtered.errors()[t];
            model.xt(t, r.view_mut());
            model.tnt(t, nmat.view_mut());
            if pe.kind() == StepKind::Observed {
                let f = pe.f();
                model.zm(t, state.p().view(), c.view_mut());
                let cu = c.dot(&r);
                model.xpzd(t, r.view_mut(), (pe.e() - cu) / f);

                let g = nmat.dot(&c);
                let cwc = c.dot(&g);
                model.vpzdz(t, nmat.view_mut(), 1.0 / f + cwc / (f * f));
                z.fill(0.0);
                model.z(t, z.view_mut());
                for i in 0..dim {
                    for j in 0..dim {
                        nmat[[i, j]] -= (z[i] * g[j] + g[i] * z[j]) / f;
                    }
                }
            }
            let p = state.p();
            a[t] = state.a() + &p.dot(&r);
            v[t] = p - &p.dot(&nmat).dot(p);
        }
        SmoothingResults { a, v }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Measurement;
    use crate::ssf::Ssf;
    use approx::assert_abs_diff_eq;
    use kalmar_arima::{ArimaModel, Polynomial};
    use ndarray::array;

    #[test]
    fn ar1_interpolation_closed_form() {
        // E[y_1 | y_0, y_2] = φ(y_0 + y_2) / (1 + φ²), variance σ² / (1 + φ²).
        let phi: f64 = 0.6;
        let ssf = Ssf::arma(
            &ArimaModel::arma(Polynomial::from_lags(&[-phi]), Polynomial::one(), 1.0).unwrap(),
        )
        .unwrap();
        let y = array![1.0, f64::NAN, -0.5];
        let sm = Smoother::default().smooth(&ssf, y.view()).unwrap();
        let (m, var) = sm.signal(&ssf, 1);
        assert_abs_diff_eq!(m, phi * (1.0 - 0.5) / (1.0 + phi * phi), epsilon = 1e-12);
        assert_abs_diff_eq!(var, 1.0 / (1.0 + phi * phi), epsilon = 1e-12);
        // Observed points are reproduced exactly.
        let (m0, v0) = sm.signal(&ssf, 0);
        assert_abs_diff_eq!(m0, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v0, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn last_state_equals_filtered_state() {
        let ssf = Ssf::composite(vec![
            Ssf::arma(
                &ArimaModel::arma(Polynomial::from_lags(&[-0.8]), Polynomial::one(), 1.0)
                    .unwrap(),
            )
            .unwrap(),
            Ssf::noise(0.5).unwrap(),
        ])
        .unwrap();
        let y = array![0.4, 1.2, -0.3, 0.8];
        let sm = Smoother::default().smooth(&ssf, y.view()).unwrap();
        assert_eq!(sm.len(), 4);
        // At the last step the smoothed state is the filtered (updated) one.
        let res = OrdinaryFilter::new()
            .with_state_storage(true)
            .filter(&ssf, y.view())
            .unwrap();
        let last = &res.states().unwrap()[3];
        let pe = res.errors()[3];
        let mut c = Array1::zeros(2);
        ssf.zm(3, last.p().view(), c.view_mut());
        let updated = last.a() + &(&c * (pe.e() / pe.f()));
        for (x, y) in sm.state(3).iter().zip(updated.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn diffuse_models_are_rejected() {
        let ssf = Ssf::local_level(1.0).unwrap();
        assert!(matches!(
            Smoother::default().smooth(&ssf, array![1.0].view()),
            Err(SsfError::DiffuseInitialization { .. })
        ));
    }
}
