//! Augmented (de Jong) Kalman filter for diffuse initial conditions.
//!
//! The initial state is `a_0 + B·δ` with `δ` of unbounded variance. Along
//! with `(a_t, P_t)` the filter carries `A_t`, the response of the state to
//! `δ`, so that the prediction error is `e_t - E_t·δ` with `E_t = Z_t·A_t`.
//! Each step folds the row `[E_t, e_t] / √f_t` into an upper-triangular
//! factor
//!
//! ```text
//! R = | R_d  r |      R_dᵀR_d = Σ E_tᵀE_t / f_t,   R_dᵀr = Σ E_tᵀe_t / f_t
//!     |  0   ρ |      ρ² = Σ e_t²/f_t - rᵀr
//! ```
//!
//! Once `R_d` is numerically non-singular, `δ̂ = R_d⁻¹·r` and its variance
//! `(R_dᵀR_d)⁻¹` are folded into `(a, P)` and the recursion becomes an
//! ordinary filter (collapse). A zero finite variance with a non-zero `E_t`
//! is an exact linear constraint on `δ`; it removes one direction from the
//! diffuse part outright.

use kalmar_linalg::{
    DEFAULT_RANK_TOLERANCE, Qr, add_outer, invert_upper, solve_upper, symmetrize,
    triangularize_row,
};
use ndarray::{Array1, Array2, ArrayView1, Axis, s};
use tracing::{debug, instrument, trace};

use crate::error::SsfError;
use crate::filter::{
    DEGENERATE_RESIDUAL, FilterResults, ZERO_VARIANCE_TOLERANCE, ordinary_step, predict,
};
use crate::likelihood::LikelihoodAccumulator;
use crate::model::StateSpaceModel;
use crate::state::{PredictionError, State, StepKind};

/// Default relative pivot size at which the diffuse part is identified.
pub const DEFAULT_COLLAPSE_TOLERANCE: f64 = 1e-9;

/// How the diffuse part is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiffuseStrategy {
    /// Collapse to an ordinary filter at the first step where every diffuse
    /// direction is identified.
    #[default]
    Collapsing,
    /// Accumulate until the end of the series and resolve the diffuse part
    /// from the final triangular factor.
    Augmented,
}

/// Configuration of the [`DiffuseFilter`].
#[derive(Clone, Debug, PartialEq)]
pub struct DiffuseConfig {
    strategy: DiffuseStrategy,
    collapse_tolerance: f64,
    zero_variance_tolerance: f64,
}

impl Default for DiffuseConfig {
    fn default() -> Self {
        Self {
            strategy: DiffuseStrategy::Collapsing,
            collapse_tolerance: DEFAULT_COLLAPSE_TOLERANCE,
            zero_variance_tolerance: ZERO_VARIANCE_TOLERANCE,
        }
    }
}

impl DiffuseConfig {
    /// Default configuration (collapsing strategy).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: DiffuseStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the relative pivot tolerance for identification.
    pub fn with_collapse_tolerance(mut self, tolerance: f64) -> Self {
        self.collapse_tolerance = tolerance;
        self
    }

    /// Sets the tolerance below which a prediction variance is zero.
    pub fn with_zero_variance_tolerance(mut self, tolerance: f64) -> Self {
        self.zero_variance_tolerance = tolerance;
        self
    }

    /// Strategy.
    pub fn strategy(&self) -> DiffuseStrategy {
        self.strategy
    }

    /// Relative pivot tolerance.
    pub fn collapse_tolerance(&self) -> f64 {
        self.collapse_tolerance
    }

    /// Zero-variance tolerance.
    pub fn zero_variance_tolerance(&self) -> f64 {
        self.zero_variance_tolerance
    }

    /// Checks that both tolerances lie in `(0, 1)`.
    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [
            ("collapse_tolerance", self.collapse_tolerance),
            ("zero_variance_tolerance", self.zero_variance_tolerance),
        ] {
            if !(v > 0.0 && v < 1.0) {
                return Err(format!("{name} must be in (0, 1), got {v}"));
            }
        }
        Ok(())
    }
}

/// Diffuse part of the augmented state.
struct Augmentation {
    /// `A_t` (dim × nd).
    a: Array2<f64>,
    /// `[R_d r; 0 ρ]`, (nd + 1) × (nd + 1).
    r: Array2<f64>,
    /// `Σ ln ‖E_t‖²` over exact constraints.
    exact_correction: f64,
}

impl Augmentation {
    fn nd(&self) -> usize {
        self.a.ncols()
    }

    /// Every pivot of `R_d` is large relative to its column.
    fn is_identified(&self, tolerance: f64) -> bool {
        let nd = self.nd();
        (0..nd).all(|i| {
            let col = self.r.slice(s![..=i, i]);
            let norm = col.dot(&col).sqrt();
            let pivot = self.r[[i, i]];
            norm > 0.0 && pivot > tolerance * norm
        })
    }

    /// Regular update with finite variance `f > 0`.
    fn update(&mut self, state: &mut State, c: ArrayView1<'_, f64>, e: f64, f: f64, ee: &Array1<f64>) {
        state.a.scaled_add(e / f, &c);
        add_outer(state.p.view_mut(), c, -1.0 / f);
        let nd = self.nd();
        for i in 0..c.len() {
            let ki = c[i] / f;
            if ki == 0.0 {
                continue;
            }
            for j in 0..nd {
                self.a[[i, j]] -= ki * ee[j];
            }
        }
        let sf = f.sqrt();
        let mut row = Array1::zeros(nd + 1);
        row.slice_mut(s![..nd]).assign(&(ee / sf));
        row[nd] = e / sf;
        triangularize_row(self.r.view_mut(), row.view_mut());
    }

    /// Exact constraint `E·δ = e` with `‖E‖² = q2 > 0`.
    fn constrain(&mut self, state: &mut State, e: f64, ee: &Array1<f64>, q2: f64) {
        let nd = self.nd();
        let q = q2.sqrt();
        let u = ee / q;
        let mu = e / q;

        // Householder reflector H with H·u = ±e₁; columns 1.. of H span u⊥.
        let mut w = u.clone();
        w[0] += if u[0] >= 0.0 { 1.0 } else { -1.0 };
        let ww = w.dot(&w);
        let mut h = Array2::<f64>::eye(nd);
        add_outer(h.view_mut(), w.view(), -2.0 / ww);
        let basis = h.slice(s![.., 1..]);

        state.a.scaled_add(mu, &self.a.dot(&u));

        let rd = self.r.slice(s![..nd, ..nd]);
        let mut rows = Array2::zeros((nd, nd));
        rows.slice_mut(s![.., ..nd - 1]).assign(&rd.dot(&basis));
        let shifted = &self.r.slice(s![..nd, nd]) - &(rd.dot(&u) * mu);
        rows.column_mut(nd - 1).assign(&shifted);
        let rho = self.r[[nd, nd]];

        let mut r = Array2::zeros((nd, nd));
        for mut row in rows.axis_iter(Axis(0)).map(|row| row.to_owned()) {
            triangularize_row(r.view_mut(), row.view_mut());
        }
        let mut last = Array1::zeros(nd);
        last[nd - 1] = rho;
        triangularize_row(r.view_mut(), last.view_mut());

        self.a = self.a.dot(&basis);
        self.r = r;
        self.exact_correction += q2.ln();
    }

    /// Folds `δ̂` and its variance into the state; returns `(ρ², dcorr)`.
    fn collapse(&self, state: &mut State) -> Result<(f64, f64), SsfError> {
        let nd = self.nd();
        let rd = self.r.slice(s![..nd, ..nd]);
        let mut delta = self.r.slice(s![..nd, nd]).to_owned();
        solve_upper(rd, delta.view_mut())?;
        state.a += &self.a.dot(&delta);
        let ar = self.a.dot(&invert_upper(rd)?);
        state.p += &ar.dot(&ar.t());
        symmetrize(state.p.view_mut());
        let dcorr: f64 = (0..nd).map(|i| 2.0 * self.r[[i, i]].ln()).sum();
        Ok((self.r[[nd, nd]].powi(2), self.exact_correction + dcorr))
    }

    /// Resolves a diffuse part that was never collapsed; returns
    /// `(ssq, dcorr, rank)`.
    fn resolve(&self, tolerance: f64) -> Result<(f64, f64, usize), SsfError> {
        let nd = self.nd();
        let rd = self.r.slice(s![..nd, ..nd]);
        let qr = Qr::decompose(rd, tolerance);
        let ls = qr.least_squares(self.r.slice(s![..nd, nd]))?;
        let rho = self.r[[nd, nd]];
        let dcorr: f64 = qr
            .rdiagonal()
            .iter()
            .map(|d| 2.0 * d.abs().ln())
            .sum();
        Ok((rho * rho + ls.ssq(), self.exact_correction + dcorr, qr.rank()))
    }
}

/// Kalman filter for models with diffuse initial conditions.
///
/// Proper models run through the same code path without augmentation.
#[derive(Clone, Debug, Default)]
pub struct DiffuseFilter {
    config: DiffuseConfig,
}

impl DiffuseFilter {
    /// Creates a filter.
    pub fn new(config: DiffuseConfig) -> Self {
        Self { config }
    }

    /// The configuration.
    pub fn config(&self) -> &DiffuseConfig {
        &self.config
    }

    /// Runs the filter on `y` (NaN marks a missing value).
    ///
    /// # Errors
    ///
    /// Model-contract errors, [`SsfError::NoObservations`] if a diffuse
    /// model sees no usable observation, [`SsfError::NoDegreesOfFreedom`]
    /// if the identified diffuse directions consume every observation, and
    /// the numerical failures of the recursion.
    #[instrument(skip_all, fields(n = y.len(), strategy = ?self.config.strategy))]
    pub fn filter<M: StateSpaceModel + ?Sized>(
        &self,
        model: &M,
        y: ArrayView1<'_, f64>,
    ) -> Result<FilterResults, SsfError> {
        model.check()?;
        model.check_length(y.len())?;
        let dim = model.dim();
        let tol = self.config.zero_variance_tolerance;
        let mut state = State::initial(model);
        let mut acc = LikelihoodAccumulator::new();
        let mut errors = Vec::with_capacity(y.len());
        let mut c = Array1::zeros(dim);

        let (mut aug, nd0) = self.initial_augmentation(model);
        let dropped_at_init = model.diffuse_dim() - nd0;
        let mut collapse = None;
        let mut nd_used = 0;
        let mut dcorr = 0.0;

        for (t, &yt) in y.iter().enumerate() {
            let Some(current) = aug.as_mut() else {
                let pe = ordinary_step(model, t, yt, &mut state, tol, &mut c)?;
                if pe.kind() == StepKind::Observed {
                    acc.add(pe.e(), pe.f());
                }
                errors.push(pe);
                continue;
            };

            let pe = if yt.is_nan() {
                PredictionError::missing()
            } else {
                if yt.is_infinite() {
                    return Err(SsfError::NonFiniteObservation { t });
                }
                let mut ee = Array1::zeros(current.nd());
                model.zm(t, current.a.view(), ee.view_mut());
                let f = model.zvz(t, state.p.view()) + model.error_variance(t);
                let e = yt - model.zx(t, state.a.view());
                if !f.is_finite() || f < -tol {
                    return Err(SsfError::NonPositiveVariance { t, f });
                }
                if f > tol {
                    model.zm(t, state.p.view(), c.view_mut());
                    current.update(&mut state, c.view(), e, f, &ee);
                    acc.add_variance(f);
                    PredictionError::new(e, f, StepKind::Diffuse)
                } else {
                    let q2 = ee.dot(&ee);
                    if q2 > tol {
                        current.constrain(&mut state, e, &ee, q2);
                        acc.count();
                        trace!(t, nd = current.nd(), "exact diffuse constraint");
                        PredictionError::new(e, f, StepKind::Diffuse)
                    } else if e.abs() <= DEGENERATE_RESIDUAL * (1.0 + yt.abs()) {
                        PredictionError::new(e, f, StepKind::Degenerate)
                    } else {
                        return Err(SsfError::DegenerateObservation { t, e });
                    }
                }
            };
            errors.push(pe);

            if self.config.strategy == DiffuseStrategy::Collapsing
                && pe.kind() == StepKind::Diffuse
                && current.is_identified(self.config.collapse_tolerance)
            {
                let (ssq, correction) = current.collapse(&mut state)?;
                acc.add_ssq(ssq);
                dcorr = correction;
                nd_used = nd0;
                collapse = Some(t);
                trace!(t, nd = nd0, "diffuse part collapsed");
                aug = None;
                predict(model, t, &mut state);
                continue;
            }
            predict(model, t, &mut state);
            model.tm(t, current.a.view_mut());
        }

        let mut dropped = dropped_at_init;
        if let Some(current) = aug {
            if acc.n() == 0 {
                return Err(SsfError::NoObservations { diffuse_dim: nd0 });
            }
            let (ssq, correction, rank) = current.resolve(self.config.collapse_tolerance)?;
            acc.add_ssq(ssq);
            dcorr = correction;
            let remaining = current.nd();
            nd_used = nd0 - (remaining - rank);
            dropped += remaining - rank;
        }
        if dropped > 0 {
            debug!(dropped, "diffuse directions not identified");
        }
        if acc.n() <= nd_used {
            return Err(SsfError::NoDegreesOfFreedom {
                n: acc.n(),
                diffuse_dim: nd_used,
            });
        }

        Ok(FilterResults {
            likelihood: acc.finish(nd_used, dcorr),
            errors,
            states: None,
            collapse,
            dropped,
        })
    }

    /// Orthonormal basis of the span of `B`; `None` for a proper model.
    fn initial_augmentation<M: StateSpaceModel + ?Sized>(
        &self,
        model: &M,
    ) -> (Option<Augmentation>, usize) {
        let nd = model.diffuse_dim();
        if nd == 0 {
            return (None, 0);
        }
        let mut b = Array2::zeros((model.dim(), nd));
        model.diffuse_constraints(b.view_mut());
        let q = Qr::decompose(b.view(), DEFAULT_RANK_TOLERANCE).thin_q();
        let rank = q.ncols();
        if rank == 0 {
            return (None, 0);
        }
        (
            Some(Augmentation {
                a: q,
                r: Array2::zeros((rank + 1, rank + 1)),
                exact_correction: 0.0,
            }),
            rank,
        )
    }
}
