//! Regression effects carried as extra state elements.

use kalmar_linalg::cholesky;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, s};

use crate::error::SsfError;
use crate::model::{Dynamics, Initialization, Measurement, StateSpaceModel};
use crate::ssf::Ssf;

/// Law of motion of the regression coefficients.
#[derive(Clone, Debug, PartialEq)]
pub enum Coefficients {
    /// Constant coefficients with a diffuse prior.
    Fixed,
    /// Random-walk coefficients with innovation covariance `var`.
    TimeVarying(Array2<f64>),
    /// Random-walk coefficients driven by `S·η_t`, covariance `S·Sᵀ`.
    Factor(Array2<f64>),
}

/// `y_t = Z_t·α_t + x_tᵀ·β_t + ε_t` on top of a base model.
///
/// The state is `[α_t; β_t]`. Fixed coefficients are diffuse and never
/// move; time-varying ones follow a random walk whose initial variance is
/// its innovation covariance when that is positive definite, diffuse
/// otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct RegSsf {
    base: Box<Ssf>,
    x: Array2<f64>,
    coefficients: Coefficients,
    /// `S` of the coefficient block (nx × k).
    factor: Array2<f64>,
    /// `S·Sᵀ`.
    var: Array2<f64>,
    proper: bool,
}

impl RegSsf {
    /// Augments `base` with the columns of `x` (periods × regressors).
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SsfError::DimensionMismatch`] | `var` not nx × nx, `S` without nx rows |
    /// | [`SsfError::InvalidVariance`] | non-finite entry of `var` or `S` |
    pub fn new(base: Ssf, x: Array2<f64>, coefficients: Coefficients) -> Result<Self, SsfError> {
        base.check()?;
        let nx = x.ncols();
        let (factor, var, proper) = match &coefficients {
            Coefficients::Fixed => (Array2::zeros((nx, 0)), Array2::zeros((nx, nx)), false),
            Coefficients::TimeVarying(v) => {
                check_shape("coefficient covariance rows", nx, v.nrows())?;
                check_shape("coefficient covariance columns", nx, v.ncols())?;
                check_finite(v.view())?;
                let mut l = v.clone();
                let proper = cholesky(l.view_mut()).is_ok();
                if !proper {
                    l = v.clone();
                    kalmar_linalg::cholesky_psd(l.view_mut(), 1e-12)?;
                }
                (l, v.clone(), proper)
            }
            Coefficients::Factor(f) => {
                check_shape("coefficient factor rows", nx, f.nrows())?;
                check_finite(f.view())?;
                let v = f.dot(&f.t());
                let mut l = v.clone();
                let proper = cholesky(l.view_mut()).is_ok();
                (f.clone(), v, proper)
            }
        };
        Ok(Self {
            base: Box::new(base),
            x,
            coefficients,
            factor,
            var,
            proper,
        })
    }

    /// The base model.
    pub fn base(&self) -> &Ssf {
        &self.base
    }

    /// Regression variables (periods × regressors).
    pub fn regressors(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    /// Coefficient regime.
    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Returns `true` if the coefficient block has a proper initial
    /// variance.
    pub fn is_proper(&self) -> bool {
        self.proper
    }

    fn nbase(&self) -> usize {
        Initialization::dim(self.base.as_ref())
    }

    fn nx(&self) -> usize {
        self.x.ncols()
    }

    fn row(&self, t: usize) -> ArrayView1<'_, f64> {
        self.x.row(t)
    }
}

fn check_shape(what: &'static str, expected: usize, got: usize) -> Result<(), SsfError> {
    if expected != got {
        return Err(SsfError::DimensionMismatch { what, expected, got });
    }
    Ok(())
}

fn check_finite(m: ArrayView2<'_, f64>) -> Result<(), SsfError> {
    match m.iter().find(|v| !v.is_finite()) {
        Some(&v) => Err(SsfError::InvalidVariance(v)),
        None => Ok(()),
    }
}

impl Initialization for RegSsf {
    fn dim(&self) -> usize {
        self.nbase() + self.nx()
    }

    fn diffuse_dim(&self) -> usize {
        self.base.diffuse_dim() + if self.proper { 0 } else { self.nx() }
    }

    fn a0(&self, mut a: ArrayViewMut1<'_, f64>) {
        let n = self.nbase();
        self.base.a0(a.slice_mut(s![..n]));
    }

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) {
        let n = self.nbase();
        self.base.pf0(p.slice_mut(s![..n, ..n]));
        if self.proper {
            p.slice_mut(s![n.., n..]).assign(&self.var);
        }
    }

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        let n = self.nbase();
        let nd = self.base.diffuse_dim();
        self.base.diffuse_constraints(b.slice_mut(s![..n, ..nd]));
        if !self.proper {
            for i in 0..self.nx() {
                b[[n + i, nd + i]] = 1.0;
            }
        }
    }
}

impl Dynamics for RegSsf {
    fn state_dim(&self) -> usize {
        self.nbase() + self.nx()
    }

    fn is_time_invariant(&self) -> bool {
        Dynamics::is_time_invariant(self.base.as_ref())
    }

    fn innovations_dim(&self) -> usize {
        self.base.innovations_dim() + self.factor.ncols()
    }

    fn has_innovations(&self, t: usize) -> bool {
        self.base.has_innovations(t) || self.factor.ncols() > 0
    }

    fn s(&self, t: usize, mut s: ArrayViewMut2<'_, f64>) {
        let n = self.nbase();
        let k = self.base.innovations_dim();
        self.base.s(t, s.slice_mut(s![..n, ..k]));
        s.slice_mut(s![n.., k..]).assign(&self.factor);
    }

    fn tx(&self, t: usize, mut x: ArrayViewMut1<'_, f64>) {
        let n = self.nbase();
        self.base.tx(t, x.slice_mut(s![..n]));
    }

    fn xt(&self, t: usize, mut x: ArrayViewMut1<'_, f64>) {
        let n = self.nbase();
        self.base.xt(t, x.slice_mut(s![..n]));
    }

    fn add_v(&self, t: usize, mut p: ArrayViewMut2<'_, f64>) {
        let n = self.nbase();
        self.base.add_v(t, p.slice_mut(s![..n, ..n]));
        if self.factor.ncols() > 0 {
            let mut block = p.slice_mut(s![n.., n..]);
            block += &self.var;
        }
    }
}

impl Measurement for RegSsf {
    fn loading_dim(&self) -> usize {
        self.nbase() + self.nx()
    }

    fn is_time_invariant(&self) -> bool {
        self.nx() == 0 && Measurement::is_time_invariant(self.base.as_ref())
    }

    fn observation_capacity(&self) -> Option<usize> {
        let own = self.x.nrows();
        Some(
            self.base
                .observation_capacity()
                .map_or(own, |c| c.min(own)),
        )
    }

    fn z(&self, t: usize, mut z: ArrayViewMut1<'_, f64>) {
        let n = self.nbase();
        self.base.z(t, z.slice_mut(s![..n]));
        z.slice_mut(s![n..]).assign(&self.row(t));
    }

    fn zx(&self, t: usize, x: ArrayView1<'_, f64>) -> f64 {
        let n = self.nbase();
        self.base.zx(t, x.slice(s![..n])) + self.row(t).dot(&x.slice(s![n..]))
    }

    fn zm(&self, t: usize, m: ArrayView2<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        let n = self.nbase();
        self.base.zm(t, m.slice(s![..n, ..]), out.view_mut());
        out += &self.row(t).dot(&m.slice(s![n.., ..]));
    }

    fn xpzd(&self, t: usize, mut x: ArrayViewMut1<'_, f64>, d: f64) {
        let n = self.nbase();
        self.base.xpzd(t, x.slice_mut(s![..n]), d);
        x.slice_mut(s![n..]).scaled_add(d, &self.row(t));
    }

    fn error_variance(&self, t: usize) -> f64 {
        self.base.error_variance(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};

    fn base() -> Ssf {
        Ssf::noise(1.0).unwrap()
    }

    #[test]
    fn fixed_coefficients_are_diffuse() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0]];
        let reg = RegSsf::new(base(), x, Coefficients::Fixed).unwrap();
        reg.check().unwrap();
        assert_eq!(Initialization::dim(&reg), 3);
        assert_eq!(reg.diffuse_dim(), 2);
        assert_eq!(reg.innovations_dim(), 1);
        assert_eq!(reg.observation_capacity(), Some(3));
        let mut b = Array2::zeros((3, 2));
        reg.diffuse_constraints(b.view_mut());
        assert_eq!(b, array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    }

    #[test]
    fn proper_time_varying_block() {
        let x = array![[1.0], [2.0]];
        let reg = RegSsf::new(base(), x, Coefficients::TimeVarying(array![[0.25]])).unwrap();
        assert!(reg.is_proper());
        assert_eq!(reg.diffuse_dim(), 0);
        let mut p = Array2::zeros((2, 2));
        reg.pf0(p.view_mut());
        assert_eq!(p, array![[1.0, 0.0], [0.0, 0.25]]);
        let mut s = Array2::zeros((2, 2));
        reg.s(0, s.view_mut());
        assert_abs_diff_eq!(s[[1, 1]], 0.5, epsilon = 1e-15);
    }

    #[test]
    fn degenerate_factor_is_diffuse() {
        let x = array![[1.0, 3.0], [2.0, 1.0]];
        let reg = RegSsf::new(base(), x, Coefficients::Factor(array![[1.0], [1.0]])).unwrap();
        assert!(!reg.is_proper());
        assert_eq!(reg.diffuse_dim(), 2);
        assert_eq!(reg.innovations_dim(), 2);
    }

    #[test]
    fn zvz_includes_regression_cross_terms() {
        let x = array![[1.0, -2.0], [0.5, 1.0]];
        let reg = RegSsf::new(base(), x, Coefficients::Fixed).unwrap();
        let p = array![[1.0, 0.2, 0.1], [0.2, 2.0, 0.3], [0.1, 0.3, 1.5]];
        let mut z = Array1::zeros(3);
        reg.z(1, z.view_mut());
        assert_eq!(z, array![1.0, 0.5, 1.0]);
        assert_abs_diff_eq!(reg.zvz(1, p.view()), z.dot(&p.dot(&z)), epsilon = 1e-14);
    }

    #[test]
    fn rejects_bad_covariance_shape() {
        let x = array![[1.0, 0.0]];
        let err = RegSsf::new(base(), x, Coefficients::TimeVarying(Array2::eye(3)));
        assert!(matches!(
            err,
            Err(SsfError::DimensionMismatch { expected: 2, got: 3, .. })
        ));
    }
}
