//! Time-invariant model given by dense matrices.

use kalmar_linalg::cholesky_psd;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::error::SsfError;
use crate::model::{Dynamics, Initialization, Measurement};

const FACTOR_TOLERANCE: f64 = 1e-12;

/// Dense time-invariant model `(T, V, Z, h)` with initial `(a0, P_f0, B)`.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixSsf {
    t: Array2<f64>,
    v: Array2<f64>,
    s: Array2<f64>,
    z: Array1<f64>,
    h: f64,
    a0: Array1<f64>,
    pf0: Array2<f64>,
    b: Array2<f64>,
}

fn check_dims(what: &'static str, expected: usize, got: usize) -> Result<(), SsfError> {
    if expected != got {
        return Err(SsfError::DimensionMismatch { what, expected, got });
    }
    Ok(())
}

impl MatrixSsf {
    /// Creates a proper model; `a0` is zero and there are no diffuse
    /// directions until [`with_initial_state`](Self::with_initial_state) or
    /// [`with_diffuse_constraints`](Self::with_diffuse_constraints).
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SsfError::DimensionMismatch`] | `t`, `v`, `pf0` not dim × dim or `z` not of length dim |
    /// | [`SsfError::InvalidVariance`] | `h` negative |
    /// | [`SsfError::Linalg`] | `v` not positive semi-definite |
    pub fn new(
        t: Array2<f64>,
        v: Array2<f64>,
        z: Array1<f64>,
        h: f64,
        pf0: Array2<f64>,
    ) -> Result<Self, SsfError> {
        let dim = z.len();
        check_dims("transition rows", dim, t.nrows())?;
        check_dims("transition columns", dim, t.ncols())?;
        check_dims("state noise rows", dim, v.nrows())?;
        check_dims("state noise columns", dim, v.ncols())?;
        check_dims("initial covariance rows", dim, pf0.nrows())?;
        check_dims("initial covariance columns", dim, pf0.ncols())?;
        if !h.is_finite() || h < 0.0 {
            return Err(SsfError::InvalidVariance(h));
        }
        let mut s = v.clone();
        cholesky_psd(s.view_mut(), FACTOR_TOLERANCE)?;
        Ok(Self {
            t,
            v,
            s,
            z,
            h,
            a0: Array1::zeros(dim),
            pf0,
            b: Array2::zeros((dim, 0)),
        })
    }

    /// Sets the initial mean.
    pub fn with_initial_state(mut self, a0: Array1<f64>) -> Result<Self, SsfError> {
        check_dims("initial state", self.z.len(), a0.len())?;
        self.a0 = a0;
        Ok(self)
    }

    /// Sets the diffuse constraints `B` (dim × nd).
    pub fn with_diffuse_constraints(mut self, b: Array2<f64>) -> Result<Self, SsfError> {
        check_dims("diffuse constraints", self.z.len(), b.nrows())?;
        self.b = b;
        Ok(self)
    }

    /// Transition matrix.
    pub fn transition(&self) -> ArrayView2<'_, f64> {
        self.t.view()
    }

    /// Loading vector.
    pub fn loading(&self) -> ArrayView1<'_, f64> {
        self.z.view()
    }
}

impl Initialization for MatrixSsf {
    fn dim(&self) -> usize {
        self.z.len()
    }

    fn diffuse_dim(&self) -> usize {
        self.b.ncols()
    }

    fn a0(&self, mut a: ArrayViewMut1<'_, f64>) {
        a.assign(&self.a0);
    }

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) {
        p.assign(&self.pf0);
    }

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        b.assign(&self.b);
    }
}

impl Dynamics for MatrixSsf {
    fn state_dim(&self) -> usize {
        self.z.len()
    }

    fn innovations_dim(&self) -> usize {
        self.s.ncols()
    }

    fn v(&self, _t: usize, mut v: ArrayViewMut2<'_, f64>) {
        v.assign(&self.v);
    }

    fn s(&self, _t: usize, mut s: ArrayViewMut2<'_, f64>) {
        s.assign(&self.s);
    }

    fn tx(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>) {
        let y = self.t.dot(&x);
        x.assign(&y);
    }

    fn xt(&self, _t: usize, mut x: ArrayViewMut1<'_, f64>) {
        let y = self.t.t().dot(&x);
        x.assign(&y);
    }

    fn add_v(&self, _t: usize, mut p: ArrayViewMut2<'_, f64>) {
        p += &self.v;
    }

    fn tvt(&self, _t: usize, mut p: ArrayViewMut2<'_, f64>) {
        let tpt = self.t.dot(&p).dot(&self.t.t());
        p.assign(&tpt);
    }
}

impl Measurement for MatrixSsf {
    fn loading_dim(&self) -> usize {
        self.z.len()
    }

    fn z(&self, _t: usize, mut z: ArrayViewMut1<'_, f64>) {
        z.assign(&self.z);
    }

    fn zx(&self, _t: usize, x: ArrayView1<'_, f64>) -> f64 {
        self.z.dot(&x)
    }

    fn zm(&self, _t: usize, m: ArrayView2<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        out.assign(&self.z.dot(&m));
    }

    fn error_variance(&self, _t: usize) -> f64 {
        self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StateSpaceModel;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn builds_and_checks() {
        let ssf = MatrixSsf::new(
            array![[0.5, 1.0], [0.0, 0.2]],
            array![[1.0, 0.5], [0.5, 1.0]],
            array![1.0, 0.0],
            0.3,
            Array2::eye(2),
        )
        .unwrap()
        .with_diffuse_constraints(array![[1.0], [0.0]])
        .unwrap();
        ssf.check().unwrap();
        assert_eq!(ssf.diffuse_dim(), 1);
        assert_eq!(ssf.error_variance(0), 0.3);

        let mut s = Array2::zeros((2, 2));
        ssf.s(0, s.view_mut());
        let sst = s.dot(&s.t());
        for (a, b) in sst.iter().zip(ssf.v.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-14);
        }
    }

    #[test]
    fn rejects_bad_shapes() {
        let err = MatrixSsf::new(
            Array2::eye(3),
            Array2::eye(2),
            array![1.0, 0.0],
            0.0,
            Array2::eye(2),
        );
        assert!(matches!(
            err,
            Err(SsfError::DimensionMismatch { expected: 2, got: 3, .. })
        ));
    }

    #[test]
    fn rejects_indefinite_noise() {
        let err = MatrixSsf::new(
            Array2::eye(2),
            array![[1.0, 2.0], [2.0, 1.0]],
            array![1.0, 0.0],
            0.0,
            Array2::eye(2),
        );
        assert!(matches!(err, Err(SsfError::Linalg(_))));
    }
}
