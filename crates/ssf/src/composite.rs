//! Block-diagonal stacking of independent components.

use ndarray::{ArrayView1, ArrayViewMut1, ArrayViewMut2, s};

use crate::error::SsfError;
use crate::model::{Dynamics, Initialization, Measurement, StateSpaceModel};
use crate::ssf::Ssf;

/// Sum of independent components: `y_t = Σ_i Z_i·α_{i,t} + Σ_i ε_{i,t}`.
///
/// States, transitions and noises are stacked block-diagonally; the only
/// coupling between components is the shared observation.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeSsf {
    components: Vec<Ssf>,
    /// State offsets, one more than the number of components.
    offsets: Vec<usize>,
    /// Diffuse-direction offsets.
    diffuse_offsets: Vec<usize>,
    /// Innovation offsets.
    innovation_offsets: Vec<usize>,
}

fn offsets(sizes: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut out = vec![0];
    let mut acc = 0;
    for size in sizes {
        acc += size;
        out.push(acc);
    }
    out
}

impl CompositeSsf {
    /// Stacks `components`.
    ///
    /// # Errors
    ///
    /// [`SsfError::EmptyComposite`] for an empty list; any component that
    /// fails its own [`check`](StateSpaceModel::check) is reported as is.
    pub fn new(components: Vec<Ssf>) -> Result<Self, SsfError> {
        if components.is_empty() {
            return Err(SsfError::EmptyComposite);
        }
        for c in &components {
            c.check()?;
        }
        Ok(Self {
            offsets: offsets(components.iter().map(Initialization::dim)),
            diffuse_offsets: offsets(components.iter().map(Initialization::diffuse_dim)),
            innovation_offsets: offsets(components.iter().map(Dynamics::innovations_dim)),
            components,
        })
    }

    /// The stacked components.
    pub fn components(&self) -> &[Ssf] {
        &self.components
    }

    /// State range `[start, end)` of component `i`.
    pub fn component_range(&self, i: usize) -> (usize, usize) {
        (self.offsets[i], self.offsets[i + 1])
    }

    fn blocks(&self) -> impl Iterator<Item = (&Ssf, usize, usize)> {
        self.components
            .iter()
            .zip(self.offsets.windows(2))
            .map(|(c, w)| (c, w[0], w[1]))
    }

    fn total(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }
}

impl Initialization for CompositeSsf {
    fn dim(&self) -> usize {
        self.total()
    }

    fn diffuse_dim(&self) -> usize {
        self.diffuse_offsets[self.diffuse_offsets.len() - 1]
    }

    fn a0(&self, mut a: ArrayViewMut1<'_, f64>) {
        for (c, lo, hi) in self.blocks() {
            c.a0(a.slice_mut(s![lo..hi]));
        }
    }

    fn pf0(&self, mut p: ArrayViewMut2<'_, f64>) {
        for (c, lo, hi) in self.blocks() {
            c.pf0(p.slice_mut(s![lo..hi, lo..hi]));
        }
    }

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        for (i, (c, lo, hi)) in self.blocks().enumerate() {
            let (dlo, dhi) = (self.diffuse_offsets[i], self.diffuse_offsets[i + 1]);
            c.diffuse_constraints(b.slice_mut(s![lo..hi, dlo..dhi]));
        }
    }
}

impl Dynamics for CompositeSsf {
    fn state_dim(&self) -> usize {
        self.total()
    }

    fn is_time_invariant(&self) -> bool {
        self.components.iter().all(Dynamics::is_time_invariant)
    }

    fn innovations_dim(&self) -> usize {
        self.innovation_offsets[self.innovation_offsets.len() - 1]
    }

    fn has_innovations(&self, t: usize) -> bool {
        self.components.iter().any(|c| c.has_innovations(t))
    }

    fn s(&self, t: usize, mut s: ArrayViewMut2<'_, f64>) {
        for (i, (c, lo, hi)) in self.blocks().enumerate() {
            let (ilo, ihi) = (self.innovation_offsets[i], self.innovation_offsets[i + 1]);
            c.s(t, s.slice_mut(s![lo..hi, ilo..ihi]));
        }
    }

    fn tx(&self, t: usize, mut x: ArrayViewMut1<'_, f64>) {
        for (c, lo, hi) in self.blocks() {
            c.tx(t, x.slice_mut(s![lo..hi]));
        }
    }

    fn xt(&self, t: usize, mut x: ArrayViewMut1<'_, f64>) {
        for (c, lo, hi) in self.blocks() {
            c.xt(t, x.slice_mut(s![lo..hi]));
        }
    }

    fn add_v(&self, t: usize, mut p: ArrayViewMut2<'_, f64>) {
        for (c, lo, hi) in self.blocks() {
            c.add_v(t, p.slice_mut(s![lo..hi, lo..hi]));
        }
    }
}

impl Measurement for CompositeSsf {
    fn loading_dim(&self) -> usize {
        self.total()
    }

    fn is_time_invariant(&self) -> bool {
        self.components.iter().all(Measurement::is_time_invariant)
    }

    fn observation_capacity(&self) -> Option<usize> {
        self.components
            .iter()
            .filter_map(Measurement::observation_capacity)
            .min()
    }

    fn z(&self, t: usize, mut z: ArrayViewMut1<'_, f64>) {
        for (c, lo, hi) in self.blocks() {
            c.z(t, z.slice_mut(s![lo..hi]));
        }
    }

    fn zx(&self, t: usize, x: ArrayView1<'_, f64>) -> f64 {
        self.blocks()
            .map(|(c, lo, hi)| c.zx(t, x.slice(s![lo..hi])))
            .sum()
    }

    fn xpzd(&self, t: usize, mut x: ArrayViewMut1<'_, f64>, d: f64) {
        for (c, lo, hi) in self.blocks() {
            c.xpzd(t, x.slice_mut(s![lo..hi]), d);
        }
    }

    fn error_variance(&self, t: usize) -> f64 {
        self.components.iter().map(|c| c.error_variance(t)).sum()
    }
}
