//! Gaussian likelihood assembled from prediction errors.

use std::f64::consts::PI;

/// Running sums `n`, `Σ e²/f`, `Σ ln f` of the ordinary recursion.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LikelihoodAccumulator {
    n: usize,
    ssq: f64,
    ldet: f64,
}

impl LikelihoodAccumulator {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one observation with error `e` and variance `f > 0`.
    pub fn add(&mut self, e: f64, f: f64) {
        self.n += 1;
        self.ssq += e * e / f;
        self.ldet += f.ln();
    }

    /// Adds an observation that contributes only to the count and the
    /// log-determinant.
    pub(crate) fn add_variance(&mut self, f: f64) {
        self.n += 1;
        self.ldet += f.ln();
    }

    /// Counts an observation without any contribution.
    pub(crate) fn count(&mut self) {
        self.n += 1;
    }

    /// Adds to the sum of squares.
    pub(crate) fn add_ssq(&mut self, ssq: f64) {
        self.ssq += ssq;
    }

    /// Number of observations.
    pub fn n(&self) -> usize {
        self.n
    }

    /// `Σ e²/f`.
    pub fn ssq(&self) -> f64 {
        self.ssq
    }

    /// `Σ ln f`.
    pub fn log_determinant(&self) -> f64 {
        self.ldet
    }

    /// Finishes a likelihood with `nd` diffuse directions and correction
    /// `dcorr`.
    pub fn finish(self, nd: usize, dcorr: f64) -> DiffuseLikelihood {
        DiffuseLikelihood {
            n: self.n,
            nd,
            ssq: self.ssq,
            ldet: self.ldet,
            dcorr,
        }
    }
}

/// Diffuse Gaussian likelihood.
///
/// With `m = n - nd` degrees of freedom,
///
/// ```text
/// -2·ln L(σ²) = m·ln 2π + m·ln σ² + ssq/σ² + ldet + dcorr
/// ```
///
/// and `σ̂² = ssq / m` gives the concentrated value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffuseLikelihood {
    n: usize,
    nd: usize,
    ssq: f64,
    ldet: f64,
    dcorr: f64,
}

impl DiffuseLikelihood {
    /// Number of observations used.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of diffuse directions identified by the data.
    pub fn diffuse_dim(&self) -> usize {
        self.nd
    }

    /// `n - nd`.
    pub fn degrees_of_freedom(&self) -> usize {
        self.n.saturating_sub(self.nd)
    }

    /// Sum of squared standardized errors.
    pub fn ssq(&self) -> f64 {
        self.ssq
    }

    /// `Σ ln f_t`.
    pub fn log_determinant(&self) -> f64 {
        self.ldet
    }

    /// Log-determinant of the diffuse information.
    pub fn diffuse_correction(&self) -> f64 {
        self.dcorr
    }

    /// Maximum-likelihood estimate of the scale, `ssq / m`.
    pub fn sigma2(&self) -> f64 {
        self.ssq / self.degrees_of_freedom() as f64
    }

    /// Log-likelihood with the scale concentrated out.
    pub fn log_likelihood(&self) -> f64 {
        let m = self.degrees_of_freedom() as f64;
        -0.5 * (m * (2.0 * PI).ln() + m * (1.0 + (self.ssq / m).ln()) + self.ldet + self.dcorr)
    }

    /// Log-likelihood for a given scale `σ²`.
    pub fn log_likelihood_with_scale(&self, sigma2: f64) -> f64 {
        let m = self.degrees_of_freedom() as f64;
        -0.5 * (m * (2.0 * PI).ln()
            + m * sigma2.ln()
            + self.ssq / sigma2
            + self.ldet
            + self.dcorr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn accumulates() {
        let mut acc = LikelihoodAccumulator::new();
        acc.add(1.0, 2.0);
        acc.add(-2.0, 1.0);
        assert_eq!(acc.n(), 2);
        assert_abs_diff_eq!(acc.ssq(), 4.5, epsilon = 1e-15);
        assert_abs_diff_eq!(acc.log_determinant(), 2.0_f64.ln(), epsilon = 1e-15);
    }

    #[test]
    fn concentrated_value_is_maximum() {
        let mut acc = LikelihoodAccumulator::new();
        for (e, f) in [(0.5, 1.0), (1.5, 1.2), (-0.3, 1.1), (0.9, 1.0)] {
            acc.add(e, f);
        }
        let ll = acc.finish(1, 0.4);
        assert_eq!(ll.degrees_of_freedom(), 3);
        let best = ll.log_likelihood();
        assert_abs_diff_eq!(best, ll.log_likelihood_with_scale(ll.sigma2()), epsilon = 1e-12);
        assert!(best > ll.log_likelihood_with_scale(ll.sigma2() * 1.1));
        assert!(best > ll.log_likelihood_with_scale(ll.sigma2() * 0.9));
    }
}
