//! Settings of the concentrated likelihood and of the estimation driver.

use crate::error::RegArimaError;

/// Default relative tolerance of the rank-revealing QR of the filtered
/// regressors.
pub const DEFAULT_REGRESSION_RANK_TOLERANCE: f64 = 1e-9;

/// Settings of [`ConcentratedLikelihoodEstimator`](crate::ConcentratedLikelihoodEstimator).
///
/// # Example
///
/// ```
/// use kalmar_regarima::ConcentratedLikelihoodConfig;
///
/// let config = ConcentratedLikelihoodConfig::new().with_scaling(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentratedLikelihoodConfig {
    /// Rescale `y` and each regressor before filtering.
    scaling: bool,
    /// Relative tolerance of the QR rank decision.
    rank_tolerance: f64,
}

impl ConcentratedLikelihoodConfig {
    /// Defaults: scaling on, rank tolerance
    /// [`DEFAULT_REGRESSION_RANK_TOLERANCE`].
    pub fn new() -> Self {
        Self {
            scaling: true,
            rank_tolerance: DEFAULT_REGRESSION_RANK_TOLERANCE,
        }
    }

    /// Turns rescaling on or off.
    pub fn with_scaling(mut self, scaling: bool) -> Self {
        self.scaling = scaling;
        self
    }

    /// Sets the QR rank tolerance.
    pub fn with_rank_tolerance(mut self, tolerance: f64) -> Self {
        self.rank_tolerance = tolerance;
        self
    }

    /// Whether rescaling is on.
    pub fn scaling(&self) -> bool {
        self.scaling
    }

    /// QR rank tolerance.
    pub fn rank_tolerance(&self) -> f64 {
        self.rank_tolerance
    }

    /// Checks that the rank tolerance lies in `[0, 1)`.
    pub fn validate(&self) -> Result<(), RegArimaError> {
        if !(0.0..1.0).contains(&self.rank_tolerance) {
            return Err(RegArimaError::InvalidConfig {
                name: "rank tolerance",
                value: self.rank_tolerance,
            });
        }
        Ok(())
    }
}

impl Default for ConcentratedLikelihoodConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings of the Nelder-Mead estimation driver.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationConfig {
    max_iters: u64,
    simplex_step: f64,
    sd_tolerance: f64,
    likelihood: ConcentratedLikelihoodConfig,
}

impl EstimationConfig {
    /// Defaults: 1000 iterations, simplex step 0.5, sd tolerance 1e-8.
    pub fn new() -> Self {
        Self {
            max_iters: 1000,
            simplex_step: 0.5,
            sd_tolerance: 1e-8,
            likelihood: ConcentratedLikelihoodConfig::new(),
        }
    }

    /// Sets the iteration limit.
    pub fn with_max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Sets the offset of the initial simplex vertices from the start.
    pub fn with_simplex_step(mut self, step: f64) -> Self {
        self.simplex_step = step;
        self
    }

    /// Sets the standard-deviation tolerance of the simplex costs.
    pub fn with_sd_tolerance(mut self, tolerance: f64) -> Self {
        self.sd_tolerance = tolerance;
        self
    }

    /// Sets the likelihood settings used for each evaluation.
    pub fn with_likelihood(mut self, likelihood: ConcentratedLikelihoodConfig) -> Self {
        self.likelihood = likelihood;
        self
    }

    /// Iteration limit.
    pub fn max_iters(&self) -> u64 {
        self.max_iters
    }

    /// Initial simplex step.
    pub fn simplex_step(&self) -> f64 {
        self.simplex_step
    }

    /// Simplex cost tolerance.
    pub fn sd_tolerance(&self) -> f64 {
        self.sd_tolerance
    }

    /// Likelihood settings.
    pub fn likelihood(&self) -> &ConcentratedLikelihoodConfig {
        &self.likelihood
    }

    /// Validates this configuration.
    ///
    /// Returns an error if the iteration limit is zero, the step is not
    /// finite and positive, the tolerance is not finite and positive, or
    /// the likelihood settings are invalid.
    pub fn validate(&self) -> Result<(), RegArimaError> {
        if self.max_iters == 0 {
            return Err(RegArimaError::InvalidConfig {
                name: "max iterations",
                value: 0.0,
            });
        }
        if !self.simplex_step.is_finite() || self.simplex_step <= 0.0 {
            return Err(RegArimaError::InvalidConfig {
                name: "simplex step",
                value: self.simplex_step,
            });
        }
        if !self.sd_tolerance.is_finite() || self.sd_tolerance <= 0.0 {
            return Err(RegArimaError::InvalidConfig {
                name: "sd tolerance",
                value: self.sd_tolerance,
            });
        }
        self.likelihood.validate()
    }
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self::new()
    }
}
