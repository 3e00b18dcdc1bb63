//! Nelder-Mead estimation of the ARIMA parameters.
//!
//! Wraps the `argmin` crate to minimize the concentrated objective over the
//! unconstrained parameters of an [`ArimaMapping`]. The regression
//! coefficients and the innovation variance come out of the final
//! concentrated likelihood.

use argmin::core::{CostFunction, Executor, State};
use argmin::solver::neldermead::NelderMead;
use kalmar_arima::ArimaMapping;
use tracing::{debug, info, instrument};

use crate::concentrated::ConcentratedLikelihood;
use crate::config::EstimationConfig;
use crate::error::RegArimaError;
use crate::function::LikelihoodFunction;
use crate::model::RegArimaModel;
use crate::statistics::LikelihoodStatistics;

/// A fitted regression model with ARIMA errors.
///
/// ```mermaid
/// graph LR
///     A["RegArimaFit"] --> B[".model(): data and fitted ARIMA"]
///     A --> C[".likelihood(): coefficients, ssq, residuals"]
///     A --> D[".statistics(): AIC, AICc, BIC"]
///     A --> E[".parameters(): unconstrained optimum"]
/// ```
#[derive(Clone, Debug)]
pub struct RegArimaFit {
    model: RegArimaModel,
    parameters: Vec<f64>,
    likelihood: ConcentratedLikelihood,
    statistics: LikelihoodStatistics,
    iterations: u64,
}

impl RegArimaFit {
    /// The model with the fitted ARIMA part, innovation variance included.
    pub fn model(&self) -> &RegArimaModel {
        &self.model
    }

    /// Unconstrained parameters at the optimum.
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    /// Concentrated likelihood at the optimum.
    pub fn likelihood(&self) -> &ConcentratedLikelihood {
        &self.likelihood
    }

    /// Information criteria.
    pub fn statistics(&self) -> &LikelihoodStatistics {
        &self.statistics
    }

    /// Nelder-Mead iterations performed.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

/// Maximum-likelihood driver for [`RegArimaModel`]s.
#[derive(Clone, Debug, Default)]
pub struct RegArimaEstimator {
    config: EstimationConfig,
}

impl RegArimaEstimator {
    /// Creates a driver.
    pub fn new(config: EstimationConfig) -> Self {
        Self { config }
    }

    /// The settings.
    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    /// Fits `mapping` to `model` starting from the mapping's default point.
    pub fn estimate<M: ArimaMapping>(
        &self,
        model: &RegArimaModel,
        mapping: M,
    ) -> Result<RegArimaFit, RegArimaError> {
        let start = mapping.default_parameters();
        self.estimate_from(model, mapping, start)
    }

    /// Fits `mapping` to `model` starting from `start`.
    ///
    /// # Errors
    ///
    /// Configuration and model errors, [`RegArimaError::OptimizationFailed`]
    /// if the simplex search fails, and the errors of the final evaluation.
    #[instrument(skip_all, fields(n = model.len(), dim = mapping.dim()))]
    pub fn estimate_from<M: ArimaMapping>(
        &self,
        model: &RegArimaModel,
        mapping: M,
        start: Vec<f64>,
    ) -> Result<RegArimaFit, RegArimaError> {
        self.config.validate()?;
        let function =
            LikelihoodFunction::new(model.clone(), mapping, self.config.likelihood().clone())?;
        let dim = function.dim();
        if start.len() != dim {
            return Err(kalmar_arima::ArimaError::ParameterCount {
                expected: dim,
                got: start.len(),
            }
            .into());
        }

        // No free parameter: a single evaluation.
        let (parameters, iterations) = if dim == 0 {
            (start, 0)
        } else {
            self.minimize(&function, start)?
        };

        let eval = function.evaluate(&parameters)?;
        let likelihood = eval.likelihood().clone();
        let arima = eval.arima().with_innovation_variance(likelihood.sigma2())?;
        let missing = likelihood.missing_estimates().len();
        let regressors = likelihood
            .used_columns()
            .iter()
            .filter(|&&j| j >= missing)
            .count();
        let k = dim + regressors + 1;
        let statistics = LikelihoodStatistics::from_concentrated(&likelihood, k);
        info!(
            iterations,
            log_likelihood = statistics.log_likelihood(),
            aic = statistics.aic(),
            "regarima model estimated"
        );
        Ok(RegArimaFit {
            model: model.with_arima(arima),
            parameters,
            likelihood,
            statistics,
            iterations,
        })
    }

    fn minimize<M: ArimaMapping>(
        &self,
        function: &LikelihoodFunction<M>,
        start: Vec<f64>,
    ) -> Result<(Vec<f64>, u64), RegArimaError> {
        let dim = start.len();
        let mut simplex = Vec::with_capacity(dim + 1);
        simplex.push(start.clone());
        for i in 0..dim {
            let mut vertex = start.clone();
            vertex[i] += self.config.simplex_step();
            simplex.push(vertex);
        }

        let solver = NelderMead::new(simplex)
            .with_sd_tolerance(self.config.sd_tolerance())
            .map_err(|_| RegArimaError::OptimizationFailed)?;
        let max_iters = self.config.max_iters();
        let result = Executor::new(Objective { function }, solver)
            .configure(|state| state.max_iters(max_iters))
            .run()
            .map_err(|e| {
                debug!(error = %e, "nelder-mead failed");
                RegArimaError::OptimizationFailed
            })?;

        let state = result.state();
        if !state.get_best_cost().is_finite() {
            return Err(RegArimaError::OptimizationFailed);
        }
        let best = state
            .get_best_param()
            .cloned()
            .ok_or(RegArimaError::OptimizationFailed)?;
        Ok((best, state.get_iter()))
    }
}

/// Cost function for argmin: the concentrated objective.
struct Objective<'a, M> {
    function: &'a LikelihoodFunction<M>,
}

impl<M: ArimaMapping> CostFunction for Objective<'_, M> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        self.function
            .cost(params)
            .map_err(argmin::core::Error::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kalmar_arima::SarimaMapping;
    use ndarray::Array1;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn ar1_coefficient_recovery() {
        let phi = 0.7;
        let n = 500;
        let mut rng = rand::rngs::StdRng::seed_from_u64(123);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut y = Array1::zeros(n);
        for t in 1..n {
            y[t] = phi * y[t - 1] + normal.sample(&mut rng);
        }
        let model = RegArimaModel::builder(y).build().unwrap();
        let fit = RegArimaEstimator::default()
            .estimate(&model, SarimaMapping::new(1, 0, 0))
            .unwrap();
        // Φ(B) = 1 - φB.
        let estimated = -fit.model().arima().ar().get(1);
        assert!((estimated - phi).abs() < 0.1, "phi = {estimated}");
        assert!((fit.model().arima().innovation_variance() - 1.0).abs() < 0.2);
        assert_eq!(fit.statistics().parameters(), 2);
    }

    #[test]
    fn white_noise_needs_no_iterations() {
        let model = RegArimaModel::builder(Array1::from_vec(vec![0.5, -0.1, 0.3, 1.2]))
            .with_mean(true)
            .build()
            .unwrap();
        let fit = RegArimaEstimator::default()
            .estimate(&model, SarimaMapping::new(0, 0, 0))
            .unwrap();
        assert_eq!(fit.iterations(), 0);
        assert!((fit.likelihood().coefficients()[0] - 0.475).abs() < 1e-12);
    }

    #[test]
    fn redundant_regressors_are_not_counted_as_parameters() {
        let y = Array1::from_vec(vec![0.5, -0.1, 0.3, 1.2, 0.8, -0.4]);
        let x = ndarray::Array2::from_shape_fn((6, 2), |(_, j)| (j + 1) as f64);
        let model = RegArimaModel::builder(y)
            .with_mean(true)
            .with_regressors(x)
            .build()
            .unwrap();
        let fit = RegArimaEstimator::default()
            .estimate(&model, SarimaMapping::new(0, 0, 0))
            .unwrap();
        assert_eq!(fit.likelihood().used_columns(), &[0]);
        assert_eq!(fit.likelihood().coefficients().len(), 3);
        // The mean and σ².
        assert_eq!(fit.statistics().parameters(), 2);
    }

    #[test]
    fn start_of_wrong_length_is_rejected() {
        let model = RegArimaModel::builder(Array1::zeros(10)).build().unwrap();
        assert!(
            RegArimaEstimator::default()
                .estimate_from(&model, SarimaMapping::new(1, 0, 0), vec![0.0, 0.0])
                .is_err()
        );
    }
}
