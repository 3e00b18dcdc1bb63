//! Likelihood as a function of the ARIMA parameters.

use kalmar_arima::{ArimaMapping, ArimaModel};
use ndarray::Array1;
use rayon::prelude::*;
use tracing::debug;

use crate::concentrated::{ConcentratedLikelihood, ConcentratedLikelihoodEstimator};
use crate::config::ConcentratedLikelihoodConfig;
use crate::error::RegArimaError;
use crate::linear_model::LinearModel;
use crate::model::RegArimaModel;

/// One evaluation of a [`LikelihoodFunction`].
#[derive(Clone, Debug, PartialEq)]
pub struct LikelihoodEvaluation {
    arima: ArimaModel,
    likelihood: ConcentratedLikelihood,
}

impl LikelihoodEvaluation {
    /// The model the parameters map to (unit innovation variance).
    pub fn arima(&self) -> &ArimaModel {
        &self.arima
    }

    /// The concentrated likelihood at this point.
    pub fn likelihood(&self) -> &ConcentratedLikelihood {
        &self.likelihood
    }

    /// Value to minimize, `ssq·|Σ|^{1/n}`.
    pub fn objective(&self) -> f64 {
        self.likelihood.objective()
    }

    /// Residuals whose squared norm is the objective.
    pub fn residuals(&self) -> Array1<f64> {
        self.likelihood.objective_residuals()
    }
}

/// Concentrated likelihood of a [`RegArimaModel`] over the parameters of
/// an [`ArimaMapping`].
///
/// The data are differenced once, by the unit roots of the mapping, so an
/// evaluation only whitens and solves the regression.
#[derive(Clone, Debug)]
pub struct LikelihoodFunction<M> {
    model: RegArimaModel,
    linear: LinearModel,
    mapping: M,
    config: ConcentratedLikelihoodConfig,
}

impl<M: ArimaMapping> LikelihoodFunction<M> {
    /// Creates the function.
    ///
    /// # Errors
    ///
    /// Errors of [`ConcentratedLikelihoodConfig::validate`], of the mapping
    /// at its default parameters, and of the differencing of `model`.
    pub fn new(
        model: RegArimaModel,
        mapping: M,
        config: ConcentratedLikelihoodConfig,
    ) -> Result<Self, RegArimaError> {
        config.validate()?;
        let reference = mapping.map(&mapping.default_parameters())?;
        let linear = model.differenced_by(reference.delta())?;
        Ok(Self {
            model,
            linear,
            mapping,
            config,
        })
    }

    /// Number of parameters.
    pub fn dim(&self) -> usize {
        self.mapping.dim()
    }

    /// The parameter mapping.
    pub fn mapping(&self) -> &M {
        &self.mapping
    }

    /// The regression model.
    pub fn model(&self) -> &RegArimaModel {
        &self.model
    }

    /// The differenced model every evaluation works on.
    pub fn linear_model(&self) -> &LinearModel {
        &self.linear
    }

    /// Evaluates the likelihood at `params`.
    pub fn evaluate(&self, params: &[f64]) -> Result<LikelihoodEvaluation, RegArimaError> {
        let mut estimator = ConcentratedLikelihoodEstimator::new(self.config.clone());
        self.evaluate_with(&mut estimator, params)
    }

    /// Evaluates the likelihood at `params` reusing `estimator`'s buffers.
    pub fn evaluate_with(
        &self,
        estimator: &mut ConcentratedLikelihoodEstimator,
        params: &[f64],
    ) -> Result<LikelihoodEvaluation, RegArimaError> {
        let arima = self.mapping.map(params)?;
        let likelihood = estimator.estimate(&self.linear, &arima)?;
        Ok(LikelihoodEvaluation { arima, likelihood })
    }

    /// Evaluates several points in parallel; each worker owns its
    /// estimator.
    pub fn evaluate_many(
        &self,
        points: &[Vec<f64>],
    ) -> Vec<Result<LikelihoodEvaluation, RegArimaError>> {
        points
            .par_iter()
            .map_init(
                || ConcentratedLikelihoodEstimator::new(self.config.clone()),
                |estimator, params| self.evaluate_with(estimator, params),
            )
            .collect()
    }

    /// Objective at `params`, `f64::INFINITY` at a point where the
    /// likelihood cannot be computed.
    ///
    /// # Errors
    ///
    /// Only failures that do not depend on the point (wrong parameter
    /// count, invalid model); see [`RegArimaError::is_numerical`].
    pub fn cost(&self, params: &[f64]) -> Result<f64, RegArimaError> {
        match self.evaluate(params) {
            Ok(eval) if eval.objective().is_finite() => Ok(eval.objective()),
            Ok(_) => Ok(f64::INFINITY),
            Err(e) if e.is_numerical() => {
                debug!(error = %e, "likelihood rejected parameter point");
                Ok(f64::INFINITY)
            }
            Err(e) => Err(e),
        }
    }
}
