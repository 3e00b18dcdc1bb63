//! # kalmar-regarima
//!
//! Regression models with ARIMA errors, estimated by concentrated
//! likelihood.
//!
//! ```mermaid
//! graph LR
//!     A["RegArimaModel::builder(y)...build()?"] --> B[".differenced_model()?"]
//!     B --> C["ConcentratedLikelihoodEstimator::estimate(&linear, &arima)?"]
//!     C --> D["ConcentratedLikelihood"]
//!     A --> E["LikelihoodFunction::new(model, mapping, config)?"]
//!     E --> F["RegArimaEstimator::estimate(&model, mapping)?"]
//!     F --> G["RegArimaFit"]
//! ```
//!
//! The regression `y_t = μ·m_t + x_tᵀ·β + u_t` is differenced by the unit
//! roots of the disturbance, whitened by the stationary ARMA filter and
//! solved by QR. Missing observations enter as indicator regressors whose
//! coefficients are their estimates. [`SsfLikelihood`] evaluates the same
//! model with the diffuse Kalman filter.
//!
//! Failures caused by a parameter point (a non-stationary AR part, a
//! failed decomposition) are reported by [`RegArimaError::is_numerical`];
//! [`LikelihoodFunction::cost`] turns them into `f64::INFINITY`.

mod concentrated;
mod config;
mod error;
mod estimation;
mod function;
mod linear_model;
mod model;
mod ssf_likelihood;
mod statistics;

pub use concentrated::{ConcentratedLikelihood, ConcentratedLikelihoodEstimator};
pub use config::{
    ConcentratedLikelihoodConfig, DEFAULT_REGRESSION_RANK_TOLERANCE, EstimationConfig,
};
pub use error::RegArimaError;
pub use estimation::{RegArimaEstimator, RegArimaFit};
pub use function::{LikelihoodEvaluation, LikelihoodFunction};
pub use linear_model::LinearModel;
pub use model::{RegArimaModel, RegArimaModelBuilder};
pub use ssf_likelihood::SsfLikelihood;
pub use statistics::LikelihoodStatistics;
