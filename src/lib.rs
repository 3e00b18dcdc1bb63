//! # kalmar
//!
//! State-space filtering and concentrated likelihood for regression models
//! with ARIMA errors.
//!
//! | Crate | Re-exported as | Contents |
//! |-------|----------------|----------|
//! | `kalmar-linalg` | [`linalg`] | Cholesky, Householder QR, Givens rotations |
//! | `kalmar-arima` | [`arima`] | polynomials, ARIMA models, the stationary ARMA filter |
//! | `kalmar-ssf` | [`ssf`] | state-space forms, ordinary/diffuse filters, smoother |
//! | `kalmar-regarima` | [`regarima`] | concentrated likelihood, estimation |
//!
//! This crate adds the TOML configuration ([`KalmarConfig`]) and the
//! `tracing` subscriber setup ([`logging::init`]).

mod config;
mod convert;
mod error;
pub mod logging;

pub use config::{DiffuseToml, EstimationToml, KalmarConfig, LikelihoodToml};
pub use convert::{
    build_diffuse_config, build_estimation_config, build_likelihood_config, parse_strategy,
};
pub use error::ConfigError;

pub use kalmar_arima as arima;
pub use kalmar_linalg as linalg;
pub use kalmar_regarima as regarima;
pub use kalmar_ssf as ssf;
