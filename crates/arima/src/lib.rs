//! # kalmar-arima
//!
//! ARIMA models seen from a likelihood engine: lag polynomials, the
//! autocovariances of the stationary part, differencing, the
//! forecast-function state-space form and a fast whitening filter.
//!
//! ## Layers
//!
//! ```mermaid
//! graph LR
//!     A["SarimaMapping::map(&params)?"] --> B["ArimaModel"]
//!     B -->|".stationary()"| C["ARMA part"]
//!     B -->|".delta()"| D["difference(&delta, y)"]
//!     C --> E["KalmanArmaFilter::prepare(&model, n)?"]
//!     D --> F[".apply(y, out)?"]
//!     E --> F
//! ```
//!
//! ## Conventions
//!
//! | Symbol | Accessor | Meaning |
//! |--------|----------|---------|
//! | Φ(B) | [`ArimaModel::ar()`] | stationary AR operator, `1 + a₁B + …` |
//! | Δ(B) | [`ArimaModel::delta()`] | unit-root (differencing) operator |
//! | Θ(B) | [`ArimaModel::ma()`] | MA operator, `1 + θ₁B + …` |
//! | σ² | [`ArimaModel::innovation_variance()`] | innovation variance |
//! | γ(k) | [`ArimaModel::autocovariances()`] | autocovariances of `Δ(B)·y` |

mod arma_filter;
mod autocovariance;
mod differencing;
mod error;
mod mapping;
mod model;
mod params;
mod polynomial;
mod state_space;

pub use arma_filter::{ArmaFilter, KalmanArmaFilter, STEADY_STATE_TOLERANCE};
pub use autocovariance::autocovariances;
pub use differencing::{difference, differencing_polynomial};
pub use error::ArimaError;
pub use mapping::{ArimaMapping, SarimaMapping};
pub use model::ArimaModel;
pub use params::{coeffs_to_unconstrained, unconstrained_to_coeffs};
pub use polynomial::Polynomial;
pub use state_space::ArmaStateSpace;
