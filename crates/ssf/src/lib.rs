//! # kalmar-ssf
//!
//! Linear Gaussian state-space forms and the Kalman recursions that turn a
//! series into a likelihood.
//!
//! ```text
//! y_t     = Z_t·α_t + ε_t,        ε_t ~ N(0, h_t)
//! α_{t+1} = T_t·α_t + S_t·η_t,    η_t ~ N(0, I)
//! α_0     = a_0 + B·δ + u,        u ~ N(0, P_f0), δ diffuse
//! ```
//!
//! Models are described by three capability traits ([`Initialization`],
//! [`Dynamics`], [`Measurement`]) joined in [`StateSpaceModel`]; the
//! concrete forms are gathered in the closed enum [`Ssf`].
//!
//! ## Recursions
//!
//! | Type | Initial state | Output |
//! |------|---------------|--------|
//! | [`OrdinaryFilter`] | proper | [`FilterResults`] |
//! | [`DiffuseFilter`] | diffuse (augmented, optionally collapsed) | [`FilterResults`] |
//! | [`Smoother`] | proper | [`SmoothingResults`] |
//! | [`SsfArmaFilter`] | ARMA | standardized innovations |
//!
//! A missing observation is marked by NaN. The state stored at `t` is the
//! prediction of `α_t` from `y_0..y_{t-1}`.

mod arima;
mod arma;
mod arma_filter;
mod composite;
mod diffuse;
mod error;
mod filter;
mod likelihood;
mod matrix;
mod model;
mod regression;
mod smoother;
mod ssf;
mod state;
mod structural;

pub use arima::ArimaSsf;
pub use arma::ArmaSsf;
pub use arma_filter::SsfArmaFilter;
pub use composite::CompositeSsf;
pub use diffuse::{DEFAULT_COLLAPSE_TOLERANCE, DiffuseConfig, DiffuseFilter, DiffuseStrategy};
pub use error::SsfError;
pub use filter::{FilterResults, OrdinaryFilter, ZERO_VARIANCE_TOLERANCE};
pub use likelihood::{DiffuseLikelihood, LikelihoodAccumulator};
pub use matrix::MatrixSsf;
pub use model::{Dynamics, Initialization, Measurement, StateSpaceModel};
pub use regression::{Coefficients, RegSsf};
pub use smoother::{Smoother, SmoothingResults};
pub use ssf::Ssf;
pub use state::{PredictionError, State, StepKind};
pub use structural::{LocalLevel, LocalLinearTrend, Noise, Seasonal};
