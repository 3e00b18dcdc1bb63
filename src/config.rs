use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level Kalmar configuration.
///
/// ```toml
/// verbosity = 1
///
/// [likelihood]
/// scaling = true
///
/// [diffuse]
/// strategy = "augmented"
///
/// [estimation]
/// max_iters = 500
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KalmarConfig {
    /// Log verbosity (0 warn, 1 info, 2 debug, 3+ trace).
    #[serde(default)]
    pub verbosity: u8,

    /// Concentrated likelihood settings.
    #[serde(default)]
    pub likelihood: LikelihoodToml,

    /// Diffuse filter settings.
    #[serde(default)]
    pub diffuse: DiffuseToml,

    /// Nelder-Mead settings.
    #[serde(default)]
    pub estimation: EstimationToml,
}

impl KalmarConfig {
    /// Parses a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&s)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LikelihoodToml {
    #[serde(default = "default_true")]
    pub scaling: bool,
    #[serde(default = "default_rank_tolerance")]
    pub rank_tolerance: f64,
}

impl Default for LikelihoodToml {
    fn default() -> Self {
        Self {
            scaling: true,
            rank_tolerance: default_rank_tolerance(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_rank_tolerance() -> f64 {
    kalmar_regarima::DEFAULT_REGRESSION_RANK_TOLERANCE
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffuseToml {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_collapse_tolerance")]
    pub collapse_tolerance: f64,
    #[serde(default = "default_zero_variance_tolerance")]
    pub zero_variance_tolerance: f64,
}

impl Default for DiffuseToml {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            collapse_tolerance: default_collapse_tolerance(),
            zero_variance_tolerance: default_zero_variance_tolerance(),
        }
    }
}

fn default_strategy() -> String {
    "collapsing".to_string()
}
fn default_collapse_tolerance() -> f64 {
    kalmar_ssf::DEFAULT_COLLAPSE_TOLERANCE
}
fn default_zero_variance_tolerance() -> f64 {
    kalmar_ssf::ZERO_VARIANCE_TOLERANCE
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimationToml {
    #[serde(default = "default_max_iters")]
    pub max_iters: u64,
    #[serde(default = "default_simplex_step")]
    pub simplex_step: f64,
    #[serde(default = "default_sd_tolerance")]
    pub sd_tolerance: f64,
}

impl Default for EstimationToml {
    fn default() -> Self {
        Self {
            max_iters: default_max_iters(),
            simplex_step: default_simplex_step(),
            sd_tolerance: default_sd_tolerance(),
        }
    }
}

fn default_max_iters() -> u64 {
    1000
}
fn default_simplex_step() -> f64 {
    0.5
}
fn default_sd_tolerance() -> f64 {
    1e-8
}
