//! Pure conversion functions: TOML config structs -> crate API config types.

use kalmar_regarima::{ConcentratedLikelihoodConfig, EstimationConfig};
use kalmar_ssf::{DiffuseConfig, DiffuseStrategy};

use crate::config::*;
use crate::error::ConfigError;

/// Parses a diffuse strategy name into the corresponding enum variant.
pub fn parse_strategy(s: &str) -> Result<DiffuseStrategy, ConfigError> {
    match s.to_lowercase().as_str() {
        "collapsing" => Ok(DiffuseStrategy::Collapsing),
        "augmented" => Ok(DiffuseStrategy::Augmented),
        other => Err(ConfigError::UnknownStrategy(other.to_string())),
    }
}

pub fn build_likelihood_config(
    likelihood: &LikelihoodToml,
) -> Result<ConcentratedLikelihoodConfig, ConfigError> {
    let config = ConcentratedLikelihoodConfig::new()
        .with_scaling(likelihood.scaling)
        .with_rank_tolerance(likelihood.rank_tolerance);
    config.validate()?;
    Ok(config)
}

pub fn build_diffuse_config(diffuse: &DiffuseToml) -> Result<DiffuseConfig, ConfigError> {
    let config = DiffuseConfig::new()
        .with_strategy(parse_strategy(&diffuse.strategy)?)
        .with_collapse_tolerance(diffuse.collapse_tolerance)
        .with_zero_variance_tolerance(diffuse.zero_variance_tolerance);
    config.validate().map_err(ConfigError::Diffuse)?;
    Ok(config)
}

/// Estimation settings, with the `[likelihood]` section used for every
/// evaluation.
pub fn build_estimation_config(config: &KalmarConfig) -> Result<EstimationConfig, ConfigError> {
    let estimation = EstimationConfig::new()
        .with_max_iters(config.estimation.max_iters)
        .with_simplex_step(config.estimation.simplex_step)
        .with_sd_tolerance(config.estimation.sd_tolerance)
        .with_likelihood(build_likelihood_config(&config.likelihood)?);
    estimation.validate()?;
    Ok(estimation)
}
