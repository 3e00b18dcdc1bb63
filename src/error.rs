//! Error types for the kalmar crate.

use std::path::PathBuf;

use kalmar_regarima::RegArimaError;

/// Error type for reading and converting configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Returned when the configuration file cannot be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The I/O failure.
        source: std::io::Error,
    },

    /// Returned when the document is not valid TOML for [`KalmarConfig`](crate::KalmarConfig).
    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Returned for a diffuse strategy name other than `collapsing` or
    /// `augmented`.
    #[error("unknown diffuse strategy: {0:?}")]
    UnknownStrategy(String),

    /// Returned when the diffuse settings are out of range.
    #[error("invalid diffuse settings: {0}")]
    Diffuse(String),

    /// Returned when the likelihood or estimation settings are out of range.
    #[error(transparent)]
    Invalid(#[from] RegArimaError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_unknown_strategy() {
        let e = ConfigError::UnknownStrategy("exact".into());
        assert_eq!(e.to_string(), "unknown diffuse strategy: \"exact\"");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<ConfigError>();
    }
}
