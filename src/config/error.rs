//! Errors raised while loading a clock configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading a [`ClockConfig`](super::ClockConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read clock config '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Inline YAML did not parse.
    #[error("malformed clock config: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The config file did not parse.
    #[error("malformed clock config '{path}': {source}")]
    YamlFileError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A setting is out of range.
    #[error("invalid clock config: {0}")]
    InvalidConfig(String),
}
