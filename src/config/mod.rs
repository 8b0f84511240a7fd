//! Configuration loading and parsing.
//!
//! This module provides YAML-based configuration for clock settings.

mod error;
mod types;
mod yaml;

pub use error::ConfigError;
pub use types::{ClockConfig, DEFAULT_DISPATCH_BATCH, DEFAULT_SHUTDOWN_TIMEOUT};
pub use yaml::YamlLoader;
