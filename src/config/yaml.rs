//! YAML configuration parsing.
//!
//! Parses clock settings from YAML files.

use std::path::Path;

use super::error::ConfigError;
use super::types::ClockConfig;

/// YAML configuration loader.
pub struct YamlLoader;

impl YamlLoader {
    /// Load clock configuration from a file.
    pub fn load_clock_config(path: impl AsRef<Path>) -> Result<ClockConfig, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ClockConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlFileError {
                path: path.to_path_buf(),
                source,
            })?;
        Self::validate_clock_config(&config)?;
        Ok(config)
    }

    /// Parse clock configuration from a YAML string.
    pub fn parse_clock_config(yaml: &str) -> Result<ClockConfig, ConfigError> {
        let config: ClockConfig = serde_yaml::from_str(yaml)?;
        Self::validate_clock_config(&config)?;
        Ok(config)
    }

    /// Validate a clock configuration.
    fn validate_clock_config(config: &ClockConfig) -> Result<(), ConfigError> {
        if config.name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("name must not be empty".into()));
        }

        if config.dispatch_batch == 0 {
            return Err(ConfigError::InvalidConfig(
                "dispatch_batch must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
