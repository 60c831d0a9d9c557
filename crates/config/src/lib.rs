// Configuration Management
//
// This crate handles all configuration loading for the completion gateway.
// It provides:
// - Configuration structs and deserialization
// - File and environment loading logic
// - Default configuration values
//
// Configuration is read once at startup and shared read-only afterwards.

use std::path::Path;
use thiserror::Error;

pub mod types;

// Re-export all configuration types
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found. Tried paths: {paths}")]
    FileNotFound { paths: String },

    #[error("Failed to read configuration file: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration loading interface
impl ApiConfig {
    /// Load configuration from YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ApiConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        // Try different config locations in order
        let config_paths = ["config/config.yaml", "config.yaml", "config/default.yaml"];

        for path in &config_paths {
            if std::path::Path::new(path).exists() {
                return Self::load_from_file(path);
            }
        }

        Err(ConfigError::FileNotFound {
            paths: config_paths.join(", "),
        })
    }

    /// Load from the default file locations, falling back to environment variables
    /// when no file exists.
    pub fn load_or_env() -> Result<Self, ConfigError> {
        match Self::load() {
            Err(ConfigError::FileNotFound { .. }) => {
                let config = Self::from_env().map_err(ConfigError::Invalid)?;
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Reject configurations the gateway cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.base_url is empty".to_string()));
        }
        if self.provider.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.api_key is empty".to_string()));
        }
        if self.provider.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "provider.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.provider.stream_timeout_seconds == Some(0) {
            return Err(ConfigError::Invalid(
                "provider.stream_timeout_seconds must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}
