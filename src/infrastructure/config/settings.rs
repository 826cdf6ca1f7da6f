//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings. Every
//! section is optional and falls back to its defaults.
//!
//! # Example
//!
//! ```no_run
//! use order_sync::infrastructure::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("order-sync.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::sync::SyncConfig;
use crate::error::{ConfigError, Result};

/// Main configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Bootstrap and change-feed settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.sync.validate()?;
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.sync.status, "pending");
        assert_eq!(config.sync.notify_capacity, 64);
        assert!(config.sync.tenant_id.is_none());
        assert!(!config.sync.subscribe_created);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse_toml(
            r#"
[logging]
level = "debug"
format = "json"

[sync]
tenant_id = "t-1"
status = "delivering"
full = true
subscribe_created = true
"#,
        )
        .unwrap();

        assert_eq!(config.logging.format, "json");
        assert_eq!(config.sync.tenant_id.as_deref(), Some("t-1"));
        assert_eq!(config.sync.status, "delivering");
        assert!(config.sync.full);
        assert!(config.sync.subscribe_created);
        assert!(!config.sync.watch_collection);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = Config::parse_toml("[sync]\nnotify_capacity = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "notify_capacity",
                ..
            }))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = Config::parse_toml("[sync\n");
        assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
    }
}
