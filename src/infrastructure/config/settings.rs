//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; `SECTIONS_CATALOG_PATH`
//! overrides the catalog location.
//!
//! # Example
//!
//! ```no_run
//! use section_grouping::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::application::cache::CacheConfig;
use crate::application::grouping::GroupingConfig;
use crate::application::recovery::RecoveryConfig;
use crate::error::{ConfigError, Result};

/// Environment variable overriding [`CatalogConfig::path`].
pub const CATALOG_PATH_ENV: &str = "SECTIONS_CATALOG_PATH";

/// Where the screen catalog is read from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// JSON array of screen records. An unset path means an empty catalog.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Main application configuration.
///
/// Every section is optional in the TOML file and falls back to its
/// defaults. Load from a file with [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Store size, default TTL, and background task periods.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Retry count and fallback lifetime.
    #[serde(default)]
    pub recovery: RecoveryConfig,

    #[serde(default)]
    pub grouping: GroupingConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Parse and validate TOML content, then apply environment overrides.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(path) = std::env::var(CATALOG_PATH_ENV) {
            if !path.trim().is_empty() {
                config.catalog.path = Some(PathBuf::from(path));
            }
        }

        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.recovery.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_retries",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.cache.max_memory_items == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_memory_items",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.grouping.max_sections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_sections",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.cache.cleanup_interval_secs == 0 || self.cache.refresh_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache_intervals",
                reason: "cleanup and refresh intervals must be greater than 0".to_string(),
            }
            .into());
        }
        if let Some(path) = &self.catalog.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "catalog.path",
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn invalid_field(content: &str) -> Option<&'static str> {
        match Config::parse_toml(content) {
            Err(Error::Config(ConfigError::InvalidValue { field, .. })) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.grouping.max_sections, 8);
        assert_eq!(config.recovery.max_retries, 3);
        assert_eq!(config.cache.cleanup_interval_secs, 600);
        assert_eq!(config.cache.refresh_interval_secs, 300);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse_toml(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [grouping]
            max_sections = 5
            dynamic_sections = false

            [recovery]
            retry_delay_ms = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.grouping.max_sections, 5);
        assert!(!config.grouping.dynamic_sections);
        assert_eq!(config.grouping.sections_ttl_secs, 600);
        assert_eq!(config.recovery.retry_delay_ms, 10);
    }

    #[test]
    fn zero_values_are_rejected() {
        assert_eq!(
            invalid_field("[recovery]\nmax_retries = 0"),
            Some("max_retries")
        );
        assert_eq!(
            invalid_field("[cache]\nmax_memory_items = 0"),
            Some("max_memory_items")
        );
        assert_eq!(
            invalid_field("[grouping]\nmax_sections = 0"),
            Some("max_sections")
        );
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Config::parse_toml("[grouping\nmax_sections = 3"),
            Err(Error::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            Config::load("/nonexistent/section-grouping.toml"),
            Err(Error::Config(ConfigError::ReadFile(_)))
        ));
    }
}
