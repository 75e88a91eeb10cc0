//! Main configuration types.
//!
//! This module provides the top-level [`DocketConfig`] struct.

use serde::{Deserialize, Serialize};

use crate::schema::MAX_NESTING_DEPTH_LIMIT;
use crate::{ConfigError, LogFormat, LoggingConfig, PipelineConfig};

/// Complete Docket configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use docket_config::DocketConfig;
///
/// let config = DocketConfig::default();
/// assert_eq!(config.pipeline.max_nesting_depth, 32);
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DocketConfig {
    /// Pipeline configuration.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DocketConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `pipeline.max_nesting_depth` is not in `1..=256`
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        let depth = self.pipeline.max_nesting_depth;
        if !(1..=MAX_NESTING_DEPTH_LIMIT).contains(&depth) {
            return Err(ConfigError::invalid_value(
                "pipeline.max_nesting_depth",
                format!("must be between 1 and {MAX_NESTING_DEPTH_LIMIT}, got {depth}"),
            ));
        }

        if self.logging.enabled {
            docket_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with source locations
    /// - Debug log level
    /// - Validation on, strict field mode on
    ///
    /// # Example
    ///
    /// ```
    /// use docket_config::DocketConfig;
    ///
    /// let config = DocketConfig::development();
    /// assert!(config.pipeline.strict_fields);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;

        config.pipeline.validation = true;
        config.pipeline.strict_fields = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting at info level
    /// - Validation on, permissive field mode
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;

        config.pipeline.validation = true;

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DocketConfig::default().validate().is_ok());
        assert!(DocketConfig::development().validate().is_ok());
        assert!(DocketConfig::production().validate().is_ok());
    }

    #[test]
    fn test_nesting_depth_bounds() {
        let mut config = DocketConfig::default();
        config.pipeline.max_nesting_depth = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "pipeline.max_nesting_depth"
        ));

        config.pipeline.max_nesting_depth = 257;
        assert!(config.validate().is_err());

        config.pipeline.max_nesting_depth = 256;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = DocketConfig::default();
        config.logging.level = "docket=loud".to_string();
        assert!(config.validate().is_err());

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_preset() {
        let config = DocketConfig::production();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.pipeline.validation);
        assert!(!config.pipeline.strict_fields);
    }
}
