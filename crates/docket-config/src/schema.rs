//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use docket_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Largest accepted `max_nesting_depth`.
pub const MAX_NESTING_DEPTH_LIMIT: usize = 256;

/// Pipeline configuration section.
///
/// Controls which built-in stages are registered and how strictly the
/// pipeline treats inputs it cannot fully process.
///
/// # Example
///
/// ```
/// use docket_config::PipelineConfig;
///
/// let config = PipelineConfig {
///     validation: true,
///     ..Default::default()
/// };
/// assert!(!config.strict_fields);
/// assert_eq!(config.max_nesting_depth, 32);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Register the validation stage after the built-in stages.
    #[serde(default)]
    pub validation: bool,

    /// Fail with a field mismatch instead of skipping a custom field that
    /// cannot be written.
    #[serde(default)]
    pub strict_fields: bool,

    /// Reject inputs handed over by value in Before phases, where field
    /// mutations would be lost.
    #[serde(default)]
    pub reject_value_shapes: bool,

    /// Maximum number of nested vector levels accepted by the normalizer.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validation: false,
            strict_fields: false,
            reject_value_shapes: false,
            max_nesting_depth: default_max_nesting_depth(),
        }
    }
}

fn default_max_nesting_depth() -> usize {
    32
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g. "info", "docket_middleware=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into the telemetry crate's logging settings.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let json_format = self.format == LogFormat::Json;
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format,
            span_events: !json_format,
            file_line_info: self.include_location,
            include_target: true,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        config.to_log_config()
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
