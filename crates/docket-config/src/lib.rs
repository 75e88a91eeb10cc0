//! Typed configuration for Docket.
//!
//! This crate provides a strongly-typed configuration system with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [pipeline]
//! validation = true
//! strict_fields = false
//! reject_value_shapes = false
//! max_nesting_depth = 32
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! include_location = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! All configuration values can be overridden via environment variables using
//! the format `PREFIX__SECTION__KEY`. For example:
//!
//! - `DOCKET__PIPELINE__STRICT_FIELDS=true`
//! - `DOCKET__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/docket-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::DocketConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingConfig, PipelineConfig, MAX_NESTING_DEPTH_LIMIT};
