//! Observability for Docket.
//!
//! - **Logging**: `tracing-subscriber` setup with JSON or pretty output
//! - **Metrics**: dispatch counters and histograms via the `metrics` facade
//!
//! Libraries embedding the pipeline usually install their own subscriber and
//! recorder; [`init_logging`] is for applications that do not.
//!
//! # Example
//!
//! ```rust,ignore
//! use docket_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};
pub use self::metrics::{describe_metrics, record_dispatch, record_stage_failure, Outcome};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
