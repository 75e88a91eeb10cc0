//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade. No exporter is installed here:
//! without a global recorder every call is a no-op.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `docket_dispatch_total` | Counter | `phase`, `outcome` | Dispatch calls |
//! | `docket_dispatch_items` | Histogram | `phase` | Documents per dispatch |
//! | `docket_stage_failures_total` | Counter | `stage`, `category` | Stage aborts |

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Dispatch counter name.
pub const DISPATCH_TOTAL: &str = "docket_dispatch_total";

/// Batch size histogram name.
pub const DISPATCH_ITEMS: &str = "docket_dispatch_items";

/// Stage failure counter name.
pub const STAGE_FAILURES_TOTAL: &str = "docket_stage_failures_total";

/// Outcome of a dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every stage succeeded.
    Ok,
    /// A stage or the normalizer returned an error.
    Error,
}

impl Outcome {
    /// Returns the label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Registers descriptions for all pipeline metrics.
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Total number of pipeline dispatch calls");
    describe_histogram!(
        DISPATCH_ITEMS,
        Unit::Count,
        "Number of documents flattened per dispatch call"
    );
    describe_counter!(
        STAGE_FAILURES_TOTAL,
        "Total number of dispatch calls aborted by a stage"
    );
}

/// Records a completed dispatch call.
pub fn record_dispatch(phase: &'static str, outcome: Outcome, items: usize) {
    counter!(DISPATCH_TOTAL, "phase" => phase, "outcome" => outcome.as_str()).increment(1);
    histogram!(DISPATCH_ITEMS, "phase" => phase).record(items as f64);
}

/// Records a stage abort.
pub fn record_stage_failure(stage: &'static str, category: &'static str) {
    counter!(STAGE_FAILURES_TOTAL, "stage" => stage, "category" => category).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Ok.as_str(), "ok");
        assert_eq!(Outcome::Error.as_str(), "error");
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder is installed, so these are no-ops.
        describe_metrics();
        record_dispatch("before_insert", Outcome::Ok, 3);
        record_stage_failure("hook_dispatch", "hook");
    }
}
