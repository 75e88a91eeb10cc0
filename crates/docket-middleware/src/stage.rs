//! The stage trait.
//!
//! A stage is one step of a dispatch call. It receives the flattened batch,
//! the phase tag and the extras, and either succeeds or aborts the call.
//!
//! # Invariants
//!
//! - Stages process batch items in order
//! - The first item error aborts the stage and is returned unchanged
//! - Mutations already applied to earlier items are never undone
//!
//! # Example
//!
//! ```
//! use docket_core::{Batch, OperationContext, Phase, PipelineResult};
//! use docket_middleware::{Extras, Stage};
//!
//! struct CountingStage;
//!
//! impl Stage for CountingStage {
//!     fn name(&self) -> &'static str {
//!         "counting"
//!     }
//!
//!     fn process(
//!         &self,
//!         _ctx: &OperationContext,
//!         batch: &mut Batch<'_>,
//!         phase: Phase,
//!         _extras: &mut Extras<'_>,
//!     ) -> PipelineResult<()> {
//!         tracing::debug!(%phase, items = batch.len(), "counted");
//!         Ok(())
//!     }
//! }
//! ```

use crate::extras::Extras;
use docket_core::{Batch, OperationContext, Phase, PipelineResult};
use std::fmt;

/// One step of the dispatch pipeline.
///
/// Stages are shared between threads and must not keep per-call state.
pub trait Stage: Send + Sync + 'static {
    /// Returns the unique name of this stage.
    ///
    /// This name is used for logging, metrics, and debugging.
    fn name(&self) -> &'static str;

    /// Processes one dispatch call.
    ///
    /// # Errors
    ///
    /// The returned error aborts the dispatch call; later stages do not run.
    fn process(
        &self,
        ctx: &OperationContext,
        batch: &mut Batch<'_>,
        phase: Phase,
        extras: &mut Extras<'_>,
    ) -> PipelineResult<()>;
}

/// A stage built from a closure.
///
/// # Example
///
/// ```
/// use docket_core::{Phase, PipelineError};
/// use docket_middleware::{FnStage, Pipeline};
///
/// let pipeline = Pipeline::new();
/// pipeline.register(FnStage::new("no_removals", |_ctx, _batch, phase, _extras| {
///     if phase == Phase::BeforeRemove {
///         return Err(PipelineError::stage("no_removals", "removals are disabled"));
///     }
///     Ok(())
/// }));
/// assert_eq!(pipeline.stage_names().last(), Some(&"no_removals"));
/// ```
pub struct FnStage<F> {
    name: &'static str,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&OperationContext, &mut Batch<'_>, Phase, &mut Extras<'_>) -> PipelineResult<()>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based stage.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Stage for FnStage<F>
where
    F: Fn(&OperationContext, &mut Batch<'_>, Phase, &mut Extras<'_>) -> PipelineResult<()>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(
        &self,
        ctx: &OperationContext,
        batch: &mut Batch<'_>,
        phase: Phase,
        extras: &mut Extras<'_>,
    ) -> PipelineResult<()> {
        (self.func)(ctx, batch, phase, extras)
    }
}

impl<F> fmt::Debug for FnStage<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::{OperationKind, PipelineError, Shape};

    #[test]
    fn test_fn_stage_name_and_call() {
        let stage = FnStage::new("reject_queries", |_ctx, _batch, phase, _extras| {
            if phase == Phase::BeforeQuery {
                Err(PipelineError::stage("reject_queries", "read only"))
            } else {
                Ok(())
            }
        });
        assert_eq!(stage.name(), "reject_queries");

        let ctx = OperationContext::new(OperationKind::Query);
        let mut batch = Batch::new(Shape::Opaque);
        let mut extras = Extras::new();

        assert!(stage
            .process(&ctx, &mut batch, Phase::AfterQuery, &mut extras)
            .is_ok());
        let err = stage
            .process(&ctx, &mut batch, Phase::BeforeQuery, &mut extras)
            .unwrap_err();
        assert_eq!(err.to_string(), "stage `reject_queries` failed: read only");
    }
}
