//! Hook dispatch stage.
//!
//! Invokes the [`LifecycleHook`] method matching the phase on every target
//! that exposes one.
//!
//! # Targets
//!
//! By default the targets are the batch items. An [`Extra::HookTarget`] in
//! the extras replaces them: the override is normalized with the same limits
//! and its documents are dispatched instead. An opaque override (a raw filter
//! map) has no documents, so nothing is called.
//!
//! [`LifecycleHook`]: docket_core::LifecycleHook
//! [`Extra::HookTarget`]: crate::Extra::HookTarget

use crate::extras::Extras;
use crate::pipeline::BuiltinStage;
use crate::stage::Stage;
use docket_core::{
    invoke_hook, Batch, Document, OperationContext, Phase, PipelineError, PipelineResult,
    ShapeLimits,
};
use tracing::debug;

/// Calls per-phase user callbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct HookDispatchStage {
    limits: ShapeLimits,
}

impl HookDispatchStage {
    /// Creates a hook stage with default shape limits for override targets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the limits used to normalize override targets.
    #[must_use]
    pub const fn with_limits(mut self, limits: ShapeLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl Stage for HookDispatchStage {
    fn name(&self) -> &'static str {
        BuiltinStage::HookDispatch.name()
    }

    fn process(
        &self,
        ctx: &OperationContext,
        batch: &mut Batch<'_>,
        phase: Phase,
        extras: &mut Extras<'_>,
    ) -> PipelineResult<()> {
        if let Some(target) = extras.hook_target_mut() {
            let mut targets = target.normalize(&self.limits)?;
            debug!(
                shape = %targets.shape(),
                items = targets.len(),
                "dispatching hooks to override target"
            );
            return dispatch_all(ctx, targets.items_mut(), phase);
        }
        dispatch_all(ctx, batch.items_mut(), phase)
    }
}

fn dispatch_all(
    ctx: &OperationContext,
    items: &mut [&mut dyn Document],
    phase: Phase,
) -> PipelineResult<()> {
    for doc in items.iter_mut() {
        let type_name = doc.type_name();
        let Some(hook) = doc.as_hook() else {
            continue;
        };
        if let Err(err) = invoke_hook(hook, phase, ctx) {
            debug!(%phase, type_name, error = %err, "hook failed");
            return Err(PipelineError::Hook(err));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::{HookResult, Input, LifecycleHook, OperationKind};
    use docket_macros::Document;

    #[derive(Debug, Default, Document)]
    #[docket(hooks)]
    struct Counter {
        calls: Vec<Phase>,
        fail_on: Option<Phase>,
    }

    impl LifecycleHook for Counter {
        fn before_insert(&mut self, _ctx: &OperationContext) -> HookResult {
            self.record(Phase::BeforeInsert)
        }

        fn after_insert(&mut self, _ctx: &OperationContext) -> HookResult {
            self.record(Phase::AfterInsert)
        }

        fn before_update(&mut self, _ctx: &OperationContext) -> HookResult {
            self.record(Phase::BeforeUpdate)
        }
    }

    impl Counter {
        fn record(&mut self, phase: Phase) -> HookResult {
            self.calls.push(phase);
            if self.fail_on == Some(phase) {
                return Err(format!("{phase} refused").into());
            }
            Ok(())
        }
    }

    fn run(input: &mut Input<'_>, phase: Phase, extras: &mut Extras<'_>) -> PipelineResult<()> {
        let ctx = OperationContext::new(phase.operation());
        let mut batch = input.normalize(&ShapeLimits::default())?;
        HookDispatchStage::new().process(&ctx, &mut batch, phase, extras)
    }

    #[test]
    fn test_dispatches_matching_phase_only() {
        let mut doc = Counter::default();
        run(&mut Input::from(&mut doc), Phase::BeforeInsert, &mut Extras::new()).unwrap();
        run(&mut Input::from(&mut doc), Phase::BeforeQuery, &mut Extras::new()).unwrap();
        assert_eq!(doc.calls, vec![Phase::BeforeInsert]);
    }

    #[test]
    fn test_first_error_stops_remaining_items() {
        let mut docs = vec![
            Counter {
                fail_on: Some(Phase::BeforeUpdate),
                ..Counter::default()
            },
            Counter::default(),
        ];
        let err = run(&mut Input::from(&mut docs), Phase::BeforeUpdate, &mut Extras::new())
            .unwrap_err();

        assert_eq!(err.to_string(), "before_update refused");
        assert_eq!(docs[0].calls, vec![Phase::BeforeUpdate]);
        assert!(docs[1].calls.is_empty());
    }

    #[test]
    fn test_override_target_replaces_batch() {
        let mut written = Counter::default();
        let mut observer = Counter::default();
        {
            let mut extras = Extras::new().with_hook_target(&mut observer);
            run(&mut Input::from(&mut written), Phase::AfterInsert, &mut extras).unwrap();
        }
        assert!(written.calls.is_empty());
        assert_eq!(observer.calls, vec![Phase::AfterInsert]);
    }

    #[test]
    fn test_opaque_override_is_a_no_op() {
        let mut written = Counter::default();
        let filter = serde_json::json!({"status": "draft"});
        let mut extras = Extras::new().with_hook_target(&filter);
        run(&mut Input::from(&mut written), Phase::BeforeInsert, &mut extras).unwrap();
        assert!(written.calls.is_empty());
    }

    #[test]
    fn test_ctx_reaches_hooks() {
        #[derive(Debug, Default, Document)]
        #[docket(hooks)]
        struct Auditor {
            seen: Option<OperationKind>,
        }

        impl LifecycleHook for Auditor {
            fn before_remove(&mut self, ctx: &OperationContext) -> HookResult {
                self.seen = Some(ctx.kind());
                Ok(())
            }
        }

        let mut doc = Auditor::default();
        run(&mut Input::from(&mut doc), Phase::BeforeRemove, &mut Extras::new()).unwrap();
        assert_eq!(doc.seen, Some(OperationKind::Remove));
    }
}
