//! The stage registry and dispatch entry point.
//!
//! A [`Pipeline`] is an ordered, append-only list of stages. It is seeded
//! with the built-in stages in a fixed order:
//!
//! 1. **Hook Dispatch** - Call the `LifecycleHook` method matching the phase
//! 2. **Field Injection** - Write bookkeeping timestamps and identifiers
//! 3. **Validation** - Check declared constraints (only when enabled)
//!
//! Custom stages are appended after the built-ins, either through the
//! builder or with [`Pipeline::register`] at any later point.
//!
//! ## Dispatch
//!
//! Every dispatch call normalizes its input once, then hands the same batch
//! to each stage in registry order. The first stage error aborts the call and
//! is returned unchanged. Mutations that earlier stages (or earlier items)
//! already applied are kept.

use crate::clock::{Clock, MonotonicClock};
use crate::extras::Extras;
use crate::stage::Stage;
use crate::stages::{FieldInjectionStage, HookDispatchStage, ValidationStage};
use docket_config::PipelineConfig;
use docket_core::{
    Batch, Capabilities, Input, OperationContext, Phase, PipelineError, PipelineResult, ShapeLimits,
};
use docket_telemetry::{record_dispatch, record_stage_failure, Outcome};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, debug_span, field, trace, Level};

/// A type-erased stage that can be stored in the registry.
pub type BoxedStage = Arc<dyn Stage>;

/// The document lifecycle pipeline.
///
/// Cheap to share: wrap it in an [`Arc`] and hand it to every operation
/// call site. Registration takes a write lock; dispatch only holds the read
/// lock long enough to copy the stage list, so hooks never run under it.
///
/// # Example
///
/// ```
/// use docket_core::{DefaultFields, OperationContext, OperationKind, Phase};
/// use docket_macros::Document;
/// use docket_middleware::Pipeline;
///
/// #[derive(Debug, Default, Document)]
/// struct User {
///     #[docket(embed)]
///     base: DefaultFields,
///     name: String,
/// }
///
/// let pipeline = Pipeline::new();
/// let ctx = OperationContext::new(OperationKind::Insert);
/// let mut user = User::default();
///
/// pipeline.dispatch(&ctx, &mut user, Phase::BeforeInsert).unwrap();
/// assert!(!user.base.id.is_nil());
/// assert_eq!(user.base.create_at, user.base.update_at);
/// ```
pub struct Pipeline {
    stages: RwLock<Vec<BoxedStage>>,
    limits: ShapeLimits,
    reject_value_shapes: bool,
}

impl Pipeline {
    /// Creates a pipeline with the default built-in stages.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Creates a pipeline from the `[pipeline]` configuration section.
    ///
    /// # Example
    ///
    /// ```
    /// use docket_config::PipelineConfig;
    /// use docket_middleware::Pipeline;
    ///
    /// let config = PipelineConfig {
    ///     validation: true,
    ///     ..Default::default()
    /// };
    /// let pipeline = Pipeline::from_config(&config);
    /// assert_eq!(
    ///     pipeline.stage_names(),
    ///     vec!["hook_dispatch", "field_injection", "validation"]
    /// );
    /// ```
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        PipelineBuilder::from_config(config).build()
    }

    /// Appends a stage after every stage registered so far.
    pub fn register<S: Stage>(&self, stage: S) {
        self.register_boxed(Arc::new(stage));
    }

    /// Appends an already shared stage.
    pub fn register_boxed(&self, stage: BoxedStage) {
        debug!(stage = stage.name(), "registering stage");
        self.stages.write().push(stage);
    }

    /// Runs every stage for one phase.
    ///
    /// # Errors
    ///
    /// Returns the normalizer's shape error, or the first stage error.
    pub fn dispatch<'a>(
        &self,
        ctx: &OperationContext,
        input: impl Into<Input<'a>>,
        phase: Phase,
    ) -> PipelineResult<()> {
        self.dispatch_with(ctx, input, phase, &mut Extras::new())
    }

    /// Runs every stage for one phase, passing `extras` to each of them.
    ///
    /// # Errors
    ///
    /// Returns the normalizer's shape error, or the first stage error.
    pub fn dispatch_with<'a>(
        &self,
        ctx: &OperationContext,
        input: impl Into<Input<'a>>,
        phase: Phase,
        extras: &mut Extras<'_>,
    ) -> PipelineResult<()> {
        let mut input = input.into();
        let span = debug_span!(
            "dispatch",
            operation_id = %ctx.operation_id(),
            phase = phase.name(),
            shape = input.shape().name(),
            items = field::Empty,
        );
        let _guard = span.enter();

        let mut items = 0;
        let result = self.normalize(&mut input, phase).and_then(|mut batch| {
            items = batch.len();
            span.record("items", items);
            trace_capabilities(&mut batch);
            self.run_stages(ctx, &mut batch, phase, extras)
        });

        let outcome = if result.is_ok() {
            Outcome::Ok
        } else {
            Outcome::Error
        };
        record_dispatch(phase.name(), outcome, items);
        result
    }

    fn normalize<'i>(&self, input: &'i mut Input<'_>, phase: Phase) -> PipelineResult<Batch<'i>> {
        if self.reject_value_shapes && phase.is_before() && input.is_owned() {
            return Err(PipelineError::unsupported_shape(
                input.shape(),
                "field mutations on a value would be discarded; pass a mutable reference",
            ));
        }
        input.normalize(&self.limits)
    }

    fn run_stages(
        &self,
        ctx: &OperationContext,
        batch: &mut Batch<'_>,
        phase: Phase,
        extras: &mut Extras<'_>,
    ) -> PipelineResult<()> {
        for stage in self.snapshot() {
            if let Err(err) = stage.process(ctx, batch, phase, extras) {
                let category = err.category().as_str();
                debug!(stage = stage.name(), category, error = %err, "stage aborted dispatch");
                record_stage_failure(stage.name(), category);
                return Err(err);
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<BoxedStage> {
        self.stages.read().clone()
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.read().iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.read().len()
    }

    /// Returns the limits applied when normalizing inputs.
    #[must_use]
    pub const fn limits(&self) -> ShapeLimits {
        self.limits
    }
}

fn trace_capabilities(batch: &mut Batch<'_>) {
    if !tracing::enabled!(Level::TRACE) {
        return;
    }
    for (index, doc) in batch.items_mut().iter_mut().enumerate() {
        let type_name = doc.type_name();
        let capabilities = Capabilities::detect(&mut **doc);
        trace!(index, type_name, %capabilities, "normalized item");
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("limits", &self.limits)
            .field("reject_value_shapes", &self.reject_value_shapes)
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
///
/// The built-in stages are always present and always first; the builder
/// only tunes them and appends custom stages.
pub struct PipelineBuilder {
    stages: Vec<BoxedStage>,
    validation: bool,
    strict_fields: bool,
    reject_value_shapes: bool,
    limits: ShapeLimits,
    clock: Arc<dyn Clock>,
}

impl PipelineBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            validation: false,
            strict_fields: false,
            reject_value_shapes: false,
            limits: ShapeLimits::default(),
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    /// Creates a builder from the `[pipeline]` configuration section.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        let builder = Self::new()
            .strict_fields(config.strict_fields)
            .reject_value_shapes(config.reject_value_shapes)
            .max_depth(config.max_nesting_depth);
        if config.validation {
            builder.with_validation()
        } else {
            builder
        }
    }

    /// Registers the validation stage after the default stages.
    #[must_use]
    pub fn with_validation(mut self) -> Self {
        self.validation = true;
        self
    }

    /// Fails dispatch calls on custom field mismatches instead of skipping.
    #[must_use]
    pub fn strict_fields(mut self, strict: bool) -> Self {
        self.strict_fields = strict;
        self
    }

    /// Rejects value-shaped inputs in `Before*` phases.
    #[must_use]
    pub fn reject_value_shapes(mut self, reject: bool) -> Self {
        self.reject_value_shapes = reject;
        self
    }

    /// Sets the maximum number of nested vector levels.
    ///
    /// A plain vector is one level, so values below 1 are raised to 1.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.limits.max_depth = max_depth.max(1);
        self
    }

    /// Sets the clock read by field injection.
    #[must_use]
    pub fn clock<C: Clock>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Appends a custom stage after the built-in stages.
    #[must_use]
    pub fn stage<S: Stage>(mut self, stage: S) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let mut stages: Vec<BoxedStage> = vec![
            Arc::new(HookDispatchStage::new().with_limits(self.limits)),
            Arc::new(FieldInjectionStage::with_clock(self.clock).strict(self.strict_fields)),
        ];
        if self.validation {
            stages.push(Arc::new(ValidationStage::new()));
        }
        stages.extend(self.stages);

        Pipeline {
            stages: RwLock::new(stages),
            limits: self.limits,
            reject_value_shapes: self.reject_value_shapes,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("custom_stages", &self.stages.len())
            .field("validation", &self.validation)
            .field("strict_fields", &self.strict_fields)
            .field("reject_value_shapes", &self.reject_value_shapes)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

/// The built-in stages, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum BuiltinStage {
    /// Stage 1: lifecycle hook dispatch
    HookDispatch = 1,
    /// Stage 2: bookkeeping field injection
    FieldInjection = 2,
    /// Stage 3: declared constraint validation (opt-in)
    Validation = 3,
}

impl BuiltinStage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HookDispatch => "hook_dispatch",
            Self::FieldInjection => "field_injection",
            Self::Validation => "validation",
        }
    }

    /// Returns true if the stage is registered without being asked for.
    #[must_use]
    pub const fn is_default(self) -> bool {
        !matches!(self, Self::Validation)
    }

    /// Returns all built-in stages in order.
    #[must_use]
    pub const fn all() -> [BuiltinStage; 3] {
        [Self::HookDispatch, Self::FieldInjection, Self::Validation]
    }
}

impl fmt::Display for BuiltinStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::FnStage;
    use docket_core::{OperationKind, Shape};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A test stage that records its invocation order.
    struct OrderTrackingStage {
        name: &'static str,
        order: Arc<parking_lot::Mutex<Vec<&'static str>>>,
    }

    impl Stage for OrderTrackingStage {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process(
            &self,
            _ctx: &OperationContext,
            _batch: &mut Batch<'_>,
            _phase: Phase,
            _extras: &mut Extras<'_>,
        ) -> PipelineResult<()> {
            self.order.lock().push(self.name);
            Ok(())
        }
    }

    #[test]
    fn test_default_stages() {
        let pipeline = Pipeline::new();
        assert_eq!(pipeline.stage_names(), vec!["hook_dispatch", "field_injection"]);
        assert_eq!(pipeline.stage_count(), 2);
    }

    #[test]
    fn test_custom_stages_run_in_registration_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .with_validation()
            .stage(OrderTrackingStage {
                name: "first",
                order: Arc::clone(&order),
            })
            .build();
        pipeline.register(OrderTrackingStage {
            name: "second",
            order: Arc::clone(&order),
        });

        assert_eq!(
            pipeline.stage_names(),
            vec!["hook_dispatch", "field_injection", "validation", "first", "second"]
        );

        let ctx = OperationContext::new(OperationKind::Query);
        let filter = serde_json::json!({});
        pipeline.dispatch(&ctx, &filter, Phase::BeforeQuery).unwrap();
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_first_stage_error_stops_later_stages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let pipeline = Pipeline::builder()
            .stage(FnStage::new("deny", |_ctx, _batch, _phase, _extras| {
                Err(PipelineError::stage("deny", "denied"))
            }))
            .stage(FnStage::new("count", move |_ctx, _batch, _phase, _extras| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .build();

        let ctx = OperationContext::new(OperationKind::Remove);
        let filter = serde_json::json!({"_id": 1});
        let err = pipeline
            .dispatch(&ctx, &filter, Phase::BeforeRemove)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Stage { stage: "deny", .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config() {
        let config = PipelineConfig {
            validation: true,
            strict_fields: true,
            reject_value_shapes: true,
            max_nesting_depth: 4,
        };
        let pipeline = Pipeline::from_config(&config);
        assert_eq!(pipeline.stage_count(), 3);
        assert_eq!(pipeline.limits().max_depth, 4);
        assert!(pipeline.reject_value_shapes);
    }

    #[test]
    fn test_value_rejection_only_in_before_phases() {
        let pipeline = Pipeline::builder().reject_value_shapes(true).build();
        let ctx = OperationContext::new(OperationKind::Insert);

        let err = pipeline
            .dispatch(&ctx, Input::value(vec![serde_json::json!({})]), Phase::BeforeInsert)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnsupportedShape {
                shape: Shape::Slice,
                ..
            }
        ));

        assert!(pipeline
            .dispatch(&ctx, Input::value(serde_json::json!({})), Phase::AfterInsert)
            .is_ok());
    }

    #[test]
    fn test_zero_max_depth_still_accepts_flat_vectors() {
        let pipeline = Pipeline::builder().max_depth(0).build();
        assert_eq!(pipeline.limits().max_depth, 1);

        let ctx = OperationContext::new(OperationKind::Remove);
        let mut filters = vec![serde_json::json!({"_id": 1}), serde_json::json!({"_id": 2})];
        pipeline
            .dispatch(&ctx, &mut filters, Phase::BeforeRemove)
            .unwrap();

        let mut nested = vec![filters];
        let err = pipeline
            .dispatch(&ctx, &mut nested, Phase::BeforeRemove)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnsupportedShape {
                shape: Shape::NestedSlice,
                ..
            }
        ));
    }

    #[test]
    fn test_builtin_stage_ordering() {
        assert!(BuiltinStage::HookDispatch < BuiltinStage::FieldInjection);
        assert!(BuiltinStage::FieldInjection < BuiltinStage::Validation);
        assert!(BuiltinStage::HookDispatch.is_default());
        assert!(!BuiltinStage::Validation.is_default());
        assert_eq!(
            BuiltinStage::all().map(BuiltinStage::name),
            ["hook_dispatch", "field_injection", "validation"]
        );
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
