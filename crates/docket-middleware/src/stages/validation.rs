//! Declared constraint validation.
//!
//! Runs after hook dispatch and field injection, so constraints see the
//! document exactly as it will be written.
//!
//! # Pipeline Position
//!
//! ```text
//! HookDispatch → FieldInjection → [Validation] → (custom stages)
//! ```
//!
//! Only whole-document writes are checked (`BeforeInsert`, `BeforeUpsert`,
//! `BeforeReplace`). A partial update carries no complete document to check.

use crate::extras::{Extras, SkipValidation};
use crate::pipeline::BuiltinStage;
use crate::stage::Stage;
use docket_core::{Batch, OperationContext, Phase, PipelineResult};
use tracing::debug;

/// Checks [`Validate`](docket_core::Validate) constraints on every item.
///
/// Disabled for one call by passing [`SkipValidation`] in the extras.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationStage;

impl ValidationStage {
    /// Creates the validation stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Stage for ValidationStage {
    fn name(&self) -> &'static str {
        BuiltinStage::Validation.name()
    }

    fn process(
        &self,
        _ctx: &OperationContext,
        batch: &mut Batch<'_>,
        phase: Phase,
        extras: &mut Extras<'_>,
    ) -> PipelineResult<()> {
        if !phase.writes_whole_document() {
            return Ok(());
        }
        if extras.has_setting::<SkipValidation>() {
            debug!(%phase, "validation skipped by caller");
            return Ok(());
        }

        for doc in batch.items_mut() {
            let type_name = doc.type_name();
            let Some(rules) = doc.as_validate() else {
                continue;
            };
            if let Err(err) = rules.validate() {
                debug!(type_name, field = %err.field, rule = %err.rule, "validation failed");
                return Err(err.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::{Input, OperationKind, PipelineError, Rule, ShapeLimits};
    use docket_macros::Document;

    #[derive(Debug, Document)]
    struct Signup {
        #[validate(required, email)]
        email: String,
        #[validate(range(min = 13))]
        age: u8,
    }

    impl Signup {
        fn ok() -> Self {
            Self {
                email: "grace@example.com".to_string(),
                age: 40,
            }
        }
    }

    fn run(input: &mut Input<'_>, phase: Phase, extras: &mut Extras<'_>) -> PipelineResult<()> {
        let ctx = OperationContext::new(OperationKind::Insert);
        let mut batch = input.normalize(&ShapeLimits::default())?;
        ValidationStage::new().process(&ctx, &mut batch, phase, extras)
    }

    #[test]
    fn test_valid_batch_passes() {
        let mut docs = vec![Signup::ok(), Signup::ok()];
        assert!(run(&mut Input::from(&mut docs), Phase::BeforeInsert, &mut Extras::new()).is_ok());
    }

    #[test]
    fn test_first_violation_returned() {
        let mut docs = vec![
            Signup::ok(),
            Signup {
                age: 9,
                ..Signup::ok()
            },
            Signup {
                email: "nope".to_string(),
                ..Signup::ok()
            },
        ];
        let err = run(&mut Input::from(&mut docs), Phase::BeforeReplace, &mut Extras::new())
            .unwrap_err();

        let violation = err.as_validation().unwrap();
        assert_eq!(violation.field, "age");
        assert_eq!(violation.rule, Rule::Range);
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn test_partial_and_after_phases_unchecked() {
        let mut doc = Signup {
            age: 1,
            ..Signup::ok()
        };
        for phase in [Phase::BeforeUpdate, Phase::AfterInsert, Phase::BeforeQuery] {
            assert!(run(&mut Input::from(&mut doc), phase, &mut Extras::new()).is_ok());
        }
        assert!(run(&mut Input::from(&mut doc), Phase::BeforeUpsert, &mut Extras::new()).is_err());
    }

    #[test]
    fn test_skip_setting() {
        let mut doc = Signup {
            email: String::new(),
            ..Signup::ok()
        };
        let mut extras = Extras::new().with_setting(SkipValidation);
        assert!(run(&mut Input::from(&mut doc), Phase::BeforeInsert, &mut extras).is_ok());
    }
}
