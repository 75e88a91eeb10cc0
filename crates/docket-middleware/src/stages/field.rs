//! Field injection stage.
//!
//! Writes bookkeeping fields according to the phase:
//!
//! | Phase | Create time | Update time | Identifier |
//! |---|---|---|---|
//! | `BeforeInsert` | overwritten | overwritten | assigned if nil |
//! | `BeforeUpsert` | set if zero | overwritten | assigned if nil |
//! | `BeforeUpdate`, `BeforeReplace` | untouched | overwritten | untouched |
//! | any other | untouched | untouched | untouched |
//!
//! Per document the order is: default fields, then custom roles (create,
//! update, identifier), then the [`IdentifierHolder`] slot. All documents of
//! one call receive the same clock reading.
//!
//! [`IdentifierHolder`]: docket_core::IdentifierHolder

use crate::clock::{Clock, MonotonicClock};
use crate::extras::Extras;
use crate::pipeline::BuiltinStage;
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use docket_core::{
    Batch, Capabilities, Document, DocumentId, FieldMut, FieldRole, OperationContext, Phase,
    PipelineError, PipelineResult,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Injection {
    /// Document-creating write: every role.
    Create,
    /// Write that may create or overwrite: every role, but an existing
    /// create time is kept.
    Upsert,
    /// Write to an existing document: update time only.
    Refresh,
}

impl Injection {
    const fn for_phase(phase: Phase) -> Option<Self> {
        match phase {
            Phase::BeforeInsert => Some(Self::Create),
            Phase::BeforeUpsert => Some(Self::Upsert),
            Phase::BeforeUpdate | Phase::BeforeReplace => Some(Self::Refresh),
            _ => None,
        }
    }

    fn covers(self, role: FieldRole) -> bool {
        self != Self::Refresh || role == FieldRole::UpdateTime
    }

    fn assigns_identifier(self) -> bool {
        self != Self::Refresh
    }

    /// Returns true if the create time is written, given whether it still
    /// holds its zero value.
    const fn overwrites_create_time(self, is_zero: bool) -> bool {
        match self {
            Self::Create => true,
            Self::Upsert => is_zero,
            Self::Refresh => false,
        }
    }
}

/// Injects default and custom bookkeeping fields.
///
/// A custom role that names a missing field, or a field of a type the role
/// cannot hold, is skipped with a `debug` log. In strict mode it fails the
/// call with [`PipelineError::FieldMismatch`] instead.
#[derive(Clone)]
pub struct FieldInjectionStage {
    clock: Arc<dyn Clock>,
    strict: bool,
}

impl FieldInjectionStage {
    /// Creates a permissive stage backed by a [`MonotonicClock`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock::new()))
    }

    /// Creates a permissive stage backed by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            strict: false,
        }
    }

    /// Sets strict field mode.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn inject(
        &self,
        doc: &mut dyn Document,
        injection: Injection,
        now: DateTime<Utc>,
    ) -> PipelineResult<()> {
        if !Capabilities::detect(doc).injects_fields() {
            return Ok(());
        }

        if let Some(defaults) = doc.as_default_fields() {
            if injection.overwrites_create_time(defaults.create_time_is_zero()) {
                defaults.set_create_time(now);
            }
            defaults.set_update_time(now);
        }

        if let Some(roles) = doc.as_custom_fields().map(|fields| fields.custom_fields()) {
            for (role, field) in roles.roles().filter(|(role, _)| injection.covers(*role)) {
                self.apply_role(doc, injection, role, field, now)?;
            }
        }

        if injection.assigns_identifier() {
            if let Some(holder) = doc.as_identifier() {
                let id = holder.identifier_mut();
                if id.is_nil() {
                    *id = DocumentId::new();
                }
            }
        }

        Ok(())
    }

    fn apply_role(
        &self,
        doc: &mut dyn Document,
        injection: Injection,
        role: FieldRole,
        field: &str,
        now: DateTime<Utc>,
    ) -> PipelineResult<()> {
        let type_name = doc.type_name();
        let applied = match (role, doc.field_mut(field)) {
            (_, None) => Err("no such field".to_string()),
            (FieldRole::CreateTime, Some(FieldMut::Timestamp(slot))) => {
                if injection.overwrites_create_time(*slot == DateTime::<Utc>::default()) {
                    *slot = now;
                }
                Ok(())
            }
            (FieldRole::CreateTime, Some(FieldMut::UnixSeconds(slot))) => {
                if injection.overwrites_create_time(*slot == 0) {
                    *slot = now.timestamp();
                }
                Ok(())
            }
            (FieldRole::UpdateTime, Some(FieldMut::Timestamp(slot))) => {
                *slot = now;
                Ok(())
            }
            (FieldRole::UpdateTime, Some(FieldMut::UnixSeconds(slot))) => {
                *slot = now.timestamp();
                Ok(())
            }
            (FieldRole::Identifier, Some(FieldMut::Id(slot))) => {
                if slot.is_nil() {
                    *slot = DocumentId::new();
                }
                Ok(())
            }
            (FieldRole::Identifier, Some(FieldMut::Text(slot))) => {
                if slot.is_empty() {
                    *slot = DocumentId::new().to_string();
                }
                Ok(())
            }
            (role, Some(slot)) => Err(format!(
                "a {} field cannot hold the {role} role",
                slot.type_label()
            )),
        };

        match applied {
            Ok(()) => Ok(()),
            Err(reason) if self.strict => {
                Err(PipelineError::field_mismatch(type_name, field, reason))
            }
            Err(reason) => {
                debug!(type_name, field, %role, %reason, "custom field skipped");
                Ok(())
            }
        }
    }
}

impl Default for FieldInjectionStage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FieldInjectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInjectionStage")
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

impl Stage for FieldInjectionStage {
    fn name(&self) -> &'static str {
        BuiltinStage::FieldInjection.name()
    }

    fn process(
        &self,
        _ctx: &OperationContext,
        batch: &mut Batch<'_>,
        phase: Phase,
        _extras: &mut Extras<'_>,
    ) -> PipelineResult<()> {
        let Some(injection) = Injection::for_phase(phase) else {
            return Ok(());
        };
        if batch.is_empty() {
            return Ok(());
        }

        let now = self.clock.now();
        for doc in batch.items_mut() {
            self.inject(&mut **doc, injection, now)?;
        }
        Ok(())
    }
}
