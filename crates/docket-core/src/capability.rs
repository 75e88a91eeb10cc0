//! Optional lifecycle capabilities.
//!
//! A document type opts into pipeline behavior by implementing any subset of
//! the capability traits below. The pipeline never requires a common base
//! type: it asks each [`Document`] at runtime which capabilities it exposes
//! through the `as_*` queries, and treats `None` as "not supported".
//!
//! | Capability | Used by | Effect |
//! |---|---|---|
//! | [`DefaultFieldSetter`] | field injection | fixed create/update timestamps |
//! | [`CustomFieldSetter`] | field injection | role → field-name mapping |
//! | [`IdentifierHolder`] | field injection | nil identifier is assigned |
//! | [`LifecycleHook`] | hook dispatch | per-phase callbacks |
//! | [`Validate`] | validation | declared field constraints |
//!
//! `#[derive(Document)]` from `docket-macros` wires the queries up from
//! `#[docket(...)]` attributes.

use crate::context::OperationContext;
use crate::error::{HookResult, ValidationError};
use crate::field::{CustomFields, FieldMut};
use crate::id::DocumentId;
use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// Fixed-name create/update timestamp mutators.
pub trait DefaultFieldSetter {
    /// Returns the creation timestamp.
    fn create_time(&self) -> DateTime<Utc>;

    /// Returns true while the creation timestamp holds its zero value.
    fn create_time_is_zero(&self) -> bool {
        self.create_time() == DateTime::<Utc>::default()
    }

    /// Overwrites the creation timestamp.
    fn set_create_time(&mut self, now: DateTime<Utc>);

    /// Overwrites the last-update timestamp.
    fn set_update_time(&mut self, now: DateTime<Utc>);
}

/// Maps bookkeeping roles onto fields the type declares under its own names.
pub trait CustomFieldSetter {
    /// Builds the role map. Called once per item per dispatch.
    fn custom_fields(&self) -> CustomFields;
}

/// A primary key that is filled in when still nil.
pub trait IdentifierHolder {
    /// Returns the identifier slot.
    fn identifier_mut(&mut self) -> &mut DocumentId;
}

impl IdentifierHolder for DocumentId {
    fn identifier_mut(&mut self) -> &mut DocumentId {
        self
    }
}

/// Per-phase callbacks.
///
/// Every method defaults to `Ok(())`, so a type only overrides the phases it
/// cares about. An error returned from a `before_*` method makes the caller
/// skip the store operation; an error from an `after_*` method is reported
/// even though the store change has already been committed.
#[allow(unused_variables)]
pub trait LifecycleHook {
    /// Runs before an insert.
    fn before_insert(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs after an insert.
    fn after_insert(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs before a partial update.
    fn before_update(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs after a partial update.
    fn after_update(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs before an upsert.
    fn before_upsert(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs after an upsert.
    fn after_upsert(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs before a replacement.
    fn before_replace(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs after a replacement.
    fn after_replace(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs before a query.
    fn before_query(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs after a query.
    fn after_query(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs before a removal.
    fn before_remove(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
    /// Runs after a removal.
    fn after_remove(&mut self, ctx: &OperationContext) -> HookResult {
        Ok(())
    }
}

/// Calls the hook method matching `phase`.
pub fn invoke_hook(
    hook: &mut dyn LifecycleHook,
    phase: Phase,
    ctx: &OperationContext,
) -> HookResult {
    match phase {
        Phase::BeforeInsert => hook.before_insert(ctx),
        Phase::AfterInsert => hook.after_insert(ctx),
        Phase::BeforeUpdate => hook.before_update(ctx),
        Phase::AfterUpdate => hook.after_update(ctx),
        Phase::BeforeUpsert => hook.before_upsert(ctx),
        Phase::AfterUpsert => hook.after_upsert(ctx),
        Phase::BeforeReplace => hook.before_replace(ctx),
        Phase::AfterReplace => hook.after_replace(ctx),
        Phase::BeforeQuery => hook.before_query(ctx),
        Phase::AfterQuery => hook.after_query(ctx),
        Phase::BeforeRemove => hook.before_remove(ctx),
        Phase::AfterRemove => hook.after_remove(ctx),
    }
}

/// Declared field constraints.
pub trait Validate {
    /// Returns the first violated constraint.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// By-name access to a type's fields.
///
/// Generated by `#[derive(Document)]`; the defaults describe a type with no
/// addressable fields.
pub trait FieldAccess {
    /// Returns the names `field_mut` resolves, in declaration order.
    fn field_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Resolves a field by name.
    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        let _ = name;
        None
    }
}

/// A value the pipeline can process.
///
/// Every capability query defaults to `None`. Types normally get this impl
/// from `#[derive(Document)]`.
pub trait Document: FieldAccess + Any {
    /// Returns the type name used in logs and errors.
    fn type_name(&self) -> &'static str;

    /// Upcasts for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Fixed-name timestamp mutators, if any.
    fn as_default_fields(&mut self) -> Option<&mut dyn DefaultFieldSetter> {
        None
    }

    /// Custom role mapping, if any.
    fn as_custom_fields(&self) -> Option<&dyn CustomFieldSetter> {
        None
    }

    /// Lifecycle callbacks, if any.
    fn as_hook(&mut self) -> Option<&mut dyn LifecycleHook> {
        None
    }

    /// Auto-assigned identifier, if any.
    fn as_identifier(&mut self) -> Option<&mut dyn IdentifierHolder> {
        None
    }

    /// Declared constraints, if any.
    fn as_validate(&self) -> Option<&dyn Validate> {
        None
    }
}

impl<'a> dyn Document + 'a {
    /// Returns the document as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Document>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Returns the document as `T`, if it is one.
    pub fn downcast_mut<T: Document>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

/// The capabilities a document exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Implements [`DefaultFieldSetter`].
    pub default_fields: bool,
    /// Implements [`CustomFieldSetter`].
    pub custom_fields: bool,
    /// Implements [`IdentifierHolder`].
    pub identifier: bool,
    /// Implements [`LifecycleHook`].
    pub hook: bool,
    /// Implements [`Validate`].
    pub validate: bool,
}

impl Capabilities {
    /// Probes every capability query on `doc`.
    pub fn detect(doc: &mut dyn Document) -> Self {
        Self {
            default_fields: doc.as_default_fields().is_some(),
            custom_fields: doc.as_custom_fields().is_some(),
            identifier: doc.as_identifier().is_some(),
            hook: doc.as_hook().is_some(),
            validate: doc.as_validate().is_some(),
        }
    }

    /// Returns true if no capability is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.default_fields || self.custom_fields || self.identifier || self.hook || self.validate)
    }

    /// Returns true if field injection has anything to do.
    #[must_use]
    pub const fn injects_fields(&self) -> bool {
        self.default_fields || self.custom_fields || self.identifier
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.default_fields, "default_fields"),
            (self.custom_fields, "custom_fields"),
            (self.identifier, "identifier"),
            (self.hook, "hook"),
            (self.validate, "validate"),
        ];
        let present: Vec<&str> = names
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect();
        if present.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&present.join(","))
        }
    }
}

/// Reusable bookkeeping fields, meant to be embedded in a document.
///
/// Implements [`DefaultFieldSetter`] and [`IdentifierHolder`]; mark the
/// embedding field with `#[docket(embed)]` to expose both.
///
/// # Example
///
/// ```
/// use docket_core::{DefaultFieldSetter, DefaultFields, IdentifierHolder};
///
/// let mut fields = DefaultFields::default();
/// assert!(fields.create_time_is_zero());
///
/// let now = chrono::Utc::now();
/// fields.set_create_time(now);
/// fields.set_update_time(now);
///
/// assert_eq!(fields.create_at, fields.update_at);
/// assert!(!fields.create_time_is_zero());
/// assert!(fields.identifier_mut().is_nil());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultFields {
    /// Primary key.
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Creation timestamp.
    #[serde(rename = "createAt")]
    pub create_at: DateTime<Utc>,
    /// Last-update timestamp.
    #[serde(rename = "updateAt")]
    pub update_at: DateTime<Utc>,
}

impl DefaultFieldSetter for DefaultFields {
    fn create_time(&self) -> DateTime<Utc> {
        self.create_at
    }

    fn set_create_time(&mut self, now: DateTime<Utc>) {
        self.create_at = now;
    }

    fn set_update_time(&mut self, now: DateTime<Utc>) {
        self.update_at = now;
    }
}

impl IdentifierHolder for DefaultFields {
    fn identifier_mut(&mut self) -> &mut DocumentId {
        &mut self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::OperationKind;

    struct Recorder {
        seen: Vec<Phase>,
    }

    impl LifecycleHook for Recorder {
        fn before_insert(&mut self, _ctx: &OperationContext) -> HookResult {
            self.seen.push(Phase::BeforeInsert);
            Ok(())
        }

        fn after_remove(&mut self, _ctx: &OperationContext) -> HookResult {
            Err("gone".into())
        }
    }

    #[test]
    fn test_invoke_hook_routes_by_phase() {
        let ctx = OperationContext::new(OperationKind::Insert);
        let mut recorder = Recorder { seen: Vec::new() };

        invoke_hook(&mut recorder, Phase::BeforeInsert, &ctx).unwrap();
        invoke_hook(&mut recorder, Phase::AfterInsert, &ctx).unwrap();
        assert_eq!(recorder.seen, vec![Phase::BeforeInsert]);

        let err = invoke_hook(&mut recorder, Phase::AfterRemove, &ctx).unwrap_err();
        assert_eq!(err.to_string(), "gone");
    }

    #[test]
    fn test_unimplemented_hooks_succeed() {
        let ctx = OperationContext::new(OperationKind::Query);
        let mut recorder = Recorder { seen: Vec::new() };
        for phase in Phase::all() {
            if phase != Phase::AfterRemove {
                assert!(invoke_hook(&mut recorder, phase, &ctx).is_ok());
            }
        }
    }

    #[test]
    fn test_document_id_is_its_own_holder() {
        let mut id = DocumentId::nil();
        *id.identifier_mut() = DocumentId::new();
        assert!(!id.is_nil());
    }

    #[test]
    fn test_capabilities_display() {
        assert_eq!(Capabilities::default().to_string(), "none");
        let caps = Capabilities {
            hook: true,
            identifier: true,
            ..Capabilities::default()
        };
        assert_eq!(caps.to_string(), "identifier,hook");
        assert!(caps.injects_fields());
        assert!(!caps.is_empty());
    }

    #[test]
    fn test_default_fields_serde_names() {
        let json = serde_json::to_value(DefaultFields::default()).unwrap();
        assert!(json.get("_id").is_some());
        assert!(json.get("createAt").is_some());
        assert!(json.get("updateAt").is_some());
    }
}
