//! Operation context types.
//!
//! The [`OperationContext`] is created by the operation method that wraps a
//! store call and is handed, unchanged, to every hook invoked during the
//! Before and After dispatches of that operation.

use crate::phase::OperationKind;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each store operation, using UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Creates a new unique operation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OperationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-operation context forwarded to lifecycle hooks.
///
/// The pipeline never inspects the context beyond logging its identifier;
/// hooks may use the extension map to reach caller-provided state such as a
/// session handle or a cancellation flag.
///
/// # Example
///
/// ```
/// use docket_core::{OperationContext, OperationKind};
///
/// #[derive(Debug)]
/// struct TenantId(&'static str);
///
/// let ctx = OperationContext::new(OperationKind::Insert)
///     .with_collection("users")
///     .with_extension(TenantId("acme"));
///
/// assert_eq!(ctx.collection(), Some("users"));
/// assert_eq!(ctx.get_extension::<TenantId>().unwrap().0, "acme");
/// ```
pub struct OperationContext {
    operation_id: OperationId,
    kind: OperationKind,
    collection: Option<String>,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl OperationContext {
    /// Creates a context for a new operation of the given kind.
    #[must_use]
    pub fn new(kind: OperationKind) -> Self {
        Self::with_operation_id(kind, OperationId::new())
    }

    /// Creates a context with a caller-chosen operation ID.
    #[must_use]
    pub fn with_operation_id(kind: OperationKind, operation_id: OperationId) -> Self {
        Self {
            operation_id,
            kind,
            collection: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Sets the target collection name.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Stores a typed extension value and returns the context.
    #[must_use]
    pub fn with_extension<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.set_extension(value);
        self
    }

    /// Returns the operation ID.
    #[must_use]
    pub const fn operation_id(&self) -> OperationId {
        self.operation_id
    }

    /// Returns the operation kind.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Returns the target collection, if known.
    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Returns the elapsed time since the operation started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value, replacing any previous value of that type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationContext")
            .field("operation_id", &self.operation_id)
            .field("kind", &self.kind)
            .field("collection", &self.collection)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_ids_are_unique() {
        assert_ne!(OperationId::new(), OperationId::new());
    }

    #[test]
    fn test_context_defaults() {
        let ctx = OperationContext::new(OperationKind::Query);
        assert_eq!(ctx.kind(), OperationKind::Query);
        assert!(ctx.collection().is_none());
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Session(u32);

        let mut ctx = OperationContext::new(OperationKind::Update);
        assert!(ctx.get_extension::<Session>().is_none());

        ctx.set_extension(Session(7));
        assert_eq!(ctx.get_extension::<Session>(), Some(&Session(7)));

        assert_eq!(ctx.remove_extension::<Session>(), Some(Session(7)));
        assert!(ctx.get_extension::<Session>().is_none());
    }

    #[test]
    fn test_debug_hides_extension_values() {
        let ctx = OperationContext::new(OperationKind::Remove).with_extension(42_u8);
        let rendered = format!("{ctx:?}");
        assert!(rendered.contains("extensions: 1"));
    }
}
