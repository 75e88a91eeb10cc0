//! Bookkeeping field roles and by-name field slots.

use crate::id::DocumentId;
use chrono::{DateTime, Utc};
use std::fmt;

/// A semantic bookkeeping role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// Set once when the document is created.
    CreateTime,
    /// Refreshed on every write.
    UpdateTime,
    /// Primary key, assigned when still zero.
    Identifier,
}

impl FieldRole {
    /// Returns the role name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateTime => "create_time",
            Self::UpdateTime => "update_time",
            Self::Identifier => "identifier",
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps bookkeeping roles to field names declared on a document type.
///
/// Built fresh by [`CustomFieldSetter::custom_fields`] on every call. A role
/// left unset is skipped.
///
/// # Example
///
/// ```
/// use docket_core::{CustomFields, FieldRole};
///
/// let fields = CustomFields::new()
///     .create_time("created")
///     .identifier("my_id");
///
/// assert_eq!(fields.get(FieldRole::CreateTime), Some("created"));
/// assert_eq!(fields.get(FieldRole::UpdateTime), None);
/// ```
///
/// [`CustomFieldSetter::custom_fields`]: crate::CustomFieldSetter::custom_fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomFields {
    create_time: Option<String>,
    update_time: Option<String>,
    identifier: Option<String>,
}

impl CustomFields {
    /// Creates a builder with every role unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps the creation timestamp role.
    #[must_use]
    pub fn create_time(mut self, field: impl Into<String>) -> Self {
        self.create_time = Some(field.into());
        self
    }

    /// Maps the update timestamp role.
    #[must_use]
    pub fn update_time(mut self, field: impl Into<String>) -> Self {
        self.update_time = Some(field.into());
        self
    }

    /// Maps the identifier role.
    #[must_use]
    pub fn identifier(mut self, field: impl Into<String>) -> Self {
        self.identifier = Some(field.into());
        self
    }

    /// Returns the field mapped to `role`.
    #[must_use]
    pub fn get(&self, role: FieldRole) -> Option<&str> {
        match role {
            FieldRole::CreateTime => self.create_time.as_deref(),
            FieldRole::UpdateTime => self.update_time.as_deref(),
            FieldRole::Identifier => self.identifier.as_deref(),
        }
    }

    /// Returns the set roles in application order: create, update, identifier.
    pub fn roles(&self) -> impl Iterator<Item = (FieldRole, &str)> + '_ {
        [
            FieldRole::CreateTime,
            FieldRole::UpdateTime,
            FieldRole::Identifier,
        ]
        .into_iter()
        .filter_map(|role| self.get(role).map(|name| (role, name)))
    }
}

/// A mutable view of one field, resolved by name.
///
/// `#[derive(Document)]` picks the variant from the field's declared type:
/// `DateTime<Utc>` → `Timestamp`, `i64` → `UnixSeconds`, `DocumentId` → `Id`,
/// `String` → `Text`. Anything else is `Unsupported` and carries the type
/// name for diagnostics.
#[derive(Debug)]
pub enum FieldMut<'a> {
    /// A UTC timestamp.
    Timestamp(&'a mut DateTime<Utc>),
    /// Seconds since the Unix epoch.
    UnixSeconds(&'a mut i64),
    /// A document identifier.
    Id(&'a mut DocumentId),
    /// A string, used for string-typed identifiers.
    Text(&'a mut String),
    /// A field of a type the pipeline cannot write.
    Unsupported(&'static str),
}

impl FieldMut<'_> {
    /// Returns a short label of the slot type.
    #[must_use]
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::Timestamp(_) => "timestamp",
            Self::UnixSeconds(_) => "unix_seconds",
            Self::Id(_) => "document_id",
            Self::Text(_) => "string",
            Self::Unsupported(type_name) => type_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_in_fixed_order() {
        let fields = CustomFields::new()
            .identifier("pk")
            .update_time("touched")
            .create_time("born");

        let roles: Vec<_> = fields.roles().collect();
        assert_eq!(
            roles,
            vec![
                (FieldRole::CreateTime, "born"),
                (FieldRole::UpdateTime, "touched"),
                (FieldRole::Identifier, "pk"),
            ]
        );
    }

    #[test]
    fn test_unset_roles_are_skipped() {
        let fields = CustomFields::new().update_time("touched");
        assert_eq!(fields.roles().count(), 1);
        assert!(CustomFields::new().roles().next().is_none());
    }

    #[test]
    fn test_type_labels() {
        let mut secs = 0_i64;
        assert_eq!(FieldMut::UnixSeconds(&mut secs).type_label(), "unix_seconds");
        assert_eq!(FieldMut::Unsupported("f64").type_label(), "f64");
    }
}
