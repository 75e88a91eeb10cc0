//! Lifecycle phase tags.
//!
//! Every store operation is bracketed by two dispatch calls: one with the
//! `Before*` phase and, once the store reports success, one with the matching
//! `After*` phase. The pipeline never pairs them itself; that is the job of the
//! operation method (or [`Pipeline::run`] in `docket-middleware`).
//!
//! [`Pipeline::run`]: https://docs.rs/docket-middleware

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of store operation a phase belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Insert one or many documents.
    Insert,
    /// Partial update of matched documents.
    Update,
    /// Update, inserting when nothing matches.
    Upsert,
    /// Full replacement of a matched document.
    Replace,
    /// Read by filter.
    Query,
    /// Delete by filter.
    Remove,
}

impl OperationKind {
    /// Returns the phase that runs before the store call.
    #[must_use]
    pub const fn before(self) -> Phase {
        match self {
            Self::Insert => Phase::BeforeInsert,
            Self::Update => Phase::BeforeUpdate,
            Self::Upsert => Phase::BeforeUpsert,
            Self::Replace => Phase::BeforeReplace,
            Self::Query => Phase::BeforeQuery,
            Self::Remove => Phase::BeforeRemove,
        }
    }

    /// Returns the phase that runs after a successful store call.
    #[must_use]
    pub const fn after(self) -> Phase {
        match self {
            Self::Insert => Phase::AfterInsert,
            Self::Update => Phase::AfterUpdate,
            Self::Upsert => Phase::AfterUpsert,
            Self::Replace => Phase::AfterReplace,
            Self::Query => Phase::AfterQuery,
            Self::Remove => Phase::AfterRemove,
        }
    }

    /// Returns the operation name used in logs and metrics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Upsert => "upsert",
            Self::Replace => "replace",
            Self::Query => "query",
            Self::Remove => "remove",
        }
    }

    /// Returns all operation kinds.
    #[must_use]
    pub const fn all() -> [OperationKind; 6] {
        [
            Self::Insert,
            Self::Update,
            Self::Upsert,
            Self::Replace,
            Self::Query,
            Self::Remove,
        ]
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lifecycle moment a dispatch call represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before documents are inserted.
    BeforeInsert,
    /// After documents were inserted.
    AfterInsert,
    /// Before a partial update.
    BeforeUpdate,
    /// After a partial update.
    AfterUpdate,
    /// Before an upsert.
    BeforeUpsert,
    /// After an upsert.
    AfterUpsert,
    /// Before a full replacement.
    BeforeReplace,
    /// After a full replacement.
    AfterReplace,
    /// Before a query.
    BeforeQuery,
    /// After a query.
    AfterQuery,
    /// Before a removal.
    BeforeRemove,
    /// After a removal.
    AfterRemove,
}

impl Phase {
    /// Returns the operation kind this phase belongs to.
    #[must_use]
    pub const fn operation(self) -> OperationKind {
        match self {
            Self::BeforeInsert | Self::AfterInsert => OperationKind::Insert,
            Self::BeforeUpdate | Self::AfterUpdate => OperationKind::Update,
            Self::BeforeUpsert | Self::AfterUpsert => OperationKind::Upsert,
            Self::BeforeReplace | Self::AfterReplace => OperationKind::Replace,
            Self::BeforeQuery | Self::AfterQuery => OperationKind::Query,
            Self::BeforeRemove | Self::AfterRemove => OperationKind::Remove,
        }
    }

    /// Returns true for `Before*` phases.
    #[must_use]
    pub const fn is_before(self) -> bool {
        matches!(
            self,
            Self::BeforeInsert
                | Self::BeforeUpdate
                | Self::BeforeUpsert
                | Self::BeforeReplace
                | Self::BeforeQuery
                | Self::BeforeRemove
        )
    }

    /// Returns true for `After*` phases.
    #[must_use]
    pub const fn is_after(self) -> bool {
        !self.is_before()
    }

    /// Returns the other half of this phase's Before/After pair.
    #[must_use]
    pub const fn complement(self) -> Phase {
        let op = self.operation();
        if self.is_before() {
            op.after()
        } else {
            op.before()
        }
    }

    /// Returns true if this phase creates or overwrites whole documents.
    ///
    /// These are the phases where declared field constraints are enforced.
    #[must_use]
    pub const fn writes_whole_document(self) -> bool {
        matches!(
            self,
            Self::BeforeInsert | Self::BeforeUpsert | Self::BeforeReplace
        )
    }

    /// Returns the phase name used in logs and metrics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BeforeInsert => "before_insert",
            Self::AfterInsert => "after_insert",
            Self::BeforeUpdate => "before_update",
            Self::AfterUpdate => "after_update",
            Self::BeforeUpsert => "before_upsert",
            Self::AfterUpsert => "after_upsert",
            Self::BeforeReplace => "before_replace",
            Self::AfterReplace => "after_replace",
            Self::BeforeQuery => "before_query",
            Self::AfterQuery => "after_query",
            Self::BeforeRemove => "before_remove",
            Self::AfterRemove => "after_remove",
        }
    }

    /// Returns all phases, Before/After pairs adjacent.
    #[must_use]
    pub const fn all() -> [Phase; 12] {
        [
            Self::BeforeInsert,
            Self::AfterInsert,
            Self::BeforeUpdate,
            Self::AfterUpdate,
            Self::BeforeUpsert,
            Self::AfterUpsert,
            Self::BeforeReplace,
            Self::AfterReplace,
            Self::BeforeQuery,
            Self::AfterQuery,
            Self::BeforeRemove,
            Self::AfterRemove,
        ]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_pairs_round_trip() {
        for phase in Phase::all() {
            assert_ne!(phase.is_before(), phase.is_after());
            assert_eq!(phase.complement().complement(), phase);
            assert_eq!(phase.complement().operation(), phase.operation());
        }
    }

    #[test]
    fn test_operation_kind_phases() {
        for kind in OperationKind::all() {
            assert!(kind.before().is_before());
            assert!(kind.after().is_after());
            assert_eq!(kind.before().operation(), kind);
        }
    }

    #[test]
    fn test_whole_document_phases() {
        let writing: Vec<_> = Phase::all()
            .into_iter()
            .filter(|p| p.writes_whole_document())
            .collect();
        assert_eq!(
            writing,
            vec![Phase::BeforeInsert, Phase::BeforeUpsert, Phase::BeforeReplace]
        );
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&Phase::BeforeUpsert).unwrap();
        assert_eq!(json, "\"before_upsert\"");
        assert_eq!(Phase::AfterRemove.to_string(), "after_remove");
    }
}
