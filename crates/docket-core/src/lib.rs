//! # Docket Core
//!
//! Core types and capability traits for the Docket document lifecycle pipeline.
//!
//! This crate provides the foundational types used throughout Docket:
//!
//! - [`Phase`] / [`OperationKind`] - Lifecycle phase tags and their pairing
//! - [`Document`] - Runtime capability queries for a document type
//! - [`LifecycleHook`], [`DefaultFieldSetter`], [`CustomFieldSetter`],
//!   [`IdentifierHolder`], [`Validate`] - Optional capabilities
//! - [`Input`] / [`Batch`] - Shape normalization into individual documents
//! - [`OperationContext`] - Per-operation context forwarded to hooks
//! - [`PipelineError`] - Standard error types

#![doc(html_root_url = "https://docs.rs/docket-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Lets `#[derive(Document)]` output, which names `::docket_core`, expand
// inside this crate's own tests.
extern crate self as docket_core;

mod capability;
mod context;
mod error;
mod field;
mod id;
mod phase;
mod shape;
pub mod validate;

pub use capability::{
    invoke_hook, Capabilities, CustomFieldSetter, DefaultFieldSetter, DefaultFields, Document,
    FieldAccess, IdentifierHolder, LifecycleHook, Validate,
};
pub use context::{OperationContext, OperationId};
pub use error::{
    BoxError, ErrorCategory, HookResult, PipelineError, PipelineResult, Rule, ValidationError,
};
pub use field::{CustomFields, FieldMut, FieldRole};
pub use id::DocumentId;
pub use phase::{OperationKind, Phase};
pub use shape::{Batch, Dynamic, Element, ElementKind, Input, Shape, ShapeLimits, DEFAULT_MAX_DEPTH};
