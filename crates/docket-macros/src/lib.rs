//! Procedural macros for Docket documents.
//!
//! This crate provides `#[derive(Document)]`, which wires a plain struct into
//! the lifecycle pipeline without a common base type.
//!
//! # Overview
//!
//! The derive generates:
//!
//! 1. A by-name field accessor table (`FieldAccess`), so custom field roles
//!    can target fields chosen at runtime
//! 2. The `Document` capability queries, from `#[docket(...)]` attributes
//! 3. An `Element` impl, so the type can be dispatched alone or in vectors
//! 4. A `Validate` impl, when fields declare `#[validate(...)]` constraints
//!
//! # Example
//!
//! ```rust,ignore
//! use docket::prelude::*;
//!
//! #[derive(Debug, Default, Document)]
//! #[docket(hooks)]
//! struct User {
//!     #[docket(embed)]
//!     base: DefaultFields,
//!     #[validate(required, email)]
//!     email: String,
//! }
//!
//! impl LifecycleHook for User {
//!     fn before_insert(&mut self, _ctx: &OperationContext) -> HookResult {
//!         self.email = self.email.to_lowercase();
//!         Ok(())
//!     }
//! }
//! ```

mod document;
mod parse;

use proc_macro::TokenStream;

/// Derives `Document`, `FieldAccess` and `Element` for a struct.
///
/// # Container attributes
///
/// `#[docket(...)]` on the struct declares capabilities the type implements
/// by hand:
///
/// - `default_fields`: `DefaultFieldSetter`
/// - `custom_fields`: `CustomFieldSetter`
/// - `hooks`: `LifecycleHook`
/// - `identifier`: `IdentifierHolder`
/// - `validate`: `Validate` (instead of field constraints)
/// - `crate = "path"`: where generated code finds `docket-core`, for crates
///   that only depend on the `docket` facade (`crate = "docket::core"`)
///
/// # Field attributes
///
/// - `#[docket(embed)]`: a `DefaultFields` value providing both the default
///   timestamps and the identifier
/// - `#[docket(id)]`: a `DocumentId` field assigned when nil
/// - `#[docket(rename = "name")]`: an extra name for by-name lookup, also
///   used in validation errors
/// - `#[validate(required, email, pattern = "..", range(min = .., max = ..),
///   length(min = .., max = ..))]`: constraints, checked in declaration order
///
/// # Field slots
///
/// Fields are exposed by name with a slot chosen from the declared type:
/// `DateTime<Utc>`, `i64`, `DocumentId` and `String` are writable; anything
/// else resolves as unsupported. Type aliases are not seen through.
#[proc_macro_derive(Document, attributes(docket, validate))]
pub fn derive_document(item: TokenStream) -> TokenStream {
    document::expand_document(item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
