//! # Docket Middleware
//!
//! The document lifecycle pipeline.
//!
//! Around every store operation, the operation method dispatches the
//! documents twice: once with the `Before*` phase, and once more with the
//! matching `After*` phase after the store reports success. Each dispatch
//! runs the registered stages in order.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Input ─normalize─▶ Batch ─▶ HookDispatch ─▶ FieldInjection ─▶ [Validation] ─▶ custom…
//! ```
//!
//! | Stage | Name | Purpose |
//! |-------|------|---------|
//! | 1 | Hook Dispatch | Call the `LifecycleHook` method matching the phase |
//! | 2 | Field Injection | Set create/update timestamps and nil identifiers |
//! | 3 | Validation | Check declared field constraints (opt-in) |
//!
//! ## Key Features
//!
//! - **Any Shape**: single documents, vectors, nested vectors and [`Dynamic`]
//!   lists are flattened into one ordered batch
//! - **Opt-in Capabilities**: a document only gets the behavior it exposes
//! - **Short-circuit**: the first error aborts the call and is returned as is
//! - **Synchronous**: no threads, no suspension, no I/O
//!
//! ## Example
//!
//! ```
//! use docket_core::{DefaultFields, HookResult, LifecycleHook, OperationContext, OperationKind, Phase};
//! use docket_macros::Document;
//! use docket_middleware::Pipeline;
//!
//! #[derive(Debug, Default, Document)]
//! #[docket(hooks)]
//! struct User {
//!     #[docket(embed)]
//!     base: DefaultFields,
//!     name: String,
//! }
//!
//! impl LifecycleHook for User {
//!     fn before_insert(&mut self, _ctx: &OperationContext) -> HookResult {
//!         self.name = self.name.trim().to_string();
//!         Ok(())
//!     }
//! }
//!
//! let pipeline = Pipeline::new();
//! let ctx = OperationContext::new(OperationKind::Insert);
//! let mut users = vec![
//!     User { name: " ada ".into(), ..User::default() },
//!     User { name: "grace".into(), ..User::default() },
//! ];
//!
//! pipeline.dispatch(&ctx, &mut users, Phase::BeforeInsert).unwrap();
//! assert_eq!(users[0].name, "ada");
//! assert!(users.iter().all(|u| !u.base.id.is_nil()));
//! ```
//!
//! [`Dynamic`]: docket_core::Dynamic

#![doc(html_root_url = "https://docs.rs/docket-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod extras;
pub mod lifecycle;
pub mod pipeline;
pub mod stage;
pub mod stages;

// Re-export main types at crate root
pub use clock::{Clock, FixedClock, MonotonicClock};
pub use extras::{Extra, Extras, SkipValidation};
pub use lifecycle::LifecycleError;
pub use pipeline::{BoxedStage, BuiltinStage, Pipeline, PipelineBuilder};
pub use stage::{FnStage, Stage};
pub use stages::{FieldInjectionStage, HookDispatchStage, ValidationStage};
