//! # Docket
//!
//! **Document lifecycle middleware for document stores**
//!
//! Docket runs a fixed set of steps around every store operation:
//!
//! - **Lifecycle Hooks** - per-phase callbacks on the document type
//! - **Managed Fields** - create/update timestamps and identifiers set for you
//! - **Declared Validation** - field constraints checked before whole-document writes
//! - **Any Shape** - single documents, vectors, nested vectors and dynamic lists
//!
//! ## Quick Start
//!
//! The `Document` derive expands to paths under `docket_core`. A crate that
//! only depends on `docket` points it at the re-export with
//! `#[docket(crate = "docket::core")]`.
//!
//! ```
//! use docket::prelude::*;
//!
//! #[derive(Debug, Default, Document)]
//! #[docket(hooks, crate = "docket::core")]
//! struct Article {
//!     #[docket(embed)]
//!     base: DefaultFields,
//!     #[validate(length(min = 1, max = 120))]
//!     title: String,
//! }
//!
//! impl LifecycleHook for Article {
//!     fn before_insert(&mut self, _ctx: &OperationContext) -> HookResult {
//!         self.title = self.title.trim().to_string();
//!         Ok(())
//!     }
//! }
//!
//! let pipeline = Pipeline::builder().with_validation().build();
//! let ctx = OperationContext::new(OperationKind::Insert).with_collection("articles");
//! let mut articles = vec![Article { title: " Hello ".into(), ..Article::default() }];
//!
//! let stored = pipeline
//!     .run(&ctx, &mut articles, &mut Extras::new(), |docs| {
//!         Ok::<_, std::io::Error>(docs.len())
//!     })
//!     .unwrap();
//!
//! assert_eq!(stored, 1);
//! assert_eq!(articles[0].title, "Hello");
//! assert!(!articles[0].base.id.is_nil());
//! ```
//!
//! ## Architecture
//!
//! Every dispatch runs the same ordered stages:
//!
//! ```text
//! Before*: Input → normalize → HookDispatch → FieldInjection → [Validation] → custom
//!                                                                               ↓
//!                                                                        store operation
//!                                                                               ↓
//! After*:  Input → normalize → HookDispatch → FieldInjection → [Validation] → custom
//! ```

#![doc(html_root_url = "https://docs.rs/docket/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use docket_core as core;

// Re-export the pipeline
pub use docket_middleware as middleware;

// Re-export configuration
pub use docket_config as config;

// Re-export logging and metrics
pub use docket_telemetry as telemetry;

// Re-export macros - the Document derive
pub use docket_macros::Document;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use docket::prelude::*;
///
/// let pipeline = Pipeline::new();
/// assert_eq!(pipeline.stage_count(), 2);
/// ```
pub mod prelude {
    pub use docket_core::{
        CustomFieldSetter, CustomFields, DefaultFields, Document,
        DocumentId, Dynamic, HookResult, Input, LifecycleHook, OperationContext, OperationKind,
        Phase, PipelineError, PipelineResult, Validate, ValidationError,
    };

    // Re-export the pipeline and its extension points
    pub use docket_middleware::{
        Clock, Extras, FnStage, LifecycleError, Pipeline, PipelineBuilder, SkipValidation, Stage,
    };

    // Re-export configuration entry points
    pub use docket_config::{ConfigLoader, DocketConfig};

    // Re-export the derive macro
    pub use docket_macros::Document;
}
