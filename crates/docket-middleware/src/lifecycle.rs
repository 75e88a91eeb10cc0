//! Before/store/after sequencing around one store operation.
//!
//! ```text
//! dispatch(Before) ──err──▶ LifecycleError::Before   (store not called)
//!        │ok
//! store(docs) ──────err──▶ LifecycleError::Store    (After not dispatched)
//!        │ok
//! dispatch(After) ──err──▶ LifecycleError::After    (store already committed)
//!        │ok
//!   store result
//! ```

use crate::extras::Extras;
use crate::pipeline::Pipeline;
use docket_core::{Element, OperationContext, PipelineError};
use std::error::Error as StdError;
use std::fmt;
use tracing::debug;

/// Failure of one step of [`Pipeline::run`].
#[derive(Debug)]
pub enum LifecycleError<E> {
    /// The Before dispatch failed; the store was not called.
    Before(PipelineError),
    /// The store operation failed; the After phase was not dispatched.
    Store(E),
    /// The After dispatch failed; the store change is committed.
    After(PipelineError),
}

impl<E> LifecycleError<E> {
    /// Returns true if the store operation had already succeeded.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::After(_))
    }

    /// Returns the pipeline error, if a dispatch failed.
    #[must_use]
    pub const fn pipeline_error(&self) -> Option<&PipelineError> {
        match self {
            Self::Before(err) | Self::After(err) => Some(err),
            Self::Store(_) => None,
        }
    }

    /// Returns the store error, if the store failed.
    #[must_use]
    pub const fn store_error(&self) -> Option<&E> {
        match self {
            Self::Store(err) => Some(err),
            Self::Before(_) | Self::After(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for LifecycleError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before(err) | Self::After(err) => fmt::Display::fmt(err, f),
            Self::Store(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl<E: StdError + 'static> StdError for LifecycleError<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Before(err) | Self::After(err) => err.source(),
            Self::Store(err) => err.source(),
        }
    }
}

impl Pipeline {
    /// Runs the Before phase, the store operation and the After phase of
    /// `ctx.kind()` in order, stopping at the first failure.
    ///
    /// `extras` is passed to both dispatch calls.
    ///
    /// # Errors
    ///
    /// Returns a [`LifecycleError`] naming the step that failed.
    ///
    /// # Example
    ///
    /// ```
    /// use docket_core::{DefaultFields, OperationContext, OperationKind};
    /// use docket_macros::Document;
    /// use docket_middleware::{Extras, Pipeline};
    ///
    /// #[derive(Debug, Default, Document)]
    /// struct Order {
    ///     #[docket(embed)]
    ///     base: DefaultFields,
    /// }
    ///
    /// let pipeline = Pipeline::new();
    /// let ctx = OperationContext::new(OperationKind::Insert);
    /// let mut orders = vec![Order::default(), Order::default()];
    ///
    /// let inserted = pipeline
    ///     .run(&ctx, &mut orders, &mut Extras::new(), |orders| {
    ///         Ok::<_, std::io::Error>(orders.len())
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(inserted, 2);
    /// assert!(orders.iter().all(|o| !o.base.id.is_nil()));
    /// ```
    pub fn run<T, R, E, F>(
        &self,
        ctx: &OperationContext,
        docs: &mut T,
        extras: &mut Extras<'_>,
        store: F,
    ) -> Result<R, LifecycleError<E>>
    where
        T: Element,
        F: FnOnce(&mut T) -> Result<R, E>,
    {
        let kind = ctx.kind();

        self.dispatch_with(ctx, &mut *docs, kind.before(), extras)
            .map_err(LifecycleError::Before)?;

        let output = match store(docs) {
            Ok(output) => output,
            Err(err) => {
                debug!(operation = kind.name(), "store operation failed");
                return Err(LifecycleError::Store(err));
            }
        };

        self.dispatch_with(ctx, &mut *docs, kind.after(), extras)
            .map_err(LifecycleError::After)?;

        Ok(output)
    }
}
