//! Error types for Docket.
//!
//! [`PipelineError`] is the single error type returned by a dispatch call.
//! Capability absence is never an error: a document that implements nothing
//! passes every stage untouched.
//!
//! | Variant | [`ErrorCategory`] | Raised when |
//! |---|---|---|
//! | `UnsupportedShape` | `Shape` | the input cannot be normalized |
//! | `Hook` | `Hook` | a user callback returned an error |
//! | `Validation` | `Validation` | a declared field constraint is violated |
//! | `FieldMismatch` | `Field` | strict field mode and a role cannot be applied |
//! | `Stage` | `Stage` | a custom stage failed |

use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A boxed error returned by user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by lifecycle hooks.
pub type HookResult = Result<(), BoxError>;

/// Result type alias using [`PipelineError`].
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Categories of pipeline errors for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The input shape was rejected.
    Shape,
    /// A lifecycle hook failed.
    Hook,
    /// A declared field constraint failed.
    Validation,
    /// A bookkeeping field could not be written (strict mode).
    Field,
    /// A custom stage failed.
    Stage,
}

impl ErrorCategory {
    /// Returns the category name used as a metric label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Shape => "shape",
            Self::Hook => "hook",
            Self::Validation => "validation",
            Self::Field => "field",
            Self::Stage => "stage",
        }
    }
}

/// Standard error type for the dispatch pipeline.
///
/// Hook errors are wrapped transparently so that the caller sees exactly the
/// message the hook produced.
///
/// # Example
///
/// ```
/// use docket_core::{ErrorCategory, PipelineError};
///
/// let err = PipelineError::hook("stock exhausted");
/// assert_eq!(err.to_string(), "stock exhausted");
/// assert_eq!(err.category(), ErrorCategory::Hook);
/// ```
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input could not be normalized into documents.
    #[error("unsupported document shape {shape}: {reason}")]
    UnsupportedShape {
        /// The classified shape of the input.
        shape: Shape,
        /// Why it was rejected.
        reason: String,
    },

    /// A lifecycle hook returned an error.
    #[error(transparent)]
    Hook(BoxError),

    /// A declared field constraint was violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A bookkeeping role could not be applied to a field.
    #[error("cannot set field `{field}` on `{type_name}`: {reason}")]
    FieldMismatch {
        /// The document type.
        type_name: &'static str,
        /// The configured field name.
        field: String,
        /// Why the field could not be written.
        reason: String,
    },

    /// A custom stage failed.
    #[error("stage `{stage}` failed: {source}")]
    Stage {
        /// The stage name.
        stage: &'static str,
        /// The underlying error.
        #[source]
        source: BoxError,
    },
}

impl PipelineError {
    /// Creates an unsupported shape error.
    #[must_use]
    pub fn unsupported_shape(shape: Shape, reason: impl Into<String>) -> Self {
        Self::UnsupportedShape {
            shape,
            reason: reason.into(),
        }
    }

    /// Wraps a hook error.
    #[must_use]
    pub fn hook(source: impl Into<BoxError>) -> Self {
        Self::Hook(source.into())
    }

    /// Creates a field mismatch error.
    #[must_use]
    pub fn field_mismatch(
        type_name: &'static str,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::FieldMismatch {
            type_name,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wraps a custom stage error.
    #[must_use]
    pub fn stage(stage: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Stage {
            stage,
            source: source.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedShape { .. } => ErrorCategory::Shape,
            Self::Hook(_) => ErrorCategory::Hook,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::FieldMismatch { .. } => ErrorCategory::Field,
            Self::Stage { .. } => ErrorCategory::Stage,
        }
    }

    /// Returns the hook error downcast to a concrete type, if this is a hook
    /// error of that type.
    #[must_use]
    pub fn hook_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Hook(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns the validation error, if this is one.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// The constraint a [`ValidationError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// The field must hold a non-zero value.
    Required,
    /// A numeric field must lie within bounds.
    Range,
    /// A string or collection length must lie within bounds.
    Length,
    /// A string field must be an email address.
    Email,
    /// A string field must match a regular expression.
    Pattern,
    /// A hand-written check.
    Custom,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Required => "required",
            Self::Range => "range",
            Self::Length => "length",
            Self::Email => "email",
            Self::Pattern => "pattern",
            Self::Custom => "custom",
        })
    }
}

/// The first declared constraint a document violated.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("field `{field}` failed {rule} check: {message}")]
pub struct ValidationError {
    /// The field that failed.
    pub field: String,
    /// The violated rule.
    pub rule: Rule,
    /// Human-readable detail.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("quota exceeded for {0}")]
    struct QuotaError(&'static str);

    #[test]
    fn test_hook_error_is_verbatim() {
        let err = PipelineError::hook(QuotaError("acme"));
        assert_eq!(err.to_string(), "quota exceeded for acme");
        assert_eq!(err.hook_error::<QuotaError>().unwrap().0, "acme");
    }

    #[test]
    fn test_hook_error_from_str() {
        let err = PipelineError::hook("x");
        assert_eq!(err.to_string(), "x");
        assert!(err.hook_error::<QuotaError>().is_none());
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            PipelineError::unsupported_shape(Shape::NestedSlice, "too deep").category(),
            ErrorCategory::Shape
        );
        assert_eq!(
            PipelineError::field_mismatch("User", "created", "no such field").category(),
            ErrorCategory::Field
        );
        assert_eq!(
            PipelineError::stage("audit", "disk full").category(),
            ErrorCategory::Stage
        );
        assert_eq!(ErrorCategory::Validation.as_str(), "validation");
    }

    #[test]
    fn test_validation_error_display() {
        let err: PipelineError = ValidationError::new("age", Rule::Range, "must be >= 18").into();
        assert_eq!(err.to_string(), "field `age` failed range check: must be >= 18");
        assert_eq!(err.as_validation().unwrap().rule, Rule::Range);
    }
}
