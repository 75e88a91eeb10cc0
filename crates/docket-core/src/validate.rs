//! Declared field constraints.
//!
//! `#[derive(Document)]` turns `#[validate(...)]` field attributes into a
//! [`Validate`](crate::Validate) impl that calls the checks below in field
//! declaration order and returns the first violation. The helpers are public
//! so hand-written impls can reuse them.
//!
//! `Option` fields holding `None` pass every check except [`required`].

use crate::error::{Rule, ValidationError};
use crate::id::DocumentId;
use chrono::{DateTime, Utc};
use std::sync::OnceLock;

pub use regex::Regex;

/// A value that can be empty.
pub trait Required {
    /// Returns true if the value is set and not the zero value.
    fn is_present(&self) -> bool;
}

/// A value with a numeric magnitude.
pub trait Numeric {
    /// Returns the value as `f64`, or `None` if unset.
    fn as_f64(&self) -> Option<f64>;
}

/// A value with a length.
pub trait HasLength {
    /// Returns the length, or `None` if unset. Strings count characters.
    fn length(&self) -> Option<usize>;
}

/// A value with a string form.
pub trait AsText {
    /// Returns the text, or `None` if unset.
    fn as_text(&self) -> Option<&str>;
}

impl Required for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Required for str {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Required for Option<T> {
    fn is_present(&self) -> bool {
        self.is_some()
    }
}

impl<T> Required for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Required for DocumentId {
    fn is_present(&self) -> bool {
        !self.is_nil()
    }
}

impl Required for DateTime<Utc> {
    fn is_present(&self) -> bool {
        self.timestamp() != 0 || self.timestamp_subsec_nanos() != 0
    }
}

macro_rules! impl_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Required for $ty {
                #[allow(clippy::float_cmp)]
                fn is_present(&self) -> bool {
                    *self != (0 as $ty)
                }
            }

            impl Numeric for $ty {
                #[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
                fn as_f64(&self) -> Option<f64> {
                    Some(*self as f64)
                }
            }
        )*
    };
}

impl_numeric!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: Numeric> Numeric for Option<T> {
    fn as_f64(&self) -> Option<f64> {
        self.as_ref().and_then(Numeric::as_f64)
    }
}

impl HasLength for String {
    fn length(&self) -> Option<usize> {
        Some(self.chars().count())
    }
}

impl HasLength for str {
    fn length(&self) -> Option<usize> {
        Some(self.chars().count())
    }
}

impl<T> HasLength for Vec<T> {
    fn length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<T: HasLength> HasLength for Option<T> {
    fn length(&self) -> Option<usize> {
        self.as_ref().and_then(HasLength::length)
    }
}

impl AsText for String {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl AsText for str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl AsText for Option<String> {
    fn as_text(&self) -> Option<&str> {
        self.as_deref()
    }
}

/// Checks that `value` is present.
pub fn required<T: Required + ?Sized>(field: &str, value: &T) -> Result<(), ValidationError> {
    if value.is_present() {
        Ok(())
    } else {
        Err(ValidationError::new(field, Rule::Required, "value is required"))
    }
}

/// Checks that `value` lies within `[min, max]`.
pub fn range<T: Numeric + ?Sized>(
    field: &str,
    value: &T,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), ValidationError> {
    let Some(actual) = value.as_f64() else {
        return Ok(());
    };
    if let Some(min) = min {
        if actual < min {
            return Err(ValidationError::new(
                field,
                Rule::Range,
                format!("{actual} is less than minimum {min}"),
            ));
        }
    }
    if let Some(max) = max {
        if actual > max {
            return Err(ValidationError::new(
                field,
                Rule::Range,
                format!("{actual} is greater than maximum {max}"),
            ));
        }
    }
    Ok(())
}

/// Checks that the length of `value` lies within `[min, max]`.
pub fn length<T: HasLength + ?Sized>(
    field: &str,
    value: &T,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<(), ValidationError> {
    let Some(len) = value.length() else {
        return Ok(());
    };
    if let Some(min) = min {
        if len < min {
            return Err(ValidationError::new(
                field,
                Rule::Length,
                format!("length {len} is less than minimum {min}"),
            ));
        }
    }
    if let Some(max) = max {
        if len > max {
            return Err(ValidationError::new(
                field,
                Rule::Length,
                format!("length {len} is greater than maximum {max}"),
            ));
        }
    }
    Ok(())
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
}

/// Checks that `value` looks like an email address.
pub fn email<T: AsText + ?Sized>(field: &str, value: &T) -> Result<(), ValidationError> {
    let Some(text) = value.as_text() else {
        return Ok(());
    };
    match email_regex() {
        Some(re) if re.is_match(text) => Ok(()),
        _ => Err(ValidationError::new(
            field,
            Rule::Email,
            format!("'{text}' is not a valid email address"),
        )),
    }
}

/// Checks that `value` matches `re`.
///
/// `re` is `None` when `source` failed to compile; that is reported as a
/// violation rather than a panic.
pub fn pattern<T: AsText + ?Sized>(
    field: &str,
    value: &T,
    re: Option<&Regex>,
    source: &str,
) -> Result<(), ValidationError> {
    let Some(text) = value.as_text() else {
        return Ok(());
    };
    match re {
        Some(re) if re.is_match(text) => Ok(()),
        Some(_) => Err(ValidationError::new(
            field,
            Rule::Pattern,
            format!("'{text}' does not match pattern '{source}'"),
        )),
        None => Err(ValidationError::new(
            field,
            Rule::Pattern,
            format!("invalid pattern '{source}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert!(required("name", "").is_err());
        assert!(required("name", &String::from("a")).is_ok());
        assert!(required("nick", &None::<String>).is_err());
        assert!(required("id", &DocumentId::nil()).is_err());
        assert!(required("id", &DocumentId::new()).is_ok());
        assert!(required("count", &0_u32).is_err());
        assert!(required("created", &DateTime::<Utc>::default()).is_err());
    }

    #[test]
    fn test_range() {
        assert!(range("age", &18_i32, Some(18.0), Some(130.0)).is_ok());
        let err = range("age", &17_i32, Some(18.0), None).unwrap_err();
        assert_eq!(err.rule, Rule::Range);
        assert_eq!(err.field, "age");
        assert!(range("age", &200_u8, None, Some(130.0)).is_err());
        assert!(range("age", &None::<i32>, Some(18.0), None).is_ok());
    }

    #[test]
    fn test_length_counts_chars() {
        assert!(length("name", "héllo", Some(5), Some(5)).is_ok());
        assert!(length("name", "", Some(1), None).is_err());
        assert!(length("tags", &vec![1, 2, 3], None, Some(2)).is_err());
    }

    #[test]
    fn test_email() {
        assert!(email("email", "a@example.com").is_ok());
        let err = email("email", "not-an-email").unwrap_err();
        assert_eq!(err.rule, Rule::Email);
        assert!(email("email", &None::<String>).is_ok());
    }

    #[test]
    fn test_pattern() {
        let re = Regex::new("^[a-z]+$").ok();
        assert!(pattern("slug", "abc", re.as_ref(), "^[a-z]+$").is_ok());
        assert!(pattern("slug", "ABC", re.as_ref(), "^[a-z]+$").is_err());

        let err = pattern("slug", "abc", None, "([").unwrap_err();
        assert!(err.message.contains("invalid pattern"));
    }
}
