//! Out-of-band arguments to a dispatch call.
//!
//! Extras are handed to every stage. A stage picks out the kinds it
//! understands and ignores the rest.

use docket_core::Input;
use std::any::{Any, TypeId};
use std::fmt;

/// One extra argument.
pub enum Extra<'a> {
    /// Dispatch hooks to this value instead of the documents being written.
    ///
    /// Used by operations whose input carries no user type, such as an
    /// update given as a raw filter map.
    HookTarget(Input<'a>),
    /// A typed, stage-specific setting.
    Setting(Box<dyn Any>),
}

impl Extra<'_> {
    fn setting_type(&self) -> Option<TypeId> {
        match self {
            Self::Setting(value) => Some((**value).type_id()),
            Self::HookTarget(_) => None,
        }
    }
}

impl fmt::Debug for Extra<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HookTarget(input) => f.debug_tuple("HookTarget").field(input).finish(),
            Self::Setting(_) => f.write_str("Setting(..)"),
        }
    }
}

/// Turns off the validation stage for one dispatch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipValidation;

/// The extras of one dispatch call.
///
/// # Example
///
/// ```
/// use docket_middleware::{Extras, SkipValidation};
///
/// let filter = serde_json::json!({"name": "ada"});
/// let extras = Extras::new()
///     .with_hook_target(&filter)
///     .with_setting(SkipValidation);
///
/// assert!(extras.has_setting::<SkipValidation>());
/// assert_eq!(extras.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Extras<'a> {
    items: Vec<Extra<'a>>,
}

impl<'a> Extras<'a> {
    /// Creates an empty set of extras.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an extra.
    pub fn push(&mut self, extra: Extra<'a>) {
        self.items.push(extra);
    }

    /// Adds an override hook target.
    #[must_use]
    pub fn with_hook_target(mut self, target: impl Into<Input<'a>>) -> Self {
        self.push(Extra::HookTarget(target.into()));
        self
    }

    /// Adds a typed setting.
    #[must_use]
    pub fn with_setting<T: Any>(mut self, value: T) -> Self {
        self.push(Extra::Setting(Box::new(value)));
        self
    }

    /// Returns the first setting of type `T`.
    #[must_use]
    pub fn setting<T: Any>(&self) -> Option<&T> {
        self.items.iter().find_map(|extra| match extra {
            Extra::Setting(value) => value.downcast_ref::<T>(),
            Extra::HookTarget(_) => None,
        })
    }

    /// Returns true if a setting of type `T` is present.
    #[must_use]
    pub fn has_setting<T: Any>(&self) -> bool {
        let wanted = TypeId::of::<T>();
        self.items
            .iter()
            .any(|extra| extra.setting_type() == Some(wanted))
    }

    /// Returns the first override hook target.
    pub fn hook_target_mut(&mut self) -> Option<&mut Input<'a>> {
        self.items.iter_mut().find_map(|extra| match extra {
            Extra::HookTarget(input) => Some(input),
            Extra::Setting(_) => None,
        })
    }

    /// Returns true if an override hook target is present.
    #[must_use]
    pub fn has_hook_target(&self) -> bool {
        self.items
            .iter()
            .any(|extra| matches!(extra, Extra::HookTarget(_)))
    }

    /// Returns the number of extras.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no extras.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> From<Extra<'a>> for Extras<'a> {
    fn from(extra: Extra<'a>) -> Self {
        Self { items: vec![extra] }
    }
}

impl<'a> FromIterator<Extra<'a>> for Extras<'a> {
    fn from_iter<I: IntoIterator<Item = Extra<'a>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::Shape;

    #[derive(Debug, PartialEq)]
    struct BatchLabel(&'static str);

    #[test]
    fn test_empty_extras() {
        let mut extras = Extras::new();
        assert!(extras.is_empty());
        assert!(!extras.has_hook_target());
        assert!(extras.hook_target_mut().is_none());
        assert!(!extras.has_setting::<SkipValidation>());
    }

    #[test]
    fn test_typed_settings() {
        let extras = Extras::new()
            .with_setting(BatchLabel("nightly"))
            .with_setting(BatchLabel("ignored"));

        assert_eq!(extras.setting::<BatchLabel>(), Some(&BatchLabel("nightly")));
        assert!(extras.setting::<SkipValidation>().is_none());
    }

    #[test]
    fn test_first_hook_target_wins() {
        let first = serde_json::json!({"a": 1});
        let second = serde_json::json!({"b": 2});
        let mut extras: Extras<'_> = [
            Extra::Setting(Box::new(SkipValidation)),
            Extra::HookTarget(Input::opaque(&first)),
            Extra::HookTarget(Input::opaque(&second)),
        ]
        .into_iter()
        .collect();

        let target = extras.hook_target_mut().unwrap();
        assert!(matches!(target, Input::Opaque(v) if v.get("a").is_some()));
        assert_eq!(target.shape(), Shape::Opaque);
    }
}
