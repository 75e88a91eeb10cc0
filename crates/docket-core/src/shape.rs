//! Shape normalization.
//!
//! A dispatch call accepts documents in several shapes: a single document
//! held by value or by mutable reference, a vector of documents, nested
//! vectors, or a vector of [`Dynamic`] elements whose concrete types differ.
//! [`Input::normalize`] classifies the input once and flattens it into a
//! [`Batch`] of individually addressable documents, in original order.
//!
//! ```text
//! Input ──classify──▶ Shape
//!   │
//!   └──flatten──▶ Batch [doc₀, doc₁, …]   (depth-first, left to right)
//! ```
//!
//! Only borrowed inputs make mutations visible to the caller. Owned inputs
//! are worked on in place and dropped when the dispatch call returns.

use crate::capability::Document;
use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default maximum number of nested vector levels.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// The structural classification of a dispatch input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// One document held by value.
    Single,
    /// One document held by mutable reference.
    PointerToSingle,
    /// A vector of documents held by value.
    Slice,
    /// A vector of documents held by mutable reference.
    PointerToSlice,
    /// A vector of [`Dynamic`] elements.
    SliceOfDynamic,
    /// A vector whose elements are themselves vectors.
    NestedSlice,
    /// A value with no document structure, such as a raw filter.
    Opaque,
}

impl Shape {
    /// Returns the shape name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::PointerToSingle => "pointer_to_single",
            Self::Slice => "slice",
            Self::PointerToSlice => "pointer_to_slice",
            Self::SliceOfDynamic => "slice_of_dynamic",
            Self::NestedSlice => "nested_slice",
            Self::Opaque => "opaque",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an [`Element`] is at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A leaf document.
    Document,
    /// A vector of leaf documents.
    Slice,
    /// A vector of vectors.
    NestedSlice,
    /// A vector of [`Dynamic`] elements.
    DynamicSlice,
    /// A [`Dynamic`] element whose variant is only known at runtime.
    Dynamic,
    /// No document structure.
    Opaque,
}

/// Limits applied while flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeLimits {
    /// Maximum number of nested vector levels.
    pub max_depth: usize,
}

impl Default for ShapeLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Anything that can be flattened into documents.
///
/// Implemented by every `#[derive(Document)]` type (as a leaf), by
/// `Vec<T: Element>` and by [`Dynamic`].
pub trait Element {
    /// Returns the runtime kind of this value.
    fn kind(&self) -> ElementKind;

    /// Returns the kind of the type, used to classify vectors of it.
    fn static_kind() -> ElementKind
    where
        Self: Sized;

    /// Appends every leaf document to `out`, depth-first and in order.
    ///
    /// `depth` is the number of enclosing vectors.
    fn collect<'b>(
        &'b mut self,
        depth: usize,
        limits: &ShapeLimits,
        out: &mut Batch<'b>,
    ) -> PipelineResult<()>;
}

impl<T: Element> Element for Vec<T> {
    fn kind(&self) -> ElementKind {
        Self::static_kind()
    }

    fn static_kind() -> ElementKind {
        match T::static_kind() {
            ElementKind::Document | ElementKind::Opaque => ElementKind::Slice,
            ElementKind::Slice | ElementKind::NestedSlice | ElementKind::DynamicSlice => {
                ElementKind::NestedSlice
            }
            ElementKind::Dynamic => ElementKind::DynamicSlice,
        }
    }

    fn collect<'b>(
        &'b mut self,
        depth: usize,
        limits: &ShapeLimits,
        out: &mut Batch<'b>,
    ) -> PipelineResult<()> {
        if depth >= limits.max_depth {
            return Err(PipelineError::unsupported_shape(
                out.shape(),
                format!("nesting exceeds {} levels", limits.max_depth),
            ));
        }
        for element in self.iter_mut() {
            element.collect(depth + 1, limits, out)?;
        }
        Ok(())
    }
}

/// Raw filter and update maps flatten to nothing.
impl Element for serde_json::Value {
    fn kind(&self) -> ElementKind {
        ElementKind::Opaque
    }

    fn static_kind() -> ElementKind {
        ElementKind::Opaque
    }

    fn collect<'b>(
        &'b mut self,
        _depth: usize,
        _limits: &ShapeLimits,
        out: &mut Batch<'b>,
    ) -> PipelineResult<()> {
        out.push_opaque();
        Ok(())
    }
}

/// A dynamically-typed element, for heterogeneous containers.
///
/// # Example
///
/// ```
/// use docket_core::{Dynamic, Input, Shape};
///
/// let mut mixed = vec![
///     Dynamic::list(vec![Dynamic::raw(serde_json::json!({"a": 1}))]),
///     Dynamic::raw(serde_json::json!(null)),
/// ];
/// let mut input = Input::from(&mut mixed);
/// assert_eq!(input.shape(), Shape::SliceOfDynamic);
///
/// let batch = input.normalize(&Default::default()).unwrap();
/// assert!(batch.is_empty());
/// assert_eq!(batch.opaque_count(), 2);
/// ```
pub enum Dynamic {
    /// A boxed document of any type.
    Document(Box<dyn Document>),
    /// A nested list.
    List(Vec<Dynamic>),
    /// A value with no document structure.
    Raw(serde_json::Value),
}

impl Dynamic {
    /// Boxes a document.
    pub fn document<T: Document>(doc: T) -> Self {
        Self::Document(Box::new(doc))
    }

    /// Wraps a nested list.
    #[must_use]
    pub fn list(items: Vec<Dynamic>) -> Self {
        Self::List(items)
    }

    /// Wraps a raw value.
    #[must_use]
    pub fn raw(value: serde_json::Value) -> Self {
        Self::Raw(value)
    }

    /// Returns the contained document as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Document>(&self) -> Option<&T> {
        match self {
            Self::Document(doc) => doc.as_any().downcast_ref(),
            _ => None,
        }
    }

    /// Returns the nested list, if this is one.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(doc) => f.debug_tuple("Document").field(&doc.type_name()).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Raw(value) => f.debug_tuple("Raw").field(value).finish(),
        }
    }
}

impl Element for Dynamic {
    fn kind(&self) -> ElementKind {
        match self {
            Self::Document(_) => ElementKind::Document,
            Self::List(_) => ElementKind::DynamicSlice,
            Self::Raw(_) => ElementKind::Opaque,
        }
    }

    fn static_kind() -> ElementKind {
        ElementKind::Dynamic
    }

    fn collect<'b>(
        &'b mut self,
        depth: usize,
        limits: &ShapeLimits,
        out: &mut Batch<'b>,
    ) -> PipelineResult<()> {
        match self {
            Self::Document(doc) => {
                out.push(doc.as_mut());
                Ok(())
            }
            Self::List(items) => items.collect(depth, limits, out),
            Self::Raw(_) => {
                out.push_opaque();
                Ok(())
            }
        }
    }
}

/// A document reference handed to a dispatch call.
///
/// `From<&mut T>` covers the common case; use [`Input::value`] to hand over
/// ownership and [`Input::opaque`] for raw filters.
pub enum Input<'a> {
    /// Caller-owned data; mutations are visible after the call.
    Borrowed(&'a mut dyn Element),
    /// Pipeline-owned data; mutations are discarded.
    Owned(Box<dyn Element + 'a>),
    /// A value without document structure.
    Opaque(&'a serde_json::Value),
}

impl<'a> Input<'a> {
    /// Hands a value to the pipeline. Field mutations will not be observable.
    pub fn value<T: Element + 'a>(value: T) -> Self {
        Self::Owned(Box::new(value))
    }

    /// Wraps a raw filter or update map.
    #[must_use]
    pub fn opaque(value: &'a serde_json::Value) -> Self {
        Self::Opaque(value)
    }

    /// Returns true if the pipeline owns the data.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    /// Classifies this input.
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Borrowed(element) => match element.kind() {
                ElementKind::Document | ElementKind::Dynamic => Shape::PointerToSingle,
                ElementKind::Slice => Shape::PointerToSlice,
                ElementKind::NestedSlice => Shape::NestedSlice,
                ElementKind::DynamicSlice => Shape::SliceOfDynamic,
                ElementKind::Opaque => Shape::Opaque,
            },
            Self::Owned(element) => match element.kind() {
                ElementKind::Document | ElementKind::Dynamic => Shape::Single,
                ElementKind::Slice => Shape::Slice,
                ElementKind::NestedSlice => Shape::NestedSlice,
                ElementKind::DynamicSlice => Shape::SliceOfDynamic,
                ElementKind::Opaque => Shape::Opaque,
            },
            Self::Opaque(_) => Shape::Opaque,
        }
    }

    /// Flattens this input into a batch of documents.
    pub fn normalize(&mut self, limits: &ShapeLimits) -> PipelineResult<Batch<'_>> {
        let mut batch = Batch::new(self.shape());
        match self {
            Self::Borrowed(element) => element.collect(0, limits, &mut batch)?,
            Self::Owned(element) => element.collect(0, limits, &mut batch)?,
            Self::Opaque(_) => batch.push_opaque(),
        }
        Ok(batch)
    }
}

impl<'a, T: Element> From<&'a mut T> for Input<'a> {
    fn from(element: &'a mut T) -> Self {
        Self::Borrowed(element)
    }
}

impl<'a> From<&'a serde_json::Value> for Input<'a> {
    fn from(value: &'a serde_json::Value) -> Self {
        Self::Opaque(value)
    }
}

impl fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("shape", &self.shape())
            .field("owned", &self.is_owned())
            .finish()
    }
}

/// The flattened documents of one input, in original order.
pub struct Batch<'a> {
    shape: Shape,
    items: Vec<&'a mut dyn Document>,
    opaque: usize,
}

impl<'a> Batch<'a> {
    /// Creates an empty batch for the given shape.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            items: Vec::new(),
            opaque: 0,
        }
    }

    /// Appends a document.
    pub fn push(&mut self, doc: &'a mut dyn Document) {
        self.items.push(doc);
    }

    /// Records an element without document structure.
    pub fn push_opaque(&mut self) {
        self.opaque += 1;
    }

    /// Returns the classified shape of the input.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns the number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns how many opaque elements were skipped.
    #[must_use]
    pub const fn opaque_count(&self) -> usize {
        self.opaque
    }

    /// Returns the documents for in-order processing.
    pub fn items_mut(&mut self) -> &mut [&'a mut dyn Document] {
        &mut self.items
    }

    /// Returns the concrete type names, in order.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        self.items.iter().map(|doc| doc.type_name()).collect()
    }
}

impl fmt::Debug for Batch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("shape", &self.shape)
            .field("items", &self.type_names())
            .field("opaque", &self.opaque)
            .finish()
    }
}
