//! Integration tests for `#[derive(Document)]`.
//!
//! These tests check that the generated impls compile against `docket-core`
//! and expose the expected capabilities and field slots.

use chrono::{DateTime, Utc};
use docket_core::{
    Capabilities, CustomFieldSetter, CustomFields, DefaultFields, Document, DocumentId, FieldAccess,
    FieldMut, HookResult, LifecycleHook, OperationContext, Rule, Validate,
};
use docket_macros::Document;

#[derive(Debug, Default, Document)]
struct Plain {
    title: String,
}

#[derive(Debug, Default, Document)]
#[docket(hooks, custom_fields)]
struct Article {
    #[docket(embed)]
    base: DefaultFields,
    #[docket(rename = "publishedAt")]
    published: DateTime<Utc>,
    revised: i64,
    slug: String,
    external_id: DocumentId,
    score: f64,
}

impl LifecycleHook for Article {
    fn before_insert(&mut self, _ctx: &OperationContext) -> HookResult {
        self.slug = self.slug.to_lowercase();
        Ok(())
    }
}

impl CustomFieldSetter for Article {
    fn custom_fields(&self) -> CustomFields {
        CustomFields::new()
            .create_time("publishedAt")
            .update_time("revised")
    }
}

#[derive(Debug, Document)]
struct Account {
    #[validate(required, email)]
    email: String,
    #[validate(range(min = 18, max = 130))]
    age: u32,
    #[validate(length(min = 2, max = 8), pattern = "^[a-z0-9_]+$")]
    #[docket(rename = "userName")]
    handle: String,
    #[validate(length(max = 3))]
    nickname: Option<String>,
}

impl Account {
    fn valid() -> Self {
        Self {
            email: "ada@example.com".to_string(),
            age: 36,
            handle: "ada_l".to_string(),
            nickname: None,
        }
    }
}

#[derive(Debug, Default, Document)]
struct Envelope<T: Default + Send> {
    payload: T,
}

#[derive(Debug, Default, Document)]
struct Ticket {
    #[docket(id)]
    number: DocumentId,
}

#[derive(Debug, Document)]
struct Marker;

#[test]
fn test_plain_document_has_no_capabilities() {
    let mut doc = Plain::default();
    let caps = Capabilities::detect(&mut doc);
    assert!(caps.is_empty());
    assert_eq!(doc.type_name(), "Plain");
    assert_eq!(doc.field_names(), &["title"]);
}

#[test]
fn test_capabilities_wired_from_attributes() {
    let mut doc = Article::default();
    let caps = Capabilities::detect(&mut doc);
    assert!(caps.default_fields);
    assert!(caps.custom_fields);
    assert!(caps.identifier);
    assert!(caps.hook);
    assert!(!caps.validate);
}

#[test]
fn test_identifier_targets_marked_field() {
    let mut article = Article::default();
    let id = DocumentId::new();
    if let Some(holder) = article.as_identifier() {
        *holder.identifier_mut() = id;
    }
    assert_eq!(article.base.id, id);
    assert!(article.external_id.is_nil());

    let mut ticket = Ticket::default();
    let caps = Capabilities::detect(&mut ticket);
    assert!(caps.identifier);
    assert!(!caps.default_fields);
    if let Some(holder) = ticket.as_identifier() {
        *holder.identifier_mut() = id;
    }
    assert_eq!(ticket.number, id);
}

#[test]
fn test_field_slots_by_name_and_alias() {
    let mut doc = Article::default();

    assert!(matches!(doc.field_mut("published"), Some(FieldMut::Timestamp(_))));
    assert!(matches!(doc.field_mut("publishedAt"), Some(FieldMut::Timestamp(_))));
    assert!(matches!(doc.field_mut("revised"), Some(FieldMut::UnixSeconds(_))));
    assert!(matches!(doc.field_mut("slug"), Some(FieldMut::Text(_))));
    assert!(matches!(doc.field_mut("external_id"), Some(FieldMut::Id(_))));
    assert!(matches!(doc.field_mut("score"), Some(FieldMut::Unsupported("f64"))));
    assert!(doc.field_mut("missing").is_none());

    if let Some(FieldMut::UnixSeconds(secs)) = doc.field_mut("revised") {
        *secs = 42;
    }
    assert_eq!(doc.revised, 42);
    assert!(doc.field_names().contains(&"publishedAt"));
}

#[test]
fn test_hook_is_reachable_through_document() {
    let mut doc = Article {
        slug: "Hello-World".to_string(),
        ..Article::default()
    };
    let ctx = OperationContext::new(docket_core::OperationKind::Insert);
    let hook = doc.as_hook().unwrap();
    hook.before_insert(&ctx).unwrap();
    assert_eq!(doc.slug, "hello-world");
}

#[test]
fn test_generated_validation_passes() {
    let doc = Account::valid();
    assert!(doc.validate().is_ok());
    assert!(doc.as_validate().is_some());
}

#[test]
fn test_generated_validation_reports_first_violation() {
    let doc = Account {
        email: String::new(),
        age: 12,
        ..Account::valid()
    };
    let err = doc.validate().unwrap_err();
    assert_eq!(err.field, "email");
    assert_eq!(err.rule, Rule::Required);
}

#[test]
fn test_generated_validation_rules() {
    let young = Account {
        age: 12,
        ..Account::valid()
    };
    assert_eq!(young.validate().unwrap_err().rule, Rule::Range);

    let bad_handle = Account {
        handle: "Ada!".to_string(),
        ..Account::valid()
    };
    let err = bad_handle.validate().unwrap_err();
    assert_eq!(err.field, "userName");
    assert_eq!(err.rule, Rule::Pattern);

    let long_nick = Account {
        nickname: Some("adalovelace".to_string()),
        ..Account::valid()
    };
    assert_eq!(long_nick.validate().unwrap_err().rule, Rule::Length);
}

#[test]
fn test_generic_and_unit_documents() {
    let mut envelope = Envelope::<u8>::default();
    assert!(matches!(
        envelope.field_mut("payload"),
        Some(FieldMut::Unsupported("u8"))
    ));
    assert_eq!(envelope.type_name(), "Envelope");

    let mut marker = Marker;
    assert!(marker.field_names().is_empty());
    assert!(marker.field_mut("anything").is_none());
}
