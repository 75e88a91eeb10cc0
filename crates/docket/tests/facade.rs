//! The facade crate on its own: derive, configure, dispatch.

use chrono::DateTime;
use docket::middleware::FixedClock;
use docket::prelude::*;

#[derive(Debug, Default, Document)]
#[docket(hooks, crate = "docket::core")]
struct Note {
    #[docket(embed)]
    base: DefaultFields,
    #[validate(required)]
    body: String,
    revisions: u32,
}

impl LifecycleHook for Note {
    fn before_update(&mut self, _ctx: &OperationContext) -> HookResult {
        self.revisions += 1;
        Ok(())
    }
}

#[test]
fn test_configured_pipeline_validates_inserts() {
    let config = ConfigLoader::new()
        .with_string("[pipeline]\nvalidation = true\n", "toml")
        .unwrap()
        .load()
        .unwrap();
    let pipeline = Pipeline::from_config(&config.pipeline);
    let ctx = OperationContext::new(OperationKind::Insert);

    let err = pipeline
        .dispatch(&ctx, &mut Note::default(), Phase::BeforeInsert)
        .unwrap_err();
    assert_eq!(err.as_validation().unwrap().field, "body");

    let mut extras = Extras::new().with_setting(SkipValidation);
    pipeline
        .dispatch_with(&ctx, &mut Note::default(), Phase::BeforeInsert, &mut extras)
        .unwrap();
}

#[test]
fn test_update_lifecycle_through_facade() {
    let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let pipeline = Pipeline::builder().clock(FixedClock(now)).build();
    let ctx = OperationContext::new(OperationKind::Update).with_collection("notes");
    let mut note = Note {
        body: "draft".to_string(),
        ..Note::default()
    };

    let matched = pipeline
        .run(&ctx, &mut note, &mut Extras::new(), |_| Ok::<_, std::io::Error>(1_u64))
        .unwrap();

    assert_eq!(matched, 1);
    assert_eq!(note.revisions, 1);
    assert_eq!(note.base.update_at, now);
    assert!(note.base.id.is_nil());
}

#[test]
fn test_raw_filter_passes_through() {
    let pipeline = Pipeline::new();
    let ctx = OperationContext::new(OperationKind::Remove);
    let filter = serde_json::json!({ "body": "draft" });

    pipeline.dispatch(&ctx, &filter, Phase::BeforeRemove).unwrap();
}
