// crates/conduit-deepmock/tests/connector.rs
// ============================================================================
// Module: Deep Mock Connector Tests
// Description: End-to-end capability tests for the in-memory connector.
// Purpose: Validate create/read/update/delete flows, paging, and metadata.
// Dependencies: conduit-deepmock, conduit-core, proptest, tempfile
// ============================================================================

//! ## Overview
//! Drives [`DeepMockConnector`] through its capability traits the way a
//! caller would, including observers, subscriptions, and file-backed schemas.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use conduit_core::BatchRecordReader;
use conduit_core::Capability;
use conduit_core::Connector;
use conduit_core::Context;
use conduit_core::DeleteParams;
use conduit_core::Deleter;
use conduit_core::ErrorKind;
use conduit_core::ReadParams;
use conduit_core::Reader;
use conduit_core::SchemaProvider;
use conduit_core::SubscribeParams;
use conduit_core::Subscriber;
use conduit_core::SubscriptionStatus;
use conduit_core::Timestamp;
use conduit_core::ValueType;
use conduit_core::WebhookMessage;
use conduit_core::WriteParams;
use conduit_core::Writer;
use conduit_deepmock::ChangeEvent;
use conduit_deepmock::DeepMockConfig;
use conduit_deepmock::DeepMockConnector;
use conduit_deepmock::DerivedSchema;
use conduit_deepmock::MAX_SCHEMA_FILE_BYTES;
use conduit_deepmock::SchemaSources;
use conduit_deepmock::StoreAction;
use proptest::prelude::*;
use serde_json::Value;
use serde_json::json;

use crate::common::connector;
use crate::common::connector_with_page_size;
use crate::common::contact_schema;
use crate::common::note_schema;
use crate::common::rich_schema;
use crate::common::stamped_schema;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Creates one contact and returns its id.
fn create_contact(mock: &DeepMockConnector, object_name: &str, name: &str) -> String {
    let result = mock
        .write(&Context::background(), &WriteParams::create(object_name, json!({ "name": name })))
        .unwrap();
    assert!(result.success);
    result.record_id
}

/// Reads one page.
fn read_page(mock: &DeepMockConnector, params: &ReadParams) -> conduit_core::ReadResult {
    mock.read(&Context::background(), params).unwrap()
}

// ============================================================================
// SECTION: Create, Read, Delete
// ============================================================================

#[test]
fn create_read_delete_round_trip() {
    let mock = connector(&[("contact", contact_schema())]);
    let ctx = Context::background();

    let written = mock.write(&ctx, &WriteParams::create("contact", json!({ "name": "Alice" }))).unwrap();
    assert!(written.success);
    assert_eq!(written.record_id.len(), 36);
    assert_eq!(written.data["id"], json!(written.record_id));

    let page = read_page(&mock, &ReadParams::new("contact").with_fields(["name"]));
    assert_eq!(page.rows, 1);
    assert!(page.done);
    assert!(page.next_page.is_empty());
    let row = &page.data[0];
    assert_eq!(row.id, written.record_id);
    assert_eq!(Value::Object(row.fields.clone()), json!({ "name": "Alice" }));
    assert_eq!(row.raw["name"], json!("Alice"));
    assert_eq!(row.raw["id"], json!(written.record_id));

    let deleted = mock.delete(&ctx, &DeleteParams::new("contact", &written.record_id)).unwrap();
    assert!(deleted.success);
    assert_eq!(read_page(&mock, &ReadParams::new("contact")).rows, 0);
}

#[test]
fn read_without_fields_returns_every_field_lowercased() {
    let mock = connector(&[("contact", contact_schema())]);
    let id = create_contact(&mock, "contact", "Dana");
    let page = read_page(&mock, &ReadParams::new("contact"));
    assert_eq!(page.data[0].fields.get("id"), Some(&json!(id)));
    assert_eq!(page.data[0].fields.get("name"), Some(&json!("Dana")));
}

#[test]
fn delete_of_missing_record_is_not_found() {
    let mock = connector(&[("contact", contact_schema())]);
    let err = mock.delete(&Context::background(), &DeleteParams::new("contact", "nope")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecordNotFound);
}

#[test]
fn read_of_unknown_object_is_schema_not_found() {
    let mock = connector(&[("contact", contact_schema())]);
    let err = mock.read(&Context::background(), &ReadParams::new("ghost")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaNotFound);
}

#[test]
fn cancelled_context_stops_operations() {
    let mock = connector(&[("contact", contact_schema())]);
    let ctx = Context::background();
    ctx.cancel();
    let err = mock.write(&ctx, &WriteParams::create("contact", json!({ "name": "Late" }))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    let err = mock.read(&ctx, &ReadParams::new("contact")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

// ============================================================================
// SECTION: Write Policy
// ============================================================================

#[test]
fn update_refreshes_timestamp_unless_provided() {
    let mock = connector(&[("contact", stamped_schema())]);
    let ctx = Context::background();
    let before = Timestamp::now().unix_seconds();
    let created = mock.write(&ctx, &WriteParams::create("contact", json!({ "name": "Bob" }))).unwrap();
    let t0 = created.data["updated"].as_i64().unwrap();
    assert!(t0 >= before && t0 <= Timestamp::now().unix_seconds());

    thread::sleep(Duration::from_secs(1));
    let id = created.record_id;
    let updated = mock.write(&ctx, &WriteParams::update("contact", &id, json!({ "name": "Bobby" }))).unwrap();
    assert_eq!(updated.data["name"], json!("Bobby"));
    assert!(updated.data["updated"].as_i64().unwrap() > t0);

    let explicit = mock.write(&ctx, &WriteParams::update("contact", &id, json!({ "updated": 0 }))).unwrap();
    assert_eq!(explicit.data["updated"], json!(0));
    assert_eq!(explicit.data["name"], json!("Bobby"));
    let stored = read_page(&mock, &ReadParams::new("contact"));
    assert_eq!(stored.data[0].raw["updated"], json!(0));
}

#[test]
fn create_keeps_supplied_id_and_timestamp() {
    let mock = connector(&[("contact", stamped_schema())]);
    let written = mock
        .write(
            &Context::background(),
            &WriteParams::create("contact", json!({ "id": "c-1", "name": "Eve", "updated": 42 })),
        )
        .unwrap();
    assert_eq!(written.record_id, "c-1");
    assert_eq!(written.data["updated"], json!(42));
}

#[test]
fn create_rewriting_an_existing_id_replaces_the_record() {
    let mock = connector(&[("contact", contact_schema())]);
    let ctx = Context::background();
    mock.write(&ctx, &WriteParams::create("contact", json!({ "id": "c-1", "name": "Eve" }))).unwrap();
    mock.write(&ctx, &WriteParams::create("contact", json!({ "id": "c-1", "name": "Eva" }))).unwrap();
    let page = read_page(&mock, &ReadParams::new("contact"));
    assert_eq!(page.rows, 1);
    assert_eq!(page.data[0].raw["name"], json!("Eva"));
}

#[test]
fn invalid_record_is_rejected_with_every_violation() {
    let mock = connector(&[("contact", contact_schema())]);
    let err = mock
        .write(&Context::background(), &WriteParams::create("contact", json!({ "id": true, "name": "Ann" })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let err = mock
        .write(&Context::background(), &WriteParams::create("contact", json!({ "name": 7 })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    let conduit_core::ConnectorError::ValidationFailed {
        violations,
    } = err
    else {
        panic!("expected validation failure");
    };
    assert!(!violations.is_empty());
    assert_eq!(read_page(&mock, &ReadParams::new("contact")).rows, 0);
}

#[test]
fn missing_required_field_fails_validation() {
    let mock = connector(&[("contact", contact_schema())]);
    let err = mock
        .write(&Context::background(), &WriteParams::create("contact", json!({ "id": "x" })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
}

#[test]
fn write_rejects_non_object_payloads() {
    let mock = connector(&[("contact", contact_schema())]);
    let err = mock
        .write(&Context::background(), &WriteParams::create("contact", json!(["Alice"])))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    let err = mock.write(&Context::background(), &WriteParams::create("contact", Value::Null)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRecordData);
}

#[test]
fn update_of_missing_record_is_not_found() {
    let mock = connector(&[("contact", contact_schema())]);
    let err = mock
        .write(&Context::background(), &WriteParams::update("contact", "nope", json!({ "name": "X" })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecordNotFound);
}

#[test]
fn update_cannot_change_the_id_field() {
    let mock = connector(&[("contact", contact_schema())]);
    let id = create_contact(&mock, "contact", "Fay");
    let err = mock
        .write(&Context::background(), &WriteParams::update("contact", &id, json!({ "id": "other" })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn objects_without_id_field_use_generated_keys() {
    let mock = connector(&[("note", note_schema())]);
    let ctx = Context::background();
    let written = mock.write(&ctx, &WriteParams::create("note", json!({ "body": "hello" }))).unwrap();
    assert!(!written.record_id.is_empty());
    assert!(!written.data.contains_key("id"));

    let page = read_page(&mock, &ReadParams::new("note"));
    assert_eq!(page.data[0].id, written.record_id);

    let updated = mock
        .write(&ctx, &WriteParams::update("note", &written.record_id, json!({ "body": "bye" })))
        .unwrap();
    assert_eq!(updated.record_id, written.record_id);
    mock.delete(&ctx, &DeleteParams::new("note", &written.record_id)).unwrap();
}

// ============================================================================
// SECTION: Paging and Windows
// ============================================================================

#[test]
fn offset_tokens_page_through_records() {
    let mock = connector(&[("contact", contact_schema())]);
    for index in 0 .. 100 {
        create_contact(&mock, "contact", &format!("person {index}"));
    }

    let tail = read_page(&mock, &ReadParams::new("contact").with_next_page("25"));
    assert_eq!(tail.rows, 75);
    assert!(tail.done);

    let middle = read_page(&mock, &ReadParams::new("contact").with_next_page("25").with_page_size(50));
    assert_eq!(middle.rows, 50);
    assert!(!middle.done);
    assert_eq!(middle.next_page.as_str(), "75");

    let beyond = read_page(&mock, &ReadParams::new("contact").with_next_page("150"));
    assert_eq!(beyond.rows, 0);
    assert!(beyond.done);

    let garbage = read_page(&mock, &ReadParams::new("contact").with_next_page("not-a-number"));
    assert_eq!(garbage.rows, 100);
}

#[test]
fn configured_page_size_applies_by_default() {
    let mock = connector_with_page_size(&[("contact", contact_schema())], 4);
    for index in 0 .. 10 {
        create_contact(&mock, "contact", &format!("p{index}"));
    }
    let first = read_page(&mock, &ReadParams::new("contact"));
    assert_eq!(first.rows, 4);
    assert_eq!(first.next_page.as_str(), "4");
}

#[test]
fn zero_page_size_is_rejected_at_construction() {
    let config = DeepMockConfig {
        page_size: 0,
        ..DeepMockConfig::default()
    };
    let err = DeepMockConnector::new(&config, SchemaSources::new()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn read_window_filters_on_updated_field() {
    let mock = connector(&[("contact", stamped_schema())]);
    let ctx = Context::background();
    for (name, updated) in [("a", 100), ("b", 200), ("c", 300), ("d", 400)] {
        mock.write(&ctx, &WriteParams::create("contact", json!({ "name": name, "updated": updated })))
            .unwrap();
    }
    let params = ReadParams::new("contact")
        .with_window(Some(Timestamp::from_unix_seconds(150)), Some(Timestamp::from_unix_seconds(300)));
    let page = read_page(&mock, &params);
    let names: BTreeSet<_> = page.data.iter().map(|row| row.raw["name"].clone()).collect();
    assert_eq!(names, BTreeSet::from([json!("b"), json!("c")]));
}

#[test]
fn inverted_window_is_rejected() {
    let mock = connector(&[("contact", stamped_schema())]);
    let params = ReadParams::new("contact")
        .with_window(Some(Timestamp::from_unix_seconds(300)), Some(Timestamp::from_unix_seconds(100)));
    let err = mock.read(&Context::background(), &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn pages_union_to_the_full_listing(records in 0_usize .. 40, page_size in 1_usize .. 12) {
        let mock = connector(&[("contact", contact_schema())]);
        let mut expected = BTreeSet::new();
        for index in 0 .. records {
            expected.insert(create_contact(&mock, "contact", &format!("n{index}")));
        }
        let mut seen = Vec::new();
        let mut token = String::new();
        loop {
            let params = ReadParams::new("contact").with_next_page(token.clone()).with_page_size(page_size);
            let page = read_page(&mock, &params);
            prop_assert_eq!(page.done, page.next_page.is_empty());
            prop_assert!(page.data.len() <= page_size);
            seen.extend(page.data.into_iter().map(|row| row.id));
            if page.done {
                break;
            }
            token = page.next_page.as_str().to_string();
        }
        prop_assert_eq!(seen.len(), records);
        prop_assert_eq!(seen.into_iter().collect::<BTreeSet<_>>(), expected);
    }
}

// ============================================================================
// SECTION: Metadata
// ============================================================================

#[test]
fn list_object_metadata_requires_objects() {
    let mock = connector(&[("contact", contact_schema())]);
    let err = mock.list_object_metadata(&Context::background(), &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingObjects);
}

#[test]
fn list_object_metadata_reports_unknown_objects_per_object() {
    let mock = connector(&[("contact", rich_schema())]);
    let result = mock
        .list_object_metadata(&Context::background(), &["contact".to_string(), "ghost".to_string()])
        .unwrap();
    let contact = &result.result["contact"];
    assert_eq!(contact.fields["age"].value_type, ValueType::Int);
    assert_eq!(contact.fields["age"].is_required, Some(true));
    assert_eq!(contact.fields["score"].value_type, ValueType::Float);
    assert_eq!(contact.fields["modified"].value_type, ValueType::Datetime);
    assert_eq!(contact.fields["tier"].value_type, ValueType::SingleSelect);
    assert_eq!(contact.fields["tags"].value_type, ValueType::MultiSelect);
    assert_eq!(contact.fields["active"].is_required, Some(false));
    assert_eq!(result.errors["ghost"].kind(), ErrorKind::SchemaNotFound);
}

// ============================================================================
// SECTION: Batch Reads and Subscriptions
// ============================================================================

#[test]
fn batch_reads_skip_missing_ids() {
    let mock = connector(&[("contact", contact_schema())]);
    let first = create_contact(&mock, "contact", "One");
    let second = create_contact(&mock, "contact", "Two");
    let ids = vec![first.clone(), "missing".to_string(), second.clone()];
    let fields = BTreeSet::from(["name".to_string()]);
    let rows = mock.get_records_by_ids(&Context::background(), "contact", &ids, &fields).unwrap();
    let found: Vec<_> = rows.iter().map(|row| row.id.clone()).collect();
    assert_eq!(found, vec![first, second]);
    assert!(rows.iter().all(|row| row.fields.len() == 1));
}

#[test]
fn subscriptions_are_tracked_until_removed() {
    let mock = connector(&[("contact", contact_schema())]);
    let ctx = Context::background();
    let params = SubscribeParams {
        object_names: vec!["contact".to_string()],
        events: vec!["create".to_string()],
    };
    let subscription = mock.subscribe(&ctx, &params).unwrap();
    assert_eq!(subscription.status, SubscriptionStatus::Active);
    assert_eq!(mock.subscriptions().unwrap().len(), 1);
    assert!(mock.verify_webhook_message(&ctx, &WebhookMessage::default()).unwrap());

    let removed = mock.unsubscribe(&ctx, &subscription).unwrap();
    assert_eq!(removed.status, SubscriptionStatus::Inactive);
    assert!(mock.subscriptions().unwrap().is_empty());
    let err = mock.unsubscribe(&ctx, &subscription).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn subscribe_validates_objects() {
    let mock = connector(&[("contact", contact_schema())]);
    let ctx = Context::background();
    let err = mock.subscribe(&ctx, &SubscribeParams::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingObjects);
    let params = SubscribeParams {
        object_names: vec!["ghost".to_string()],
        events: Vec::new(),
    };
    assert_eq!(mock.subscribe(&ctx, &params).unwrap_err().kind(), ErrorKind::SchemaNotFound);
}

#[test]
fn connector_exposes_every_capability() {
    let mock = connector(&[("contact", contact_schema())]);
    assert_eq!(mock.provider(), "deepmock");
    let capabilities = mock.capabilities();
    for capability in [
        Capability::Read,
        Capability::Write,
        Capability::Delete,
        Capability::ListObjectMetadata,
        Capability::BatchRead,
        Capability::Subscribe,
    ] {
        assert!(capabilities.contains(capability), "missing {capability}");
    }
}

// ============================================================================
// SECTION: Observers and Generation
// ============================================================================

#[test]
fn observers_see_writes_in_commit_order() {
    let mock = connector(&[("contact", contact_schema())]);
    let ctx = Context::background();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handle = mock
        .register_observer(Arc::new(move |event: &ChangeEvent| {
            sink.lock().unwrap().push((event.action, event.record_id.clone()));
        }))
        .unwrap();

    let id = create_contact(&mock, "contact", "Gus");
    mock.write(&ctx, &WriteParams::update("contact", &id, json!({ "name": "Gustav" }))).unwrap();
    mock.delete(&ctx, &DeleteParams::new("contact", &id)).unwrap();
    assert!(mock.unregister_observer(handle).unwrap());
    create_contact(&mock, "contact", "Unseen");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            (StoreAction::Create, id.clone()),
            (StoreAction::Update, id.clone()),
            (StoreAction::Delete, id),
        ]
    );
    assert!(!mock.unregister_observer(handle).unwrap());
}

#[test]
fn generated_records_can_be_written_back() {
    let mock = connector(&[("contact", rich_schema())]);
    let record = mock.generate_random_record("contact").unwrap();
    let entry = mock.registry().get("contact").unwrap();
    assert!(entry.validator().is_valid(&Value::Object(record.clone())));
    let written = mock
        .write(&Context::background(), &WriteParams::create("contact", Value::Object(record)))
        .unwrap();
    assert!(written.success);
}

#[test]
fn random_record_for_unknown_object_is_schema_not_found() {
    let mock = connector(&[("contact", contact_schema())]);
    let err = mock.generate_random_record("ghost").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaNotFound);
}

// ============================================================================
// SECTION: Schema Sources
// ============================================================================

/// Native type with a derived schema.
struct Invoice;

impl DerivedSchema for Invoice {
    const OBJECT_NAME: &'static str = "invoice";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": { "total": { "type": "number" } },
            "required": ["total"]
        })
    }
}

#[test]
fn derived_schemas_register_objects() {
    let sources = SchemaSources::new().with_derived::<Invoice>();
    let mock = DeepMockConnector::new(&DeepMockConfig::default(), sources).unwrap();
    let written = mock
        .write(&Context::background(), &WriteParams::create("invoice", json!({ "total": 12.5 })))
        .unwrap();
    assert!(written.success);
}

#[test]
fn raw_schema_overrides_derived_schema() {
    let raw = json!({
        "type": "object",
        "properties": { "total": { "type": "string" } },
        "required": ["total"]
    });
    let sources =
        SchemaSources::new().with_derived::<Invoice>().with_raw("invoice", serde_json::to_vec(&raw).unwrap());
    let mock = DeepMockConnector::new(&DeepMockConfig::default(), sources).unwrap();
    let ctx = Context::background();
    assert!(mock.write(&ctx, &WriteParams::create("invoice", json!({ "total": "12" }))).is_ok());
    let err = mock.write(&ctx, &WriteParams::create("invoice", json!({ "total": 12 }))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
}

#[test]
fn schema_files_load_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contact.json");
    std::fs::write(&path, serde_json::to_vec(&contact_schema()).unwrap()).unwrap();
    let config = DeepMockConfig {
        schema_paths: BTreeMap::from([("contact".to_string(), path)]),
        ..DeepMockConfig::default()
    };
    let mock = DeepMockConnector::new(&config, SchemaSources::new()).unwrap();
    assert_eq!(mock.registry().get("contact").unwrap().id_field(), Some("id"));
}

#[test]
fn oversized_or_invalid_schema_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let big = dir.path().join("big.json");
    std::fs::write(&big, vec![b' '; MAX_SCHEMA_FILE_BYTES + 1]).unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, b"{ not json").unwrap();
    for path in [big, broken, dir.path().join("absent.json")] {
        let config = DeepMockConfig {
            schema_paths: BTreeMap::from([("contact".to_string(), path)]),
            ..DeepMockConfig::default()
        };
        let err = DeepMockConnector::new(&config, SchemaSources::new()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);
    }
}

#[test]
fn non_object_schemas_are_rejected() {
    let sources = SchemaSources::new().with_raw("list", br#"{ "type": "array" }"#.to_vec());
    let err = DeepMockConnector::new(&DeepMockConfig::default(), sources).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidSchema);
}
