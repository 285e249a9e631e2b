// crates/conduit-core/tests/schema_identity.rs
// ============================================================================
// Module: Schema Identity Tests
// Description: Tests for input schema parsing, special fields, and identity.
// ============================================================================
//! ## Overview
//! Validates that schema identity ignores map ordering and documentation
//! examples, and changes with every semantic keyword.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use conduit_core::ErrorKind;
use conduit_core::ExclusiveBound;
use conduit_core::InputSchema;
use conduit_core::SchemaNode;
use conduit_core::SpecialFields;
use proptest::prelude::*;
use serde_json::Value;
use serde_json::json;

fn parse(value: Value) -> InputSchema {
    InputSchema::from_value(value).unwrap()
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Tests that every keyword family round-trips through the model.
#[test]
fn schema_parses_draft_2020_12_keywords() {
    let schema = parse(json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://example.com/contact",
        "$defs": {"name": {"type": "string"}},
        "type": "object",
        "properties": {
            "id": {"type": "string", "x-amp-id-field": true},
            "tags": {"type": "array", "items": {"enum": ["a", "b"]}, "uniqueItems": true},
            "score": {"type": "number", "exclusiveMinimum": 0, "multipleOf": 0.5},
            "legacy": {"type": "integer", "minimum": 0, "exclusiveMinimum": true},
            "name": {"$ref": "#/$defs/name"}
        },
        "required": ["id"],
        "additionalProperties": false,
        "x-custom": {"kept": true}
    }));

    assert_eq!(schema.primary_type(), Some("object"));
    assert!(schema.is_required("id"));
    assert_eq!(schema.additional_properties, Some(SchemaNode::Bool(false)));
    assert_eq!(schema.extensions.get("x-custom"), Some(&json!({"kept": true})));
    let legacy = schema.property("legacy").unwrap();
    assert_eq!(legacy.exclusive_minimum, Some(ExclusiveBound::Flag(true)));
    let score = schema.property("score").unwrap();
    assert!(matches!(score.exclusive_minimum, Some(ExclusiveBound::Value(_))));
    let tags = schema.property("tags").unwrap();
    assert_eq!(tags.unique_items, Some(true));
    assert_eq!(schema.property("name").unwrap().reference.as_deref(), Some("#/$defs/name"));

    let rendered = schema.to_value().unwrap();
    assert_eq!(rendered["properties"]["id"]["x-amp-id-field"], json!(true));
    assert!(rendered["properties"]["tags"].get("x-amp-id-field").is_none());
    assert_eq!(parse(rendered), schema);
}

// ============================================================================
// SECTION: Special Fields
// ============================================================================

/// Tests special field extraction from parsed and raw schemas.
#[test]
fn special_fields_are_extracted() {
    let raw = json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "x-amp-id-field": true},
            "updated_at": {"type": "integer", "x-amp-updated-field": true}
        }
    });
    let expected = SpecialFields {
        id_field: Some("id".to_string()),
        updated_field: Some("updated_at".to_string()),
    };
    assert_eq!(SpecialFields::from_raw("contacts", &raw).unwrap(), expected);
    assert_eq!(parse(raw).special_fields("contacts").unwrap(), expected);
}

/// Tests that duplicate id markers are rejected.
#[test]
fn duplicate_id_field_is_invalid() {
    let raw = json!({
        "type": "object",
        "properties": {
            "a": {"type": "string", "x-amp-id-field": true},
            "b": {"type": "string", "x-amp-id-field": true}
        }
    });
    let err = SpecialFields::from_raw("contacts", &raw).unwrap_err();
    assert!(err.is(ErrorKind::InvalidSchema));
    assert!(parse(raw).special_fields("contacts").unwrap_err().is(ErrorKind::InvalidSchema));
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Tests that property insertion order does not change identity.
#[test]
fn identity_ignores_property_order() {
    let ab: Value = serde_json::from_str(
        r#"{"type":"object","properties":{"a":{"type":"string"},"b":{"type":"integer"}}}"#,
    )
    .unwrap();
    let ba: Value = serde_json::from_str(
        r#"{"type":"object","properties":{"b":{"type":"integer"},"a":{"type":"string"}}}"#,
    )
    .unwrap();
    assert_eq!(parse(ab).identity_hash().unwrap(), parse(ba).identity_hash().unwrap());
}

/// Tests that examples are excluded from identity.
#[test]
fn identity_ignores_examples() {
    let plain = parse(json!({"type": "string", "examples": ["x"]}));
    let other = parse(json!({"type": "string", "examples": ["y", "z"]}));
    assert_eq!(plain.identity_hash().unwrap(), other.identity_hash().unwrap());
}

/// Tests that any type change alters identity.
#[test]
fn identity_tracks_type_changes() {
    let base = parse(json!({"type": "object", "properties": {"a": {"type": "string"}}}));
    let changed = parse(json!({"type": "object", "properties": {"a": {"type": "integer"}}}));
    let top = parse(json!({"type": "array", "properties": {"a": {"type": "string"}}}));
    let base_hash = base.identity_hash().unwrap();
    assert_ne!(base_hash, changed.identity_hash().unwrap());
    assert_ne!(base_hash, top.identity_hash().unwrap());
}

/// Tests that array order is part of identity while numeric notation is not.
#[test]
fn identity_orders_arrays_and_canonicalizes_numbers() {
    let ab = parse(json!({"enum": ["a", "b"], "minimum": 1}));
    let ba = parse(json!({"enum": ["b", "a"], "minimum": 1}));
    let decimal = parse(json!({"enum": ["a", "b"], "minimum": 1.0}));
    assert_ne!(ab.identity_hash().unwrap(), ba.identity_hash().unwrap());
    assert_eq!(ab.identity_hash().unwrap(), decimal.identity_hash().unwrap());
}

/// Tests that vendor markers are part of identity.
#[test]
fn identity_tracks_vendor_markers() {
    let plain = parse(json!({"properties": {"id": {"type": "string"}}}));
    let marked = parse(json!({"properties": {"id": {"type": "string", "x-amp-id-field": true}}}));
    assert_ne!(plain.identity_hash().unwrap(), marked.identity_hash().unwrap());
}

// ============================================================================
// SECTION: Properties
// ============================================================================

fn type_name(index: u8) -> &'static str {
    match index % 5 {
        0 => "string",
        1 => "integer",
        2 => "number",
        3 => "boolean",
        _ => "array",
    }
}

fn render(entries: &[(String, u8)]) -> String {
    let body: Vec<String> = entries
        .iter()
        .map(|(name, kind)| format!("\"{name}\":{{\"type\":\"{}\"}}", type_name(*kind)))
        .collect();
    format!("{{\"type\":\"object\",\"properties\":{{{}}}}}", body.join(","))
}

proptest! {
    #[test]
    fn identity_is_stable_under_key_permutation_and_clone(
        entries in prop::collection::btree_map("[a-z]{1,8}", 0u8..5, 1..8)
    ) {
        let forward: Vec<(String, u8)> = entries.clone().into_iter().collect();
        let mut reversed = forward.clone();
        reversed.reverse();
        let schema_a = InputSchema::from_slice(render(&forward).as_bytes()).unwrap();
        let schema_b = InputSchema::from_slice(render(&reversed).as_bytes()).unwrap();
        let hash_a = schema_a.identity_hash().unwrap();
        prop_assert_eq!(&hash_a, &schema_b.identity_hash().unwrap());
        prop_assert_eq!(&hash_a, &schema_a.clone().identity_hash().unwrap());
    }
}
