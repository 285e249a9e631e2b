// crates/conduit-deepmock/tests/common/mod.rs
// ============================================================================
// Module: Deep Mock Test Helpers
// Description: Shared schemas and connector fixtures.
// Purpose: Keep integration tests focused on behavior instead of setup.
// Dependencies: conduit-deepmock, serde_json
// ============================================================================

//! ## Overview
//! Schemas used across the deep-mock integration tests, plus constructors for
//! connectors and registries built from them.

#![allow(dead_code, reason = "Shared helpers are not used by every test binary.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use conduit_deepmock::DeepMockConfig;
use conduit_deepmock::DeepMockConnector;
use conduit_deepmock::SchemaEntry;
use conduit_deepmock::SchemaSources;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Schemas
// ============================================================================

/// Contact with a string id-field and a required name.
pub fn contact_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "x-amp-id-field": true },
            "name": { "type": "string" }
        },
        "required": ["name"]
    })
}

/// Contact that also carries an integer updated-field.
pub fn stamped_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "x-amp-id-field": true },
            "name": { "type": "string" },
            "updated": { "type": "integer", "x-amp-updated-field": true }
        },
        "required": ["name"]
    })
}

/// Note without any special fields.
pub fn note_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "body": { "type": "string", "minLength": 1 }
        },
        "required": ["body"]
    })
}

/// Object covering every generated value type.
pub fn rich_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer", "x-amp-id-field": true },
            "modified": { "type": "string", "format": "date-time", "x-amp-updated-field": true },
            "email": { "type": "string", "format": "email" },
            "code": { "type": "string", "pattern": "^[A-Z]{3}-[0-9]{2}$" },
            "nickname": { "type": "string", "minLength": 4, "maxLength": 12 },
            "age": { "type": "integer", "minimum": 18, "maximum": 99 },
            "score": { "type": "number", "exclusiveMinimum": 0, "maximum": 1 },
            "active": { "type": "boolean" },
            "tier": { "enum": ["gold", "silver", "bronze"] },
            "tags": {
                "type": "array",
                "items": { "type": "string", "enum": ["a", "b", "c", "d"] },
                "minItems": 1,
                "maxItems": 4,
                "uniqueItems": true
            },
            "address": {
                "type": "object",
                "properties": {
                    "city": { "type": "string", "format": "city" },
                    "zip": { "type": "string", "format": "postal-code" }
                },
                "required": ["city", "zip"]
            }
        },
        "required": ["email", "age", "tags", "address"]
    })
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds sources holding one raw schema per `(object, schema)` pair.
pub fn sources(schemas: &[(&str, Value)]) -> SchemaSources {
    schemas.iter().fold(SchemaSources::new(), |sources, (name, schema)| {
        sources.with_raw(*name, serde_json::to_vec(schema).unwrap())
    })
}

/// Builds a connector with default settings over the given schemas.
pub fn connector(schemas: &[(&str, Value)]) -> DeepMockConnector {
    DeepMockConnector::new(&DeepMockConfig::default(), sources(schemas)).unwrap()
}

/// Builds a connector with a custom page size.
pub fn connector_with_page_size(schemas: &[(&str, Value)], page_size: usize) -> DeepMockConnector {
    let config = DeepMockConfig {
        page_size,
        ..DeepMockConfig::default()
    };
    DeepMockConnector::new(&config, sources(schemas)).unwrap()
}

/// Compiles one schema entry.
pub fn entry(object_name: &str, schema: Value) -> SchemaEntry {
    SchemaEntry::from_raw(object_name, schema).unwrap()
}
