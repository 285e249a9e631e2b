// crates/conduit-core/src/core/fields.rs
// ============================================================================
// Module: Conduit Field Selection
// Description: Case-insensitive projection of record fields.
// Purpose: Build the `fields` map of read rows from full provider records.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Field names match case-insensitively and are lower-cased on output. A
//! dotted path such as `address.city` walks nested objects. Requested fields
//! absent from the record are omitted rather than reported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_json::Value;

use crate::core::params::Record;

// ============================================================================
// SECTION: Projection
// ============================================================================

/// Projects `record` onto `fields`, returning lower-cased keys.
///
/// An empty `fields` set selects every top-level field.
#[must_use]
pub fn select_fields(record: &Record, fields: &BTreeSet<String>) -> Record {
    if fields.is_empty() {
        return lowercase_keys(record);
    }
    let mut out = Record::new();
    for field in fields {
        if let Some(value) = lookup_path(record, field) {
            out.insert(field.to_lowercase(), value.clone());
        }
    }
    out
}

/// Returns a copy of `record` with top-level keys lower-cased.
#[must_use]
pub fn lowercase_keys(record: &Record) -> Record {
    record.iter().map(|(key, value)| (key.to_lowercase(), value.clone())).collect()
}

/// Resolves a dotted, case-insensitive path inside a record.
fn lookup_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = lookup_key(record, first)?;
    for segment in segments {
        current = lookup_key(current.as_object()?, segment)?;
    }
    Some(current)
}

/// Finds a key by exact match first, then by case-insensitive match.
fn lookup_key<'a>(record: &'a Record, key: &str) -> Option<&'a Value> {
    record.get(key).or_else(|| {
        record
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })
}

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Coerces an id-field value to its string key.
///
/// Only non-empty strings and integers are valid identifiers.
#[must_use]
pub fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => number
            .as_i64()
            .map(|id| id.to_string())
            .or_else(|| number.as_u64().map(|id| id.to_string())),
        _ => None,
    }
}
