// crates/conduit-runtime/src/schema/sampling.rs
// ============================================================================
// Module: Sampling Schema Provider
// Description: Field metadata inferred from the first page of a read.
// Purpose: Describe objects whose provider publishes no schema.
// Dependencies: conduit-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`SamplingSchemaProvider`] reads one page of each requested object and
//! infers a field list from the raw records. A field whose sampled values
//! disagree on type is classified as `Other`; a field that was only ever
//! null is classified as `Other` with provider type `null`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::FieldMetadata;
use conduit_core::ListObjectMetadataResult;
use conduit_core::ObjectMetadata;
use conduit_core::ReadParams;
use conduit_core::Reader;
use conduit_core::Record;
use conduit_core::SchemaProvider;
use conduit_core::ValueType;
use serde_json::Value;
use tracing::debug;

use crate::schema::ensure_objects;

// ============================================================================
// SECTION: Inference
// ============================================================================

/// JSON type name of a sampled value.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Infers object metadata from sampled records.
///
/// Integers and floats mixed in one field widen to `number`.
#[must_use]
pub fn infer_object_metadata(object_name: &str, records: &[Record]) -> ObjectMetadata {
    let mut observed: BTreeMap<&str, &'static str> = BTreeMap::new();
    let mut conflicts: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        for (name, value) in record {
            let seen = json_type_name(value);
            let entry = observed.entry(name.as_str()).or_insert(seen);
            *entry = match (*entry, seen) {
                (current, "null") => current,
                ("null", next) => next,
                (current, next) if current == next => current,
                ("integer", "number") | ("number", "integer") => "number",
                (current, _) => {
                    conflicts.insert(name.as_str());
                    current
                }
            };
        }
    }
    let mut metadata = ObjectMetadata::new(object_name);
    for (name, json_type) in observed {
        let (value_type, provider_type) = if conflicts.contains(name) {
            (ValueType::Other, "mixed")
        } else {
            (ValueType::from_json_schema(Some(json_type), None, false), json_type)
        };
        metadata.add_field(name, FieldMetadata::new(name, value_type, provider_type));
    }
    metadata
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Schema provider that samples records through a reader.
pub struct SamplingSchemaProvider {
    /// Reader used to fetch the sample page.
    reader: Arc<dyn Reader>,
    /// Number of records requested per sample.
    page_size: usize,
}

impl SamplingSchemaProvider {
    /// Creates a provider sampling `page_size` records per object.
    #[must_use]
    pub fn new(reader: Arc<dyn Reader>, page_size: usize) -> Self {
        Self {
            reader,
            page_size: page_size.max(1),
        }
    }

    /// Samples one object.
    fn sample(&self, ctx: &Context, object_name: &str) -> Result<ObjectMetadata, ConnectorError> {
        let params = ReadParams::new(object_name).with_page_size(self.page_size);
        let page = self.reader.read(ctx, &params)?;
        if page.data.is_empty() {
            return Err(ConnectorError::SchemaNotFound(format!(
                "no records to sample for {object_name}"
            )));
        }
        let records: Vec<Record> = page.data.into_iter().map(|row| row.raw).collect();
        debug!(object = object_name, sampled = records.len(), "inferred metadata from records");
        Ok(infer_object_metadata(object_name, &records))
    }
}

impl SchemaProvider for SamplingSchemaProvider {
    fn list_object_metadata(
        &self,
        ctx: &Context,
        object_names: &[String],
    ) -> Result<ListObjectMetadataResult, ConnectorError> {
        ensure_objects(object_names)?;
        let mut result = ListObjectMetadataResult::default();
        for object_name in object_names {
            ctx.check()?;
            match self.sample(ctx, object_name) {
                Ok(metadata) => result.insert_metadata(object_name.clone(), metadata),
                Err(err) => result.insert_error(object_name.clone(), err),
            }
        }
        Ok(result)
    }
}
