// crates/conduit-runtime/src/schema/openapi.rs
// ============================================================================
// Module: OpenAPI Schema Provider
// Description: Object metadata from OpenAPI 3 components or Swagger 2 definitions.
// Purpose: Serve ListObjectMetadata from a static API description.
// Dependencies: conduit-core, serde_json
// ============================================================================

//! ## Overview
//! The provider indexes `/components/schemas` (OpenAPI 3) or `/definitions`
//! (Swagger 2) once at construction. Lookups try the exact object name, then
//! a case-insensitive match. Top-level `$ref` aliases are followed and
//! `allOf` members are merged so that composed models expose every property.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::InputSchema;
use conduit_core::ListObjectMetadataResult;
use conduit_core::ObjectMetadata;
use conduit_core::SchemaProvider;
use serde_json::Map;
use serde_json::Value;

use crate::schema::ensure_objects;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum `$ref` hops followed for one model.
const MAX_REF_DEPTH: usize = 8;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Schema provider backed by an OpenAPI document.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiSchemaProvider {
    /// Model schemas keyed by model name.
    schemas: BTreeMap<String, Value>,
}

impl OpenApiSchemaProvider {
    /// Indexes the models of an OpenAPI or Swagger document.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] when the document has neither
    /// `/components/schemas` nor `/definitions`.
    pub fn from_document(document: &Value) -> Result<Self, ConnectorError> {
        let schemas = document
            .pointer("/components/schemas")
            .or_else(|| document.pointer("/definitions"))
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ConnectorError::InvalidSchema(
                    "openapi document has no components/schemas or definitions".to_string(),
                )
            })?;
        Ok(Self {
            schemas: schemas.iter().map(|(name, schema)| (name.clone(), schema.clone())).collect(),
        })
    }

    /// Parses and indexes a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] when the bytes are not JSON
    /// or the document has no models.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConnectorError> {
        let document: Value = serde_json::from_slice(bytes)
            .map_err(|err| ConnectorError::InvalidSchema(format!("openapi document: {err}")))?;
        Self::from_document(&document)
    }

    /// Returns the indexed model names.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Resolves metadata for one object.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SchemaNotFound`] for unknown models and
    /// [`ConnectorError::SchemaConversion`] for models that do not parse.
    pub fn object_metadata(&self, object_name: &str) -> Result<ObjectMetadata, ConnectorError> {
        let (model_name, model) = self.lookup(object_name).ok_or_else(|| {
            ConnectorError::SchemaNotFound(format!("no openapi model named {object_name}"))
        })?;
        let merged = self.flatten(model_name, model)?;
        let schema = InputSchema::from_value(merged).map_err(|err| {
            let detail = err.detail();
            ConnectorError::SchemaConversion(format!("openapi model {model_name}: {detail}"))
        })?;
        let mut metadata = schema.to_object_metadata(object_name);
        if schema.title.is_none() {
            metadata.display_name = model_name.to_string();
        }
        Ok(metadata)
    }

    /// Finds a model by exact name, then ignoring case.
    fn lookup(&self, object_name: &str) -> Option<(&str, &Value)> {
        self.schemas
            .get_key_value(object_name)
            .or_else(|| {
                self.schemas.iter().find(|(name, _)| name.eq_ignore_ascii_case(object_name))
            })
            .map(|(name, schema)| (name.as_str(), schema))
    }

    /// Resolves a local model reference.
    fn resolve_ref(&self, reference: &str) -> Option<&Value> {
        let name = reference
            .strip_prefix("#/components/schemas/")
            .or_else(|| reference.strip_prefix("#/definitions/"))?;
        self.schemas.get(name)
    }

    /// Follows `$ref` aliases and merges `allOf` members into one object schema.
    fn flatten(&self, model_name: &str, model: &Value) -> Result<Value, ConnectorError> {
        let mut current = model;
        for _ in 0 .. MAX_REF_DEPTH {
            let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
                return self.merge_all_of(model_name, current, 0);
            };
            current = self.resolve_ref(reference).ok_or_else(|| {
                ConnectorError::SchemaConversion(format!(
                    "openapi model {model_name}: unresolved reference {reference}"
                ))
            })?;
        }
        Err(ConnectorError::SchemaConversion(format!(
            "openapi model {model_name}: reference chain exceeds {MAX_REF_DEPTH} hops"
        )))
    }

    /// Merges `properties` and `required` of every `allOf` member into `model`.
    fn merge_all_of(
        &self,
        model_name: &str,
        model: &Value,
        depth: usize,
    ) -> Result<Value, ConnectorError> {
        let Some(members) = model.get("allOf").and_then(Value::as_array) else {
            return Ok(model.clone());
        };
        if depth >= MAX_REF_DEPTH {
            return Err(ConnectorError::SchemaConversion(format!(
                "openapi model {model_name}: allOf nesting exceeds {MAX_REF_DEPTH} levels"
            )));
        }
        let mut merged = model.as_object().cloned().unwrap_or_default();
        merged.remove("allOf");
        for member in members {
            let member = match member.get("$ref").and_then(Value::as_str) {
                Some(reference) => self.resolve_ref(reference).ok_or_else(|| {
                    ConnectorError::SchemaConversion(format!(
                        "openapi model {model_name}: unresolved reference {reference}"
                    ))
                })?,
                None => member,
            };
            let member = self.merge_all_of(model_name, member, depth + 1)?;
            absorb_member(&mut merged, &member);
        }
        merged.entry("type").or_insert_with(|| Value::String("object".to_string()));
        Ok(Value::Object(merged))
    }
}

/// Copies the properties and required names of one member into `target`.
fn absorb_member(target: &mut Map<String, Value>, member: &Value) {
    if let Some(properties) = member.get("properties").and_then(Value::as_object) {
        let entry = target.entry("properties").or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(existing) = entry {
            for (name, schema) in properties {
                existing.entry(name.clone()).or_insert_with(|| schema.clone());
            }
        }
    }
    if let Some(required) = member.get("required").and_then(Value::as_array) {
        let entry = target.entry("required").or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(existing) = entry {
            for name in required {
                if !existing.contains(name) {
                    existing.push(name.clone());
                }
            }
        }
    }
}

impl SchemaProvider for OpenApiSchemaProvider {
    fn list_object_metadata(
        &self,
        ctx: &Context,
        object_names: &[String],
    ) -> Result<ListObjectMetadataResult, ConnectorError> {
        ensure_objects(object_names)?;
        ctx.check()?;
        let mut result = ListObjectMetadataResult::default();
        for object_name in object_names {
            match self.object_metadata(object_name) {
                Ok(metadata) => result.insert_metadata(object_name.clone(), metadata),
                Err(err) => result.insert_error(object_name.clone(), err),
            }
        }
        Ok(result)
    }
}
