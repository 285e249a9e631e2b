// crates/conduit-core/src/core/metadata.rs
// ============================================================================
// Module: Conduit Object Metadata
// Description: Field and object metadata returned by schema providers.
// Purpose: Describe provider objects in a provider-neutral shape.
// Dependencies: serde, crate::core::error
// ============================================================================

//! ## Overview
//! [`ObjectMetadata`] lists the fields of one object. The legacy `fields_map`
//! (field name to display name) is kept in sync with `fields` by the
//! constructors on this type. [`ListObjectMetadataResult`] carries per-object
//! successes and per-object failures side by side; an object never appears in
//! both maps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::ConnectorError;

// ============================================================================
// SECTION: Value Types
// ============================================================================

/// Provider-neutral field value classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    /// Free text.
    String,
    /// Whole number.
    Int,
    /// Floating point number.
    Float,
    /// True or false.
    Boolean,
    /// Calendar date.
    Date,
    /// Date with time of day.
    Datetime,
    /// One value out of a fixed list.
    SingleSelect,
    /// Several values out of a fixed list.
    MultiSelect,
    /// Anything else, including nested objects and arrays.
    Other,
}

impl ValueType {
    /// Classifies a JSON Schema type and format.
    ///
    /// `format` wins over `type` for dates; an enumeration wins over both.
    #[must_use]
    pub fn from_json_schema(json_type: Option<&str>, format: Option<&str>, has_enum: bool) -> Self {
        if has_enum {
            return Self::SingleSelect;
        }
        match (json_type, format) {
            (_, Some("date")) => Self::Date,
            (_, Some("date-time")) => Self::Datetime,
            (Some("string"), _) => Self::String,
            (Some("integer"), _) => Self::Int,
            (Some("number"), _) => Self::Float,
            (Some("boolean"), _) => Self::Boolean,
            _ => Self::Other,
        }
    }
}

/// Admissible value of a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Raw value sent to the provider.
    pub value: String,
    /// Human readable label.
    pub display_value: String,
}

impl FieldValue {
    /// Builds a select value whose label equals its raw text.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let text = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Self {
            value: text.clone(),
            display_value: text,
        }
    }
}

// ============================================================================
// SECTION: Field Metadata
// ============================================================================

/// Metadata describing one field of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Human readable field name.
    pub display_name: String,
    /// Provider-neutral value classification.
    pub value_type: ValueType,
    /// Raw provider type name.
    pub provider_type: String,
    /// True when the field cannot be written.
    pub read_only: Option<bool>,
    /// True when the field must be supplied on create.
    pub is_required: Option<bool>,
    /// True when the field is user-defined at the provider.
    pub is_custom: Option<bool>,
    /// Admissible values for select fields.
    pub values: Vec<FieldValue>,
}

impl FieldMetadata {
    /// Creates metadata with no optional attributes.
    #[must_use]
    pub fn new(
        display_name: impl Into<String>,
        value_type: ValueType,
        provider_type: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            value_type,
            provider_type: provider_type.into(),
            read_only: None,
            is_required: None,
            is_custom: None,
            values: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Object Metadata
// ============================================================================

/// Metadata describing one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Human readable object name.
    pub display_name: String,
    /// Fields keyed by field name.
    pub fields: BTreeMap<String, FieldMetadata>,
    /// Field name to display name; superseded by `fields`.
    pub fields_map: BTreeMap<String, String>,
}

impl ObjectMetadata {
    /// Creates empty metadata for an object.
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Adds a field, keeping `fields_map` in sync.
    pub fn add_field(&mut self, name: impl Into<String>, field: FieldMetadata) {
        let name = name.into();
        self.fields_map.insert(name.clone(), field.display_name.clone());
        self.fields.insert(name, field);
    }

    /// Builder-style variant of [`ObjectMetadata::add_field`].
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field: FieldMetadata) -> Self {
        self.add_field(name, field);
        self
    }
}

// ============================================================================
// SECTION: List Result
// ============================================================================

/// Outcome of a metadata listing across several objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectMetadataResult {
    /// Metadata for every resolved object.
    pub result: BTreeMap<String, ObjectMetadata>,
    /// Failure for every unresolved object.
    pub errors: BTreeMap<String, ConnectorError>,
}

impl ListObjectMetadataResult {
    /// Records metadata for an object, clearing any earlier failure.
    pub fn insert_metadata(&mut self, object_name: impl Into<String>, metadata: ObjectMetadata) {
        let object_name = object_name.into();
        self.errors.remove(&object_name);
        self.result.insert(object_name, metadata);
    }

    /// Records a failure for an object that has not resolved.
    ///
    /// A later failure for the same object replaces the earlier one.
    pub fn insert_error(&mut self, object_name: impl Into<String>, error: ConnectorError) {
        let object_name = object_name.into();
        if !self.result.contains_key(&object_name) {
            self.errors.insert(object_name, error);
        }
    }

    /// Returns true when the object resolved.
    #[must_use]
    pub fn is_resolved(&self, object_name: &str) -> bool {
        self.result.contains_key(object_name)
    }
}
