// crates/conduit-core/src/core/schema.rs
// ============================================================================
// Module: Conduit Input Schema
// Description: JSON Schema Draft 2020-12 data model with vendor extensions.
// Purpose: Carry parsed object schemas and compute their structural identity.
// Dependencies: serde, serde_json, crate::core::{hashing, error}
// ============================================================================

//! ## Overview
//! [`InputSchema`] models every Draft 2020-12 keyword plus two vendor
//! extensions: `x-amp-id-field` marks the record identifier property and
//! `x-amp-updated-field` marks the mutation timestamp property. Schemas are
//! parsed once and treated as immutable afterwards.
//!
//! Identity hashing emits keywords in a fixed order, sorts every map by key,
//! prefixes array elements with their index, and skips `examples` so that
//! documentation never changes identity.
//! Invariants:
//! - A schema declares at most one id-field and at most one updated-field.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;

use crate::core::error::ConnectorError;
use crate::core::hashing::HashBuilder;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::Hashable;
use crate::core::hashing::len_i64;
use crate::core::metadata::FieldMetadata;
use crate::core::metadata::FieldValue;
use crate::core::metadata::ObjectMetadata;
use crate::core::metadata::ValueType;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Vendor keyword marking the record identifier property.
pub const ID_FIELD_KEYWORD: &str = "x-amp-id-field";
/// Vendor keyword marking the mutation timestamp property.
pub const UPDATED_FIELD_KEYWORD: &str = "x-amp-updated-field";

// ============================================================================
// SECTION: Keyword Value Types
// ============================================================================

/// Subschema position: either a boolean schema or a full schema object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaNode {
    /// `true` accepts everything; `false` rejects everything.
    Bool(bool),
    /// Full schema object.
    Schema(Box<InputSchema>),
}

impl SchemaNode {
    /// Returns the schema object when this node is not a boolean schema.
    #[must_use]
    pub fn as_schema(&self) -> Option<&InputSchema> {
        match self {
            Self::Bool(_) => None,
            Self::Schema(schema) => Some(schema),
        }
    }
}

impl Hashable for SchemaNode {
    fn update_hash(&self, hasher: &mut HashBuilder) {
        match self {
            Self::Bool(flag) => {
                hasher.string("bool");
                hasher.bool(*flag);
            }
            Self::Schema(schema) => {
                hasher.string("schema");
                hasher.hashable(schema.as_ref());
            }
        }
    }
}

/// The `type` keyword: a single type name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// Single type name.
    Single(String),
    /// Several admissible type names.
    Multiple(Vec<String>),
}

impl SchemaType {
    /// Returns the first non-null type name.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(name) => Some(name.as_str()),
            Self::Multiple(names) => names
                .iter()
                .map(String::as_str)
                .find(|name| *name != "null")
                .or_else(|| names.first().map(String::as_str)),
        }
    }

    /// Returns true when `name` is one of the admissible types.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::Single(single) => single == name,
            Self::Multiple(names) => names.iter().any(|candidate| candidate == name),
        }
    }
}

/// Exclusive bound: a Draft 2020-12 number or a legacy Draft 4 boolean flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    /// Draft 6+ numeric exclusive bound.
    Value(Number),
    /// Draft 4 flag that makes `minimum`/`maximum` exclusive.
    Flag(bool),
}

// ============================================================================
// SECTION: Input Schema
// ============================================================================

/// JSON Schema Draft 2020-12 document.
///
/// # Invariants
/// - At most one top-level property carries `x-amp-id-field: true`.
/// - At most one top-level property carries `x-amp-updated-field: true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSchema {
    // Core identifiers.
    /// `$schema` dialect URI.
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    /// `$id` base URI.
    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `$ref` reference.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// `$anchor` plain-name fragment.
    #[serde(rename = "$anchor", default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// `$dynamicRef` reference.
    #[serde(rename = "$dynamicRef", default, skip_serializing_if = "Option::is_none")]
    pub dynamic_ref: Option<String>,
    /// `$dynamicAnchor` fragment.
    #[serde(rename = "$dynamicAnchor", default, skip_serializing_if = "Option::is_none")]
    pub dynamic_anchor: Option<String>,
    /// `$comment` annotation.
    #[serde(rename = "$comment", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// `$defs` reusable definitions.
    #[serde(rename = "$defs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defs: BTreeMap<String, SchemaNode>,

    // Composition.
    /// `allOf` subschemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaNode>,
    /// `anyOf` subschemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaNode>,
    /// `oneOf` subschemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaNode>,
    /// `not` subschema.
    #[serde(rename = "not", default, skip_serializing_if = "Option::is_none")]
    pub not_schema: Option<SchemaNode>,
    /// `if` subschema.
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub if_schema: Option<SchemaNode>,
    /// `then` subschema.
    #[serde(rename = "then", default, skip_serializing_if = "Option::is_none")]
    pub then_schema: Option<SchemaNode>,
    /// `else` subschema.
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub else_schema: Option<SchemaNode>,

    // Validation of any instance.
    /// `type` keyword.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// `enum` admissible values.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// `const` admissible value.
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,

    // Arrays.
    /// `items` schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<SchemaNode>,
    /// `prefixItems` positional schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix_items: Vec<SchemaNode>,
    /// `contains` schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<SchemaNode>,
    /// `minContains` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_contains: Option<u64>,
    /// `maxContains` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_contains: Option<u64>,
    /// `uniqueItems` flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    /// `minItems` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// `maxItems` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// `unevaluatedItems` schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unevaluated_items: Option<SchemaNode>,

    // Objects.
    /// `properties` schemas.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaNode>,
    /// `patternProperties` schemas.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pattern_properties: BTreeMap<String, SchemaNode>,
    /// `additionalProperties` schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<SchemaNode>,
    /// `propertyNames` schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_names: Option<SchemaNode>,
    /// `required` property names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// `dependentRequired` property names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependent_required: BTreeMap<String, Vec<String>>,
    /// `dependentSchemas` schemas.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependent_schemas: BTreeMap<String, SchemaNode>,
    /// `unevaluatedProperties` schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unevaluated_properties: Option<SchemaNode>,
    /// `minProperties` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    /// `maxProperties` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    // Numbers.
    /// `multipleOf` divisor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    /// `minimum` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    /// `maximum` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    /// `exclusiveMinimum` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<ExclusiveBound>,
    /// `exclusiveMaximum` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<ExclusiveBound>,

    // Strings.
    /// `minLength` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// `maxLength` bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// `pattern` regular expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// `format` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    // Content.
    /// `contentEncoding` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    /// `contentMediaType` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_media_type: Option<String>,
    /// `contentSchema` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_schema: Option<SchemaNode>,

    // Metadata.
    /// `title` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `description` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `default` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// `examples` annotation; excluded from identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<Value>>,
    /// `deprecated` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// `readOnly` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    /// `writeOnly` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,

    // Vendor extensions.
    /// Marks this property as the record identifier.
    #[serde(rename = "x-amp-id-field", default, skip_serializing_if = "is_false")]
    pub id_field: bool,
    /// Marks this property as the mutation timestamp.
    #[serde(rename = "x-amp-updated-field", default, skip_serializing_if = "is_false")]
    pub updated_field: bool,

    /// Unrecognized keywords, preserved verbatim.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// Serde helper that skips false vendor flags.
#[allow(clippy::trivially_copy_pass_by_ref, reason = "serde skip_serializing_if signature.")]
const fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// SECTION: Special Fields
// ============================================================================

/// Names of the vendor-marked id and updated properties of a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialFields {
    /// Property carrying `x-amp-id-field: true`.
    pub id_field: Option<String>,
    /// Property carrying `x-amp-updated-field: true`.
    pub updated_field: Option<String>,
}

impl SpecialFields {
    /// Extracts special fields from a raw schema document.
    ///
    /// Reading the raw document keeps vendor keywords that a compiled
    /// validator would discard.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] when more than one property
    /// claims the same vendor marker.
    pub fn from_raw(object_name: &str, raw: &Value) -> Result<Self, ConnectorError> {
        let mut fields = Self::default();
        let Some(properties) = raw.get("properties").and_then(Value::as_object) else {
            return Ok(fields);
        };
        for (name, property) in properties {
            let marked =
                |keyword: &str| property.get(keyword).and_then(Value::as_bool) == Some(true);
            if marked(ID_FIELD_KEYWORD) {
                claim(object_name, ID_FIELD_KEYWORD, &mut fields.id_field, name)?;
            }
            if marked(UPDATED_FIELD_KEYWORD) {
                claim(object_name, UPDATED_FIELD_KEYWORD, &mut fields.updated_field, name)?;
            }
        }
        Ok(fields)
    }
}

/// Records a vendor marker, failing when one is already claimed.
fn claim(
    object_name: &str,
    keyword: &str,
    slot: &mut Option<String>,
    name: &str,
) -> Result<(), ConnectorError> {
    if let Some(existing) = slot {
        return Err(ConnectorError::InvalidSchema(format!(
            "object {object_name} declares {keyword} on both {existing} and {name}"
        )));
    }
    *slot = Some(name.to_string());
    Ok(())
}

// ============================================================================
// SECTION: Accessors
// ============================================================================

impl InputSchema {
    /// Parses a schema from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] when the bytes are not a
    /// schema document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConnectorError> {
        serde_json::from_slice(bytes).map_err(|err| ConnectorError::InvalidSchema(err.to_string()))
    }

    /// Parses a schema from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] when the value is not a
    /// schema document.
    pub fn from_value(value: Value) -> Result<Self, ConnectorError> {
        serde_json::from_value(value).map_err(|err| ConnectorError::InvalidSchema(err.to_string()))
    }

    /// Serializes the schema back into a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Serialization`] when serialization fails.
    pub fn to_value(&self) -> Result<Value, ConnectorError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Returns the first non-null declared type.
    #[must_use]
    pub fn primary_type(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(SchemaType::primary)
    }

    /// Returns the schema object of a top-level property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Self> {
        self.properties.get(name).and_then(SchemaNode::as_schema)
    }

    /// Returns true when the property is listed in `required`.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|required| required == name)
    }

    /// Returns the vendor-marked id and updated properties.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] when a marker is claimed by
    /// more than one property.
    pub fn special_fields(&self, object_name: &str) -> Result<SpecialFields, ConnectorError> {
        let mut fields = SpecialFields::default();
        for (name, node) in &self.properties {
            let Some(property) = node.as_schema() else {
                continue;
            };
            if property.id_field {
                claim(object_name, ID_FIELD_KEYWORD, &mut fields.id_field, name)?;
            }
            if property.updated_field {
                claim(object_name, UPDATED_FIELD_KEYWORD, &mut fields.updated_field, name)?;
            }
        }
        Ok(fields)
    }

    /// Derives object metadata from the top-level properties.
    ///
    /// Display names come from `title`, falling back to the property name.
    /// Arrays of enumerated items classify as multi-select.
    #[must_use]
    pub fn to_object_metadata(&self, object_name: &str) -> ObjectMetadata {
        let display_name = self.title.clone().unwrap_or_else(|| object_name.to_string());
        let mut metadata = ObjectMetadata::new(display_name);
        for (name, node) in &self.properties {
            let field = match node.as_schema() {
                Some(property) => property.to_field_metadata(name, self.is_required(name)),
                None => {
                    let mut field = FieldMetadata::new(name.clone(), ValueType::Other, "any");
                    field.is_required = Some(self.is_required(name));
                    field
                }
            };
            metadata.add_field(name.clone(), field);
        }
        metadata
    }

    /// Derives field metadata for this schema used as a property.
    #[must_use]
    pub fn to_field_metadata(&self, name: &str, required: bool) -> FieldMetadata {
        let json_type = self.primary_type();
        let item_enum = self
            .items
            .as_ref()
            .and_then(SchemaNode::as_schema)
            .and_then(|items| items.enum_values.as_ref());
        let (value_type, values) = match (json_type, item_enum) {
            (Some("array"), Some(values)) => (ValueType::MultiSelect, values.as_slice()),
            _ => {
                let values = self.enum_values.as_deref().unwrap_or_default();
                let format = self.format.as_deref();
                let value_type = ValueType::from_json_schema(json_type, format, !values.is_empty());
                (value_type, values)
            }
        };
        let display_name = self.title.clone().unwrap_or_else(|| name.to_string());
        let provider_type = match (json_type, self.format.as_deref()) {
            (Some(json_type), Some(format)) => format!("{json_type}:{format}"),
            (Some(json_type), None) => json_type.to_string(),
            (None, _) if self.reference.is_some() => "ref".to_string(),
            (None, _) => "any".to_string(),
        };
        let mut field = FieldMetadata::new(display_name, value_type, provider_type);
        field.read_only = Some(self.read_only.unwrap_or(false));
        field.is_required = Some(required);
        field.values = values.iter().map(FieldValue::from_json).collect();
        field
    }

    /// Computes the structural identity digest of the schema.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when a numeric keyword cannot be canonicalized.
    pub fn identity_hash(&self) -> Result<HashDigest, HashError> {
        let mut hasher = HashBuilder::new();
        self.update_hash(&mut hasher);
        hasher.finish()
    }
}

// ============================================================================
// SECTION: Identity Hashing
// ============================================================================

/// Hashes an optional subschema.
fn node_opt(hasher: &mut HashBuilder, node: Option<&SchemaNode>) {
    match node {
        None => hasher.nil(),
        Some(node) => {
            hasher.non_nil();
            hasher.hashable(node);
        }
    }
}

/// Hashes an ordered list of subschemas with index prefixes.
fn node_list(hasher: &mut HashBuilder, nodes: &[SchemaNode]) {
    hasher.int64(len_i64(nodes.len()));
    for (index, node) in nodes.iter().enumerate() {
        hasher.int64(len_i64(index));
        hasher.hashable(node);
    }
}

/// Hashes a keyed map of subschemas in ascending key order.
fn node_map(hasher: &mut HashBuilder, nodes: &BTreeMap<String, SchemaNode>) {
    let mut keys: Vec<&String> = nodes.keys().collect();
    keys.sort();
    hasher.int64(len_i64(keys.len()));
    for key in keys {
        hasher.string(key);
        if let Some(node) = nodes.get(key) {
            hasher.hashable(node);
        }
    }
}

/// Hashes an optional JSON value.
fn value_opt(hasher: &mut HashBuilder, value: Option<&Value>) {
    match value {
        None => hasher.nil(),
        Some(value) => {
            hasher.non_nil();
            hasher.hashable(value);
        }
    }
}

/// Hashes an optional list of JSON values with index prefixes.
fn value_list_opt(hasher: &mut HashBuilder, values: Option<&Vec<Value>>) {
    match values {
        None => hasher.nil(),
        Some(values) => {
            hasher.non_nil();
            hasher.int64(len_i64(values.len()));
            for (index, value) in values.iter().enumerate() {
                hasher.int64(len_i64(index));
                hasher.hashable(value);
            }
        }
    }
}

/// Hashes an optional non-negative bound.
fn u64_opt(hasher: &mut HashBuilder, value: Option<u64>) {
    match value {
        None => hasher.nil(),
        Some(value) => {
            hasher.non_nil();
            hasher.int64(i64::try_from(value).unwrap_or(i64::MAX));
        }
    }
}

/// Hashes an optional numeric keyword as a canonical rational.
fn number_opt(hasher: &mut HashBuilder, value: Option<&Number>) {
    match value {
        None => hasher.nil(),
        Some(number) => {
            hasher.non_nil();
            hasher.rat_str(&number.to_string());
        }
    }
}

/// Hashes an optional exclusive bound.
fn exclusive_opt(hasher: &mut HashBuilder, value: Option<&ExclusiveBound>) {
    match value {
        None => hasher.nil(),
        Some(ExclusiveBound::Value(number)) => {
            hasher.non_nil();
            hasher.string("value");
            hasher.rat_str(&number.to_string());
        }
        Some(ExclusiveBound::Flag(flag)) => {
            hasher.non_nil();
            hasher.string("flag");
            hasher.bool(*flag);
        }
    }
}

/// Hashes an optional `type` keyword.
fn type_opt(hasher: &mut HashBuilder, value: Option<&SchemaType>) {
    match value {
        None => hasher.nil(),
        Some(SchemaType::Single(name)) => {
            hasher.non_nil();
            hasher.string(name);
        }
        Some(SchemaType::Multiple(names)) => {
            hasher.non_nil();
            hasher.int64(len_i64(names.len()));
            for (index, name) in names.iter().enumerate() {
                hasher.int64(len_i64(index));
                hasher.string(name);
            }
        }
    }
}

/// Hashes an ordered list of strings with index prefixes.
fn string_list(hasher: &mut HashBuilder, values: &[String]) {
    hasher.int64(len_i64(values.len()));
    for (index, value) in values.iter().enumerate() {
        hasher.int64(len_i64(index));
        hasher.string(value);
    }
}

impl Hashable for InputSchema {
    fn update_hash(&self, hasher: &mut HashBuilder) {
        hasher.string_opt(self.dialect.as_deref());
        hasher.string_opt(self.id.as_deref());
        hasher.string_opt(self.reference.as_deref());
        hasher.string_opt(self.anchor.as_deref());
        hasher.string_opt(self.dynamic_ref.as_deref());
        hasher.string_opt(self.dynamic_anchor.as_deref());
        hasher.string_opt(self.comment.as_deref());
        node_map(hasher, &self.defs);

        node_list(hasher, &self.all_of);
        node_list(hasher, &self.any_of);
        node_list(hasher, &self.one_of);
        node_opt(hasher, self.not_schema.as_ref());
        node_opt(hasher, self.if_schema.as_ref());
        node_opt(hasher, self.then_schema.as_ref());
        node_opt(hasher, self.else_schema.as_ref());

        type_opt(hasher, self.schema_type.as_ref());
        value_list_opt(hasher, self.enum_values.as_ref());
        value_opt(hasher, self.const_value.as_ref());

        node_opt(hasher, self.items.as_ref());
        node_list(hasher, &self.prefix_items);
        node_opt(hasher, self.contains.as_ref());
        u64_opt(hasher, self.min_contains);
        u64_opt(hasher, self.max_contains);
        hasher.bool_opt(self.unique_items);
        u64_opt(hasher, self.min_items);
        u64_opt(hasher, self.max_items);
        node_opt(hasher, self.unevaluated_items.as_ref());

        node_map(hasher, &self.properties);
        node_map(hasher, &self.pattern_properties);
        node_opt(hasher, self.additional_properties.as_ref());
        node_opt(hasher, self.property_names.as_ref());
        string_list(hasher, &self.required);
        let mut dependent_keys: Vec<&String> = self.dependent_required.keys().collect();
        dependent_keys.sort();
        hasher.int64(len_i64(dependent_keys.len()));
        for key in dependent_keys {
            hasher.string(key);
            if let Some(names) = self.dependent_required.get(key) {
                string_list(hasher, names);
            }
        }
        node_map(hasher, &self.dependent_schemas);
        node_opt(hasher, self.unevaluated_properties.as_ref());
        u64_opt(hasher, self.min_properties);
        u64_opt(hasher, self.max_properties);

        number_opt(hasher, self.multiple_of.as_ref());
        number_opt(hasher, self.minimum.as_ref());
        number_opt(hasher, self.maximum.as_ref());
        exclusive_opt(hasher, self.exclusive_minimum.as_ref());
        exclusive_opt(hasher, self.exclusive_maximum.as_ref());

        u64_opt(hasher, self.min_length);
        u64_opt(hasher, self.max_length);
        hasher.string_opt(self.pattern.as_deref());
        hasher.string_opt(self.format.as_deref());

        hasher.string_opt(self.content_encoding.as_deref());
        hasher.string_opt(self.content_media_type.as_deref());
        node_opt(hasher, self.content_schema.as_ref());

        hasher.string_opt(self.title.as_deref());
        hasher.string_opt(self.description.as_deref());
        value_opt(hasher, self.default.as_ref());
        hasher.bool_opt(self.deprecated);
        hasher.bool_opt(self.read_only);
        hasher.bool_opt(self.write_only);

        hasher.bool(self.id_field);
        hasher.bool(self.updated_field);

        let mut extension_keys: Vec<&String> = self.extensions.keys().collect();
        extension_keys.sort();
        hasher.int64(len_i64(extension_keys.len()));
        for key in extension_keys {
            hasher.string(key);
            if let Some(value) = self.extensions.get(key) {
                hasher.hashable(value);
            }
        }
    }
}
