// crates/conduit-deepmock/src/registry.rs
// ============================================================================
// Module: Schema Registry
// Description: Per-object schemas resolved from parsed, raw, and derived sources.
// Purpose: Compile every object schema once and keep it read-only afterwards.
// Dependencies: conduit-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! Object schemas reach the mock from three sources, consulted in order:
//! parsed [`InputSchema`] values, raw JSON bytes, and schemas derived from
//! native types through [`DerivedSchema`]. Raw bytes beat a derived schema
//! for the same object and a warning is logged.
//!
//! Vendor markers (`x-amp-id-field`, `x-amp-updated-field`) are read from the
//! raw document before compilation so that `$ref`-heavy schemas keep them.
//!
//! ## Invariants
//! - The registry is immutable once built.
//! - Every entry's schema compiled successfully.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use conduit_core::ConnectorError;
use conduit_core::InputSchema;
use conduit_core::SpecialFields;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::validator::RecordValidator;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a schema file read from disk.
pub const MAX_SCHEMA_FILE_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Sources
// ============================================================================

/// Native type that can describe itself as a JSON Schema document.
pub trait DerivedSchema {
    /// Object name the schema is registered under.
    const OBJECT_NAME: &'static str;

    /// Returns the JSON Schema document describing the type.
    fn json_schema() -> Value;
}

/// Schema inputs collected before the registry is built.
#[derive(Debug, Clone, Default)]
pub struct SchemaSources {
    /// Already-parsed schemas.
    parsed: BTreeMap<String, InputSchema>,
    /// Raw JSON schema documents.
    raw: BTreeMap<String, Vec<u8>>,
    /// Schemas derived from native types.
    derived: BTreeMap<String, Value>,
}

impl SchemaSources {
    /// Creates an empty source set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parsed schema.
    #[must_use]
    pub fn with_parsed(mut self, object_name: impl Into<String>, schema: InputSchema) -> Self {
        self.parsed.insert(object_name.into(), schema);
        self
    }

    /// Adds a raw JSON schema document.
    #[must_use]
    pub fn with_raw(mut self, object_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.raw.insert(object_name.into(), bytes.into());
        self
    }

    /// Adds the schema a native type derives for itself.
    #[must_use]
    pub fn with_derived<T: DerivedSchema>(mut self) -> Self {
        self.derived.insert(T::OBJECT_NAME.to_string(), T::json_schema());
        self
    }

    /// Adds one raw schema file per object.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] when a file cannot be read or
    /// exceeds [`MAX_SCHEMA_FILE_BYTES`].
    pub fn with_files(mut self, paths: &BTreeMap<String, PathBuf>) -> Result<Self, ConnectorError> {
        for (object_name, path) in paths {
            let bytes = read_schema_file(path)?;
            self.raw.insert(object_name.clone(), bytes);
        }
        Ok(self)
    }

    /// Returns true when no source was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty() && self.raw.is_empty() && self.derived.is_empty()
    }
}

/// Reads a schema file with a size cap.
fn read_schema_file(path: &Path) -> Result<Vec<u8>, ConnectorError> {
    let failed = |reason: String| {
        ConnectorError::InvalidSchema(format!("schema file {}: {reason}", path.display()))
    };
    let file = File::open(path).map_err(|err| failed(err.to_string()))?;
    let limit = u64::try_from(MAX_SCHEMA_FILE_BYTES).unwrap_or(u64::MAX);
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| failed(err.to_string()))?;
    if bytes.len() > MAX_SCHEMA_FILE_BYTES {
        return Err(failed(format!("exceeds {MAX_SCHEMA_FILE_BYTES} bytes")));
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Entries
// ============================================================================

/// Compiled schema of one object.
pub struct SchemaEntry {
    /// Object name.
    object_name: String,
    /// Typed schema model.
    schema: InputSchema,
    /// Raw schema document as registered.
    raw: Value,
    /// Vendor-marked id and updated properties.
    special: SpecialFields,
    /// Compiled validator.
    validator: RecordValidator,
}

impl SchemaEntry {
    /// Builds an entry from a raw schema document.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] when the document is not an
    /// object schema, repeats a vendor marker, or does not compile.
    pub fn from_raw(object_name: &str, raw: Value) -> Result<Self, ConnectorError> {
        let special = SpecialFields::from_raw(object_name, &raw)?;
        let schema = InputSchema::from_value(raw.clone()).map_err(|err| {
            ConnectorError::InvalidSchema(format!("schema for {object_name}: {}", err.detail()))
        })?;
        if let Some(kind) = schema.primary_type()
            && kind != "object"
        {
            return Err(ConnectorError::InvalidSchema(format!(
                "schema for {object_name} must describe an object, found {kind}"
            )));
        }
        let validator = RecordValidator::compile(object_name, &raw)?;
        Ok(Self {
            object_name: object_name.to_string(),
            schema,
            raw,
            special,
            validator,
        })
    }

    /// Returns the object name.
    #[must_use]
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Returns the typed schema.
    #[must_use]
    pub const fn schema(&self) -> &InputSchema {
        &self.schema
    }

    /// Returns the raw schema document.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Returns the id-field name, if declared.
    #[must_use]
    pub fn id_field(&self) -> Option<&str> {
        self.special.id_field.as_deref()
    }

    /// Returns the updated-field name, if declared.
    #[must_use]
    pub fn updated_field(&self) -> Option<&str> {
        self.special.updated_field.as_deref()
    }

    /// Returns the vendor-marked fields.
    #[must_use]
    pub const fn special_fields(&self) -> &SpecialFields {
        &self.special
    }

    /// Returns the compiled validator.
    #[must_use]
    pub const fn validator(&self) -> &RecordValidator {
        &self.validator
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Read-only map from object name to compiled schema.
#[derive(Default)]
pub struct SchemaRegistry {
    /// Entries keyed by object name.
    entries: BTreeMap<String, SchemaEntry>,
}

impl SchemaRegistry {
    /// Resolves and compiles every source.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] for the first schema that
    /// fails to parse or compile.
    pub fn from_sources(sources: SchemaSources) -> Result<Self, ConnectorError> {
        let SchemaSources {
            mut parsed,
            mut raw,
            mut derived,
        } = sources;
        let names: BTreeSet<String> =
            parsed.keys().chain(raw.keys()).chain(derived.keys()).cloned().collect();
        let mut entries = BTreeMap::new();
        for name in names {
            let bytes = raw.remove(&name);
            let derived_value = derived.remove(&name);
            let document = if let Some(schema) = parsed.remove(&name) {
                if bytes.is_some() || derived_value.is_some() {
                    debug!(object = %name, "parsed schema takes precedence over other sources");
                }
                schema.to_value()?
            } else if let Some(bytes) = bytes {
                if derived_value.is_some() {
                    warn!(object = %name, "raw schema overrides derived schema");
                }
                serde_json::from_slice(&bytes).map_err(|err| {
                    ConnectorError::InvalidSchema(format!("schema for {name} is not JSON: {err}"))
                })?
            } else if let Some(value) = derived_value {
                value
            } else {
                continue;
            };
            let entry = SchemaEntry::from_raw(&name, document)?;
            entries.insert(name, entry);
        }
        debug!(objects = entries.len(), "schema registry built");
        Ok(Self {
            entries,
        })
    }

    /// Returns the entry of an object.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SchemaNotFound`] for unknown objects.
    pub fn get(&self, object_name: &str) -> Result<&SchemaEntry, ConnectorError> {
        self.entries.get(object_name).ok_or_else(|| {
            ConnectorError::SchemaNotFound(format!("no schema registered for {object_name}"))
        })
    }

    /// Returns the registered object names in ascending order.
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the vendor-marked fields of every object.
    #[must_use]
    pub fn special_fields(&self) -> BTreeMap<String, SpecialFields> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.special.clone()))
            .collect()
    }

    /// Returns the number of registered objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no schema is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
