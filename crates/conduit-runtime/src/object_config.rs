// crates/conduit-runtime/src/object_config.rs
// ============================================================================
// Module: Object Config Paths
// Description: Typed per-object settings carried in flat metadata maps.
// Purpose: Round-trip `$['objects']['name']['property']` keys losslessly.
// Dependencies: conduit-core
// ============================================================================

//! ## Overview
//! Catalog metadata is a flat string map. Per-object settings are stored in
//! it under bracketed path keys such as `$['objects']['orders']['query']`.
//! [`ObjectConfigs`] is the typed nested view. Segment text escapes `'` and
//! `\` with a backslash, so names containing either survive the round trip.
//!
//! Keys that do not start with `$[` belong to other metadata and are ignored
//! when parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use conduit_core::ConnectorError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Root segment of object config keys.
const OBJECTS_SEGMENT: &str = "objects";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Settings of one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectConfig {
    /// Property values keyed by property name.
    pub properties: BTreeMap<String, String>,
}

impl ObjectConfig {
    /// Returns a property value.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    /// Sets a property value.
    #[must_use]
    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }
}

/// Settings of every configured object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectConfigs {
    /// Object settings keyed by object name.
    pub objects: BTreeMap<String, ObjectConfig>,
}

impl ObjectConfigs {
    /// Returns the settings of one object.
    #[must_use]
    pub fn get(&self, object_name: &str) -> Option<&ObjectConfig> {
        self.objects.get(object_name)
    }

    /// Adds settings for one object.
    #[must_use]
    pub fn with(mut self, object_name: impl Into<String>, config: ObjectConfig) -> Self {
        self.objects.insert(object_name.into(), config);
        self
    }

    /// Parses object settings out of a flat metadata map.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidParameter`] for malformed path keys or
    /// paths outside `$['objects'][name][property]`.
    pub fn from_metadata(metadata: &BTreeMap<String, String>) -> Result<Self, ConnectorError> {
        let mut configs = Self::default();
        for (key, value) in metadata {
            if !key.starts_with("$[") {
                continue;
            }
            let segments = parse_path(key)?;
            let [root, object_name, property] = segments.as_slice() else {
                return Err(invalid_key(key, "expected three segments"));
            };
            if root != OBJECTS_SEGMENT {
                return Err(invalid_key(key, "root segment must be 'objects'"));
            }
            configs
                .objects
                .entry(object_name.clone())
                .or_default()
                .properties
                .insert(property.clone(), value.clone());
        }
        Ok(configs)
    }

    /// Renders the settings as flat metadata entries.
    #[must_use]
    pub fn to_metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        for (object_name, config) in &self.objects {
            for (property, value) in &config.properties {
                let key = render_path(&[OBJECTS_SEGMENT, object_name.as_str(), property.as_str()]);
                metadata.insert(key, value.clone());
            }
        }
        metadata
    }
}

// ============================================================================
// SECTION: Path Codec
// ============================================================================

/// Renders bracketed path segments.
#[must_use]
pub fn render_path(segments: &[&str]) -> String {
    let mut out = String::from("$");
    for segment in segments {
        out.push_str("['");
        for ch in segment.chars() {
            if ch == '\'' || ch == '\\' {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push_str("']");
    }
    out
}

/// Parses bracketed path segments.
///
/// # Errors
///
/// Returns [`ConnectorError::InvalidParameter`] when the key is malformed.
pub fn parse_path(key: &str) -> Result<Vec<String>, ConnectorError> {
    let mut chars = key.chars().peekable();
    if chars.next() != Some('$') {
        return Err(invalid_key(key, "missing '$' root"));
    }
    let mut segments = Vec::new();
    while chars.peek().is_some() {
        if chars.next() != Some('[') || chars.next() != Some('\'') {
            return Err(invalid_key(key, "expected \"['\""));
        }
        let mut segment = String::new();
        loop {
            match chars.next() {
                Some('\\') => match chars.next() {
                    Some(escaped) => segment.push(escaped),
                    None => return Err(invalid_key(key, "dangling escape")),
                },
                Some('\'') => break,
                Some(ch) => segment.push(ch),
                None => return Err(invalid_key(key, "unterminated segment")),
            }
        }
        if chars.next() != Some(']') {
            return Err(invalid_key(key, "expected \"]\""));
        }
        segments.push(segment);
    }
    Ok(segments)
}

/// Builds the error for a malformed key.
fn invalid_key(key: &str, reason: &str) -> ConnectorError {
    ConnectorError::InvalidParameter(format!("object config key '{key}': {reason}"))
}
