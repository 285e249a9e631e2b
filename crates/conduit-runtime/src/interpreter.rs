// crates/conduit-runtime/src/interpreter.rs
// ============================================================================
// Module: Error Interpreter
// Description: Status-code mapping and format-switched error payload decoding.
// Purpose: Translate non-2xx provider responses into canonical errors.
// Dependencies: conduit-core, serde_json
// ============================================================================

//! ## Overview
//! The HTTP status selects a base [`ErrorKind`]; providers may override the
//! choice per status. The body is decoded by the first [`FormatTemplate`]
//! whose required keys are all present, and the extracted message becomes the
//! error detail. Bodies that match no template contribute their raw text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use conduit_core::ConnectorError;
use conduit_core::ErrorKind;
use conduit_core::HttpResponse;
use serde_json::Value;

use crate::pagination::to_pointer;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum raw body characters copied into an error detail.
const MAX_RAW_DETAIL_CHARS: usize = 512;

// ============================================================================
// SECTION: Format Templates
// ============================================================================

/// Extracts a human-readable message from a matched error body.
pub type DetailExtractor = dyn Fn(&Value) -> Option<String> + Send + Sync;

/// One recognized error payload shape.
pub struct FormatTemplate {
    /// Template label used in logs and tests.
    name: String,
    /// Paths that must all be present for the template to apply.
    must_keys: Vec<String>,
    /// Message extractor.
    extract: Box<DetailExtractor>,
}

impl FormatTemplate {
    /// Creates a template.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, must_keys: I, extract: Box<DetailExtractor>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            must_keys: must_keys.into_iter().map(Into::into).collect(),
            extract,
        }
    }

    /// Creates a template whose message is the string at `path`.
    #[must_use]
    pub fn message_at(name: impl Into<String>, path: &str) -> Self {
        let pointer = to_pointer(path);
        let extract_pointer = pointer.clone();
        Self {
            name: name.into(),
            must_keys: vec![pointer],
            extract: Box::new(move |body: &Value| {
                body.pointer(&extract_pointer).map(scalar_text)
            }),
        }
    }

    /// Returns the template label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true when every required key is present.
    #[must_use]
    pub fn matches(&self, body: &Value) -> bool {
        self.must_keys.iter().all(|key| body.pointer(&to_pointer(key)).is_some())
    }

    /// Wraps `base` with the message this template extracts from `body`.
    #[must_use]
    pub fn combine_err(&self, base: ErrorKind, body: &Value) -> ConnectorError {
        let detail = (self.extract)(body).unwrap_or_else(|| body.to_string());
        base.with_detail(detail)
    }
}

/// Renders a JSON scalar without quotes; other values as JSON text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Ordered list of templates; the first match wins.
#[derive(Default)]
pub struct FormatSwitch {
    /// Templates in priority order.
    templates: Vec<FormatTemplate>,
}

impl FormatSwitch {
    /// Creates a switch from templates in priority order.
    #[must_use]
    pub const fn new(templates: Vec<FormatTemplate>) -> Self {
        Self {
            templates,
        }
    }

    /// Creates a switch with the common payload shapes.
    ///
    /// Order: OAuth `error_description`, nested `error.message`, an `errors`
    /// array, then a top-level `message`.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(vec![
            FormatTemplate::message_at("oauth", "error_description"),
            FormatTemplate::message_at("error_object", "error.message"),
            FormatTemplate::new("errors_array", ["errors"], Box::new(errors_array_detail)),
            FormatTemplate::message_at("message", "message"),
        ])
    }

    /// Appends a template with the lowest priority.
    pub fn push(&mut self, template: FormatTemplate) {
        self.templates.push(template);
    }

    /// Prepends a template with the highest priority.
    pub fn push_front(&mut self, template: FormatTemplate) {
        self.templates.insert(0, template);
    }

    /// Returns the first template matching `body`.
    #[must_use]
    pub fn select(&self, body: &Value) -> Option<&FormatTemplate> {
        self.templates.iter().find(|template| template.matches(body))
    }
}

/// Joins the messages of an `errors` array.
fn errors_array_detail(body: &Value) -> Option<String> {
    let items = body.get("errors")?.as_array()?;
    let messages: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text.clone()),
            Value::Object(map) => map
                .get("message")
                .or_else(|| map.get("detail"))
                .or_else(|| map.get("title"))
                .map(scalar_text),
            _ => None,
        })
        .collect();
    if messages.is_empty() { None } else { Some(messages.join("; ")) }
}

// ============================================================================
// SECTION: Status Mapping
// ============================================================================

/// Returns the default base kind for an HTTP status.
#[must_use]
pub const fn default_kind_for_status(status: u16) -> ErrorKind {
    match status {
        401 => ErrorKind::AccessToken,
        403 => ErrorKind::Forbidden,
        404 => ErrorKind::NotFound,
        429 | 502 | 504 => ErrorKind::LimitExceeded,
        503 => ErrorKind::ApiDisabled,
        500..=599 => ErrorKind::Retryable,
        400..=499 => ErrorKind::BadRequest,
        _ => ErrorKind::Transport,
    }
}

/// Provider overrides of the default status mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCodeMapping {
    /// Base kind per status.
    overrides: BTreeMap<u16, ErrorKind>,
}

impl StatusCodeMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            overrides: BTreeMap::new(),
        }
    }

    /// Overrides the base kind for a status.
    #[must_use]
    pub fn with(mut self, status: u16, kind: ErrorKind) -> Self {
        self.overrides.insert(status, kind);
        self
    }

    /// Returns the base kind for a status.
    #[must_use]
    pub fn kind_for(&self, status: u16) -> ErrorKind {
        self.overrides.get(&status).copied().unwrap_or_else(|| default_kind_for_status(status))
    }
}

// ============================================================================
// SECTION: Interpreter
// ============================================================================

/// Translates failed responses into canonical errors.
#[derive(Default)]
pub struct ErrorInterpreter {
    /// Payload templates.
    switch: FormatSwitch,
    /// Status overrides.
    mapping: StatusCodeMapping,
}

impl ErrorInterpreter {
    /// Creates an interpreter.
    #[must_use]
    pub const fn new(switch: FormatSwitch, mapping: StatusCodeMapping) -> Self {
        Self {
            switch,
            mapping,
        }
    }

    /// Creates an interpreter with the default templates and mapping.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FormatSwitch::with_defaults(), StatusCodeMapping::new())
    }

    /// Interprets a non-2xx response.
    #[must_use]
    pub fn interpret(&self, response: &HttpResponse) -> ConnectorError {
        let base = self.mapping.kind_for(response.status);
        let status = response.status;
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return base.with_detail(format!("HTTP {status}"));
        }
        if let Ok(body) = serde_json::from_slice::<Value>(&response.body)
            && let Some(template) = self.switch.select(&body)
        {
            let detail = template.combine_err(base, &body).detail();
            return base.with_detail(format!("HTTP {status}: {detail}"));
        }
        let raw = String::from_utf8_lossy(&response.body);
        let truncated: String = raw.chars().take(MAX_RAW_DETAIL_CHARS).collect();
        base.with_detail(format!("HTTP {status}: {}", truncated.trim()))
    }
}
