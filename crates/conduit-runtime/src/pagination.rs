// crates/conduit-runtime/src/pagination.rs
// ============================================================================
// Module: Pagination
// Description: Next-page, record, and marshal extractors for read responses.
// Purpose: Turn provider page payloads into uniform read results.
// Dependencies: conduit-core, serde_json
// ============================================================================

//! ## Overview
//! Every read supplies three functions: a next-page extractor, a records
//! extractor, and a marshaler. Tokens are opaque: a cursor string, a full URL,
//! or an integer offset rendered as decimal text. [`parse_result`] combines the
//! three and marks the page done exactly when the extracted token is empty.
//!
//! Paths are dotted (`paging.next.after`) or JSON pointers (`/paging/next/after`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use conduit_core::ConnectorError;
use conduit_core::NextPage;
use conduit_core::ReadResult;
use conduit_core::ReadResultRow;
use conduit_core::Record;
use conduit_core::coerce_id;
use conduit_core::select_fields;
use serde_json::Value;

// ============================================================================
// SECTION: Extractor Types
// ============================================================================

/// Extracts the continuation token from a page body.
pub type NextPageFn = dyn Fn(&Value) -> Result<NextPage, ConnectorError> + Send + Sync;
/// Extracts the raw records from a page body.
pub type RecordsFn = dyn Fn(&Value) -> Result<Vec<Record>, ConnectorError> + Send + Sync;
/// Converts raw records into read rows.
pub type MarshalFn =
    dyn Fn(&[Record], &BTreeSet<String>) -> Result<Vec<ReadResultRow>, ConnectorError>
        + Send
        + Sync;

/// The extractor triple a read operation is configured with.
pub struct PageExtractors {
    /// Continuation token extractor.
    pub next_page: Box<NextPageFn>,
    /// Records extractor.
    pub records: Box<RecordsFn>,
    /// Row marshaler.
    pub marshal: Box<MarshalFn>,
}

impl PageExtractors {
    /// Creates an extractor triple.
    #[must_use]
    pub fn new(
        next_page: Box<NextPageFn>,
        records: Box<RecordsFn>,
        marshal: Box<MarshalFn>,
    ) -> Self {
        Self {
            next_page,
            records,
            marshal,
        }
    }

    /// Parses a page body with this triple.
    ///
    /// # Errors
    ///
    /// Returns the first extractor failure.
    pub fn parse(
        &self,
        body: &Value,
        fields: &BTreeSet<String>,
    ) -> Result<ReadResult, ConnectorError> {
        parse_result(body, &*self.records, &*self.next_page, &*self.marshal, fields)
    }
}

// ============================================================================
// SECTION: Parse Result
// ============================================================================

/// Builds a read result from a page body.
///
/// # Errors
///
/// Returns the first extractor failure.
pub fn parse_result(
    body: &Value,
    records: &RecordsFn,
    next_page: &NextPageFn,
    marshal: &MarshalFn,
    fields: &BTreeSet<String>,
) -> Result<ReadResult, ConnectorError> {
    let raw = records(body)?;
    let token = next_page(body)?;
    let rows = marshal(&raw, fields)?;
    Ok(ReadResult::new(rows, token))
}

// ============================================================================
// SECTION: Path Helpers
// ============================================================================

/// Converts a dotted path or JSON pointer into a JSON pointer.
#[must_use]
pub fn to_pointer(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path.replace('.', "/"))
    }
}

/// Renders a scalar token value; absent, null, and empty values end paging.
fn token_from_value(value: Option<&Value>) -> Result<NextPage, ConnectorError> {
    match value {
        None | Some(Value::Null) => Ok(NextPage::done()),
        Some(Value::String(text)) => Ok(NextPage::new(text.clone())),
        Some(Value::Number(number)) => Ok(NextPage::new(number.to_string())),
        Some(other) => Err(ConnectorError::FailedUnmarshal(format!(
            "next page token must be a string or number, got {other}"
        ))),
    }
}

// ============================================================================
// SECTION: Extractor Builders
// ============================================================================

/// Extracts records from an array at `path`; the empty path means the body itself.
///
/// A missing key yields an empty page.
#[must_use]
pub fn records_at(path: &str) -> Box<RecordsFn> {
    let pointer = to_pointer(path);
    Box::new(move |body: &Value| {
        let Some(target) = body.pointer(&pointer) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = target else {
            return Err(ConnectorError::FailedUnmarshal(format!(
                "expected an array of records at '{pointer}'"
            )));
        };
        items
            .iter()
            .map(|item| {
                item.as_object().cloned().ok_or_else(|| {
                    ConnectorError::FailedUnmarshal(format!(
                        "record at '{pointer}' is not an object"
                    ))
                })
            })
            .collect()
    })
}

/// Extracts a cursor token at `path`.
#[must_use]
pub fn next_cursor_at(path: &str) -> Box<NextPageFn> {
    let pointer = to_pointer(path);
    Box::new(move |body: &Value| token_from_value(body.pointer(&pointer)))
}

/// Extracts a full next-page URL at `path`.
#[must_use]
pub fn next_link_at(path: &str) -> Box<NextPageFn> {
    next_cursor_at(path)
}

/// Returns a next-page extractor that always ends paging.
#[must_use]
pub fn single_page() -> Box<NextPageFn> {
    Box::new(|_: &Value| Ok(NextPage::done()))
}

/// Computes the next offset token from the previous token.
///
/// A short page ends paging. An unparseable previous token counts as offset zero.
#[must_use]
pub fn next_offset(previous: &NextPage, page_size: usize, returned: usize) -> NextPage {
    if page_size == 0 || returned < page_size {
        return NextPage::done();
    }
    let offset = previous.as_str().parse::<usize>().unwrap_or(0);
    NextPage::new(offset.saturating_add(returned).to_string())
}

/// Returns the `rel="next"` target of an RFC 8288 `Link` header.
#[must_use]
pub fn next_link_from_header(link_header: &str) -> Option<String> {
    link_header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = parts.any(|param| {
            let param = param.trim();
            param.strip_prefix("rel=").is_some_and(|rel| {
                rel.trim_matches('"')
                    .split_whitespace()
                    .any(|value| value.eq_ignore_ascii_case("next"))
            })
        });
        is_next.then(|| url.to_string())
    })
}

/// Marshals records into rows keyed by `id_field`.
///
/// Rows whose id is absent carry an empty id.
#[must_use]
pub fn default_marshal(id_field: Option<&str>) -> Box<MarshalFn> {
    let id_field = id_field.map(str::to_string);
    Box::new(move |records: &[Record], fields: &BTreeSet<String>| {
        Ok(records
            .iter()
            .map(|record| ReadResultRow {
                id: id_field
                    .as_deref()
                    .and_then(|field| record.get(field))
                    .and_then(coerce_id)
                    .unwrap_or_default(),
                fields: select_fields(record, fields),
                raw: record.clone(),
            })
            .collect())
    })
}
