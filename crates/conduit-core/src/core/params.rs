// crates/conduit-core/src/core/params.rs
// ============================================================================
// Module: Conduit Data-Plane Parameters
// Description: Request and result structures for read, write, and delete.
// Purpose: Define the transport shapes shared by every adapter.
// Dependencies: serde, serde_json, crate::core::{error, timestamps}
// ============================================================================

//! ## Overview
//! Parameter structs carry the caller's request; result structs carry the
//! provider's answer. Validation is explicit: adapters call `validate` before
//! any support check or I/O.
//! Invariants:
//! - [`ReadResult::done`] is true exactly when [`ReadResult::next_page`] is empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::error::ConnectorError;
use crate::core::timestamps::Timestamp;

// ============================================================================
// SECTION: Record
// ============================================================================

/// Single object instance: field name to JSON value.
pub type Record = Map<String, Value>;

// ============================================================================
// SECTION: Next Page Token
// ============================================================================

/// Opaque continuation token; callers echo it back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NextPage(String);

impl NextPage {
    /// Creates a token from its string form.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the empty token that marks the final page.
    #[must_use]
    pub const fn done() -> Self {
        Self(String::new())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when no further pages exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NextPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NextPage {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NextPage {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ============================================================================
// SECTION: Read
// ============================================================================

/// Parameters for a paginated read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadParams {
    /// Object to read.
    pub object_name: String,
    /// Fields to project into each row.
    pub fields: BTreeSet<String>,
    /// Continuation token from a previous page.
    pub next_page: NextPage,
    /// Requested page size; adapters apply their default when absent.
    pub page_size: Option<usize>,
    /// Inclusive lower bound on the updated-field timestamp.
    pub since: Option<Timestamp>,
    /// Inclusive upper bound on the updated-field timestamp.
    pub until: Option<Timestamp>,
    /// Requests deleted records where the provider supports it.
    pub deleted: bool,
}

impl ReadParams {
    /// Creates read parameters for an object.
    #[must_use]
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            ..Self::default()
        }
    }

    /// Sets the projected fields.
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the continuation token.
    #[must_use]
    pub fn with_next_page(mut self, next_page: impl Into<NextPage>) -> Self {
        self.next_page = next_page.into();
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the inclusive time window.
    #[must_use]
    pub const fn with_window(mut self, since: Option<Timestamp>, until: Option<Timestamp>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    /// Validates the parameters; `strict` additionally requires fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::MissingObjects`], [`ConnectorError::MissingFields`],
    /// or [`ConnectorError::InvalidParameter`].
    pub fn validate(&self, strict: bool) -> Result<(), ConnectorError> {
        if self.object_name.trim().is_empty() {
            return Err(ConnectorError::MissingObjects("read requires an object name".to_string()));
        }
        if strict && self.fields.is_empty() {
            return Err(ConnectorError::MissingFields(format!(
                "read of {} requires at least one field",
                self.object_name
            )));
        }
        if self.page_size == Some(0) {
            return Err(ConnectorError::InvalidParameter("page size must be positive".to_string()));
        }
        if let (Some(since), Some(until)) = (self.since, self.until)
            && since > until
        {
            return Err(ConnectorError::InvalidParameter(
                "since must not be later than until".to_string(),
            ));
        }
        Ok(())
    }
}

/// One row of a read page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadResultRow {
    /// Record identifier, or the storage key when no id-field is declared.
    pub id: String,
    /// Projected fields with lower-cased keys.
    pub fields: Record,
    /// Full provider record.
    pub raw: Record,
}

/// One page of read results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadResult {
    /// Number of rows in this page.
    pub rows: i64,
    /// Rows in provider order.
    pub data: Vec<ReadResultRow>,
    /// Continuation token; empty on the final page.
    pub next_page: NextPage,
    /// True exactly when no further pages exist.
    pub done: bool,
}

impl ReadResult {
    /// Builds a page, deriving `rows` and `done` from its inputs.
    #[must_use]
    pub fn new(data: Vec<ReadResultRow>, next_page: NextPage) -> Self {
        let rows = i64::try_from(data.len()).unwrap_or(i64::MAX);
        let done = next_page.is_empty();
        Self {
            rows,
            data,
            next_page,
            done,
        }
    }
}

// ============================================================================
// SECTION: Write
// ============================================================================

/// Parameters for a create or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteParams {
    /// Object to write.
    pub object_name: String,
    /// Record to update; empty for create.
    #[serde(default)]
    pub record_id: String,
    /// Payload to write.
    pub record_data: Option<Value>,
}

impl WriteParams {
    /// Creates parameters for a new record.
    #[must_use]
    pub fn create(object_name: impl Into<String>, record_data: Value) -> Self {
        Self {
            object_name: object_name.into(),
            record_id: String::new(),
            record_data: Some(record_data),
        }
    }

    /// Creates parameters for updating an existing record.
    #[must_use]
    pub fn update(
        object_name: impl Into<String>,
        record_id: impl Into<String>,
        record_data: Value,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            record_id: record_id.into(),
            record_data: Some(record_data),
        }
    }

    /// Returns true when the write creates a new record.
    #[must_use]
    pub fn is_create(&self) -> bool {
        self.record_id.is_empty()
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::MissingObjects`] or
    /// [`ConnectorError::MissingRecordData`].
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.object_name.trim().is_empty() {
            return Err(ConnectorError::MissingObjects("write requires an object name".to_string()));
        }
        match &self.record_data {
            None | Some(Value::Null) => Err(ConnectorError::MissingRecordData(format!(
                "write to {} requires record data",
                self.object_name
            ))),
            Some(_) => Ok(()),
        }
    }
}

/// Outcome of a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteResult {
    /// True when the provider accepted the write.
    pub success: bool,
    /// Identifier of the written record.
    pub record_id: String,
    /// Record as stored by the provider, when returned.
    pub data: Record,
    /// Provider-reported non-fatal errors.
    pub errors: Vec<String>,
}

// ============================================================================
// SECTION: Delete
// ============================================================================

/// Parameters for a delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteParams {
    /// Object to delete from.
    pub object_name: String,
    /// Record to delete.
    pub record_id: String,
}

impl DeleteParams {
    /// Creates delete parameters.
    #[must_use]
    pub fn new(object_name: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            record_id: record_id.into(),
        }
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::MissingObjects`] or
    /// [`ConnectorError::MissingRecordId`].
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.object_name.trim().is_empty() {
            return Err(ConnectorError::MissingObjects(
                "delete requires an object name".to_string(),
            ));
        }
        if self.record_id.is_empty() {
            return Err(ConnectorError::MissingRecordId(format!(
                "delete from {} requires a record id",
                self.object_name
            )));
        }
        Ok(())
    }
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    /// True when the record was removed.
    pub success: bool,
}
