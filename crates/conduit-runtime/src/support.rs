// crates/conduit-runtime/src/support.rs
// ============================================================================
// Module: Endpoint Support Registry
// Description: Per-(module, object) operation support matrix.
// Purpose: Gate data-plane operations before any request is built.
// Dependencies: conduit-core, serde
// ============================================================================

//! ## Overview
//! The registry is built from a static table mapping a module id to endpoint
//! rows. Each row names a single object, the `*` wildcard, or a brace set such
//! as `{contacts,deals}`; brace sets may carry a prefix and suffix. Lookups
//! prefer an exact object match over the wildcard.
//! Invariants:
//! - The registry is read-only after construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use conduit_core::ConnectorError;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Support Flags
// ============================================================================

/// Bulk write capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkWriteSupport {
    /// Bulk insert.
    pub insert: bool,
    /// Bulk upsert.
    pub upsert: bool,
    /// Bulk update.
    pub update: bool,
    /// Bulk delete.
    pub delete: bool,
}

/// Operation support flags for one object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Support {
    /// Paginated reads.
    pub read: bool,
    /// Creates and updates.
    pub write: bool,
    /// Deletes.
    pub delete: bool,
    /// Bulk writes.
    pub bulk_write: BulkWriteSupport,
}

impl Support {
    /// Support for read only.
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            read: true,
            write: false,
            delete: false,
            bulk_write: BulkWriteSupport {
                insert: false,
                upsert: false,
                update: false,
                delete: false,
            },
        }
    }

    /// Support for read, write, and delete.
    #[must_use]
    pub const fn read_write_delete() -> Self {
        Self {
            read: true,
            write: true,
            delete: true,
            bulk_write: BulkWriteSupport {
                insert: false,
                upsert: false,
                update: false,
                delete: false,
            },
        }
    }

    /// Returns true when the operation is permitted.
    #[must_use]
    pub const fn allows(&self, operation: Operation) -> bool {
        match operation {
            Operation::Read => self.read,
            Operation::Write => self.write,
            Operation::Delete => self.delete,
            Operation::BulkInsert => self.bulk_write.insert,
            Operation::BulkUpsert => self.bulk_write.upsert,
            Operation::BulkUpdate => self.bulk_write.update,
            Operation::BulkDelete => self.bulk_write.delete,
        }
    }
}

/// Operation gated by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read.
    Read,
    /// Write.
    Write,
    /// Delete.
    Delete,
    /// Bulk insert.
    BulkInsert,
    /// Bulk upsert.
    BulkUpsert,
    /// Bulk update.
    BulkUpdate,
    /// Bulk delete.
    BulkDelete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::BulkInsert => "bulk insert",
            Self::BulkUpsert => "bulk upsert",
            Self::BulkUpdate => "bulk update",
            Self::BulkDelete => "bulk delete",
        };
        f.write_str(label)
    }
}

/// One row of the static support table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSupport {
    /// Object name, `*`, or brace set.
    pub endpoint: String,
    /// Flags applied to every matched object.
    #[serde(flatten)]
    pub support: Support,
}

impl EndpointSupport {
    /// Creates a table row.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, support: Support) -> Self {
        Self {
            endpoint: endpoint.into(),
            support,
        }
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Wildcard endpoint pattern.
const WILDCARD: &str = "*";

/// Resolved support for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ModuleSupport {
    /// Support for explicitly named objects.
    exact: BTreeMap<String, Support>,
    /// Support applied to every other object.
    wildcard: Option<Support>,
}

/// Per-(module, object) support matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointRegistry {
    /// Support keyed by module id.
    modules: BTreeMap<String, ModuleSupport>,
}

impl EndpointRegistry {
    /// Builds the registry from a module to endpoint-rows table.
    ///
    /// Later rows for the same object replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidParameter`] for malformed brace sets.
    pub fn new(table: &BTreeMap<String, Vec<EndpointSupport>>) -> Result<Self, ConnectorError> {
        let mut modules = BTreeMap::new();
        for (module, rows) in table {
            let mut resolved = ModuleSupport::default();
            for row in rows {
                let endpoint = row.endpoint.trim();
                if endpoint == WILDCARD {
                    resolved.wildcard = Some(row.support);
                    continue;
                }
                for object in expand_braces(endpoint)? {
                    resolved.exact.insert(object, row.support);
                }
            }
            modules.insert(module.clone(), resolved);
        }
        Ok(Self {
            modules,
        })
    }

    /// Returns the support flags of an object in a module.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::ObjectNotSupported`] when neither an exact row
    /// nor a wildcard row covers the object.
    pub fn get_support(&self, module: &str, object: &str) -> Result<Support, ConnectorError> {
        let Some(resolved) = self.modules.get(module) else {
            return Err(ConnectorError::ObjectNotSupported(format!(
                "module {module} has no endpoint support"
            )));
        };
        resolved.exact.get(object).copied().or(resolved.wildcard).ok_or_else(|| {
            ConnectorError::ObjectNotSupported(format!("object {object} is not in module {module}"))
        })
    }

    /// Ensures an operation is permitted for an object.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::ObjectNotSupported`] or
    /// [`ConnectorError::OperationNotSupportedForObject`].
    pub fn ensure(
        &self,
        module: &str,
        object: &str,
        operation: Operation,
    ) -> Result<Support, ConnectorError> {
        let support = self.get_support(module, object)?;
        if support.allows(operation) {
            Ok(support)
        } else {
            Err(ConnectorError::OperationNotSupportedForObject(format!(
                "{operation} is not supported for {object} in module {module}"
            )))
        }
    }

    /// Returns the explicitly named objects of a module.
    #[must_use]
    pub fn objects(&self, module: &str) -> Vec<String> {
        self.modules
            .get(module)
            .map(|resolved| resolved.exact.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Ensures an operation against an optional registry.
///
/// # Errors
///
/// Returns [`ConnectorError::SupportNotConfigured`] when no registry exists,
/// otherwise the errors of [`EndpointRegistry::ensure`].
pub fn ensure_supported(
    registry: Option<&EndpointRegistry>,
    module: &str,
    object: &str,
    operation: Operation,
) -> Result<Support, ConnectorError> {
    let registry = registry.ok_or_else(|| {
        ConnectorError::SupportNotConfigured(format!("no endpoint support for module {module}"))
    })?;
    registry.ensure(module, object, operation)
}

// ============================================================================
// SECTION: Brace Expansion
// ============================================================================

/// Expands brace sets such as `crm/{contacts,deals}` into object names.
///
/// # Errors
///
/// Returns [`ConnectorError::InvalidParameter`] for unbalanced or empty sets.
pub fn expand_braces(pattern: &str) -> Result<Vec<String>, ConnectorError> {
    let Some(open) = pattern.find('{') else {
        if pattern.contains('}') {
            return Err(ConnectorError::InvalidParameter(format!(
                "unbalanced brace in endpoint '{pattern}'"
            )));
        }
        if pattern.is_empty() {
            return Err(ConnectorError::InvalidParameter("endpoint must not be empty".to_string()));
        }
        return Ok(vec![pattern.to_string()]);
    };
    let close = pattern[open..]
        .find('}')
        .map(|offset| open + offset)
        .ok_or_else(|| {
            ConnectorError::InvalidParameter(format!("unbalanced brace in endpoint '{pattern}'"))
        })?;
    let prefix = &pattern[..open];
    if prefix.contains('}') {
        return Err(ConnectorError::InvalidParameter(format!(
            "unbalanced brace in endpoint '{pattern}'"
        )));
    }
    let body = &pattern[open + 1..close];
    let suffix = &pattern[close + 1..];
    if body.contains('{') {
        return Err(ConnectorError::InvalidParameter(format!(
            "nested braces are not supported in endpoint '{pattern}'"
        )));
    }
    let mut out = Vec::new();
    for alternative in body.split(',').map(str::trim) {
        if alternative.is_empty() {
            return Err(ConnectorError::InvalidParameter(format!(
                "empty alternative in endpoint '{pattern}'"
            )));
        }
        for tail in expand_braces_tail(suffix)? {
            out.push(format!("{prefix}{alternative}{tail}"));
        }
    }
    Ok(out)
}

/// Expands the remainder after a brace set; an empty remainder yields one empty tail.
fn expand_braces_tail(suffix: &str) -> Result<Vec<String>, ConnectorError> {
    if suffix.is_empty() { Ok(vec![String::new()]) } else { expand_braces(suffix) }
}
