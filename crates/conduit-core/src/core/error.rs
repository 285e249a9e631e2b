// crates/conduit-core/src/core/error.rs
// ============================================================================
// Module: Conduit Error Taxonomy
// Description: Canonical error categories and the caller-facing error type.
// Purpose: Let callers kind-match failures while keeping provider detail.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every failure surfaced by an adapter or by the deep-mock connector is a
//! [`ConnectorError`]. Each variant corresponds to exactly one canonical
//! [`ErrorKind`], and carries a free-form detail string holding the provider's
//! original message. Error interpreters build errors from a base kind with
//! [`ErrorKind::with_detail`].
//! Invariants:
//! - `ConnectorError::kind` is total and stable.
//! - Validation failures carry the complete list of violations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

// ============================================================================
// SECTION: Categories
// ============================================================================

/// Coarse error taxonomy used for propagation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// Caller supplied missing or malformed parameters.
    Input,
    /// Operation is not permitted for the object or module.
    Support,
    /// Schema lookup, parsing, or constraint errors.
    Schema,
    /// Record does not match its schema.
    Validation,
    /// HTTP transport or provider-reported failures.
    Transport,
    /// Record does not exist.
    NotFound,
    /// Random generation could not produce a conforming value.
    Generation,
    /// Cancellation, serialization, and invariant failures.
    Internal,
}

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Canonical base error kinds.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// No object names were supplied.
    MissingObjects,
    /// No fields were supplied where fields are mandatory.
    MissingFields,
    /// Write payload is missing.
    MissingRecordData,
    /// Record identifier is missing.
    MissingRecordId,
    /// A parameter is malformed.
    InvalidParameter,
    /// The operation is denied for the object.
    OperationNotSupportedForObject,
    /// No endpoint support registry was configured.
    SupportNotConfigured,
    /// The object is not part of the module.
    ObjectNotSupported,
    /// No schema is registered for the object.
    SchemaNotFound,
    /// Schema document is invalid.
    InvalidSchema,
    /// Schema could not be converted into metadata.
    SchemaConversion,
    /// A uniqueness constraint cannot be satisfied.
    UniqueConstraint,
    /// A unique value could not be produced.
    UniqueValue,
    /// Record failed schema validation.
    ValidationFailed,
    /// Provider rejected the request as malformed.
    BadRequest,
    /// Access token is invalid or expired.
    AccessToken,
    /// Caller lacks permission.
    Forbidden,
    /// Provider rate limit was hit.
    LimitExceeded,
    /// Provider API is disabled or unavailable.
    ApiDisabled,
    /// Transient failure that may succeed on retry.
    Retryable,
    /// Provider returned an empty body where one was required.
    EmptyResponse,
    /// Provider response could not be decoded.
    FailedUnmarshal,
    /// Provider reported that the resource does not exist.
    NotFound,
    /// Transport failed before a response was received.
    Transport,
    /// In-memory record does not exist.
    RecordNotFound,
    /// Random generation exhausted its retries.
    GenerationFailed,
    /// The call context was cancelled or its deadline passed.
    Cancelled,
    /// Value serialization failed.
    Serialization,
    /// Internal invariant failure.
    Internal,
}

impl ErrorKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingObjects => "missing objects",
            Self::MissingFields => "missing fields",
            Self::MissingRecordData => "missing record data",
            Self::MissingRecordId => "missing record id",
            Self::InvalidParameter => "invalid parameter",
            Self::OperationNotSupportedForObject => "operation not supported for object",
            Self::SupportNotConfigured => "support registry not configured",
            Self::ObjectNotSupported => "object not supported",
            Self::SchemaNotFound => "schema not found",
            Self::InvalidSchema => "invalid schema",
            Self::SchemaConversion => "schema conversion failed",
            Self::UniqueConstraint => "unique constraint cannot be satisfied",
            Self::UniqueValue => "unique value generation failed",
            Self::ValidationFailed => "validation failed",
            Self::BadRequest => "bad request",
            Self::AccessToken => "invalid access token",
            Self::Forbidden => "forbidden",
            Self::LimitExceeded => "limit exceeded",
            Self::ApiDisabled => "api disabled",
            Self::Retryable => "retryable error",
            Self::EmptyResponse => "empty response",
            Self::FailedUnmarshal => "failed to unmarshal response",
            Self::NotFound => "not found",
            Self::Transport => "transport error",
            Self::RecordNotFound => "record not found",
            Self::GenerationFailed => "record generation failed",
            Self::Cancelled => "operation cancelled",
            Self::Serialization => "serialization failed",
            Self::Internal => "internal error",
        }
    }

    /// Returns the coarse category for the kind.
    #[must_use]
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::MissingObjects
            | Self::MissingFields
            | Self::MissingRecordData
            | Self::MissingRecordId
            | Self::InvalidParameter => ErrorCategory::Input,
            Self::OperationNotSupportedForObject
            | Self::SupportNotConfigured
            | Self::ObjectNotSupported => ErrorCategory::Support,
            Self::SchemaNotFound
            | Self::InvalidSchema
            | Self::SchemaConversion
            | Self::UniqueConstraint
            | Self::UniqueValue => ErrorCategory::Schema,
            Self::ValidationFailed => ErrorCategory::Validation,
            Self::BadRequest
            | Self::AccessToken
            | Self::Forbidden
            | Self::LimitExceeded
            | Self::ApiDisabled
            | Self::Retryable
            | Self::EmptyResponse
            | Self::FailedUnmarshal
            | Self::NotFound
            | Self::Transport => ErrorCategory::Transport,
            Self::RecordNotFound => ErrorCategory::NotFound,
            Self::GenerationFailed => ErrorCategory::Generation,
            Self::Cancelled | Self::Serialization | Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Wraps this base kind with provider-specific detail.
    #[must_use]
    pub fn with_detail(self, detail: impl Into<String>) -> ConnectorError {
        let detail = detail.into();
        match self {
            Self::MissingObjects => ConnectorError::MissingObjects(detail),
            Self::MissingFields => ConnectorError::MissingFields(detail),
            Self::MissingRecordData => ConnectorError::MissingRecordData(detail),
            Self::MissingRecordId => ConnectorError::MissingRecordId(detail),
            Self::InvalidParameter => ConnectorError::InvalidParameter(detail),
            Self::OperationNotSupportedForObject => {
                ConnectorError::OperationNotSupportedForObject(detail)
            }
            Self::SupportNotConfigured => ConnectorError::SupportNotConfigured(detail),
            Self::ObjectNotSupported => ConnectorError::ObjectNotSupported(detail),
            Self::SchemaNotFound => ConnectorError::SchemaNotFound(detail),
            Self::InvalidSchema => ConnectorError::InvalidSchema(detail),
            Self::SchemaConversion => ConnectorError::SchemaConversion(detail),
            Self::UniqueConstraint => ConnectorError::UniqueConstraint(detail),
            Self::UniqueValue => ConnectorError::UniqueValue(detail),
            Self::ValidationFailed => ConnectorError::ValidationFailed {
                violations: vec![detail],
            },
            Self::BadRequest => ConnectorError::BadRequest(detail),
            Self::AccessToken => ConnectorError::AccessToken(detail),
            Self::Forbidden => ConnectorError::Forbidden(detail),
            Self::LimitExceeded => ConnectorError::LimitExceeded(detail),
            Self::ApiDisabled => ConnectorError::ApiDisabled(detail),
            Self::Retryable => ConnectorError::Retryable(detail),
            Self::EmptyResponse => ConnectorError::EmptyResponse(detail),
            Self::FailedUnmarshal => ConnectorError::FailedUnmarshal(detail),
            Self::NotFound => ConnectorError::NotFound(detail),
            Self::Transport => ConnectorError::Transport(detail),
            Self::RecordNotFound => ConnectorError::RecordNotFound(detail),
            Self::GenerationFailed => ConnectorError::GenerationFailed {
                attempts: 0,
                reason: detail,
            },
            Self::Cancelled => ConnectorError::Cancelled(detail),
            Self::Serialization => ConnectorError::Serialization(detail),
            Self::Internal => ConnectorError::Internal(detail),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Connector Error
// ============================================================================

/// Caller-facing error returned by every data-plane operation.
///
/// # Invariants
/// - Each variant maps to exactly one [`ErrorKind`].
/// - Detail strings carry provider text verbatim and never secrets added here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    /// No object names were supplied.
    #[error("missing objects: {0}")]
    MissingObjects(String),
    /// No fields were supplied.
    #[error("missing fields: {0}")]
    MissingFields(String),
    /// Write payload is missing.
    #[error("missing record data: {0}")]
    MissingRecordData(String),
    /// Record identifier is missing.
    #[error("missing record id: {0}")]
    MissingRecordId(String),
    /// A parameter is malformed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The operation is denied for the object.
    #[error("operation not supported for object: {0}")]
    OperationNotSupportedForObject(String),
    /// No endpoint support registry was configured.
    #[error("support registry not configured: {0}")]
    SupportNotConfigured(String),
    /// The object is not part of the module.
    #[error("object not supported: {0}")]
    ObjectNotSupported(String),
    /// No schema is registered for the object.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),
    /// Schema document is invalid.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Schema could not be converted into metadata.
    #[error("schema conversion failed: {0}")]
    SchemaConversion(String),
    /// A uniqueness constraint cannot be satisfied.
    #[error("unique constraint cannot be satisfied: {0}")]
    UniqueConstraint(String),
    /// A unique value could not be produced.
    #[error("unique value generation failed: {0}")]
    UniqueValue(String),
    /// Record failed schema validation.
    #[error("validation failed: {}", violations.join("; "))]
    ValidationFailed {
        /// Every schema violation reported by the validator.
        violations: Vec<String>,
    },
    /// Provider rejected the request as malformed.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Access token is invalid or expired.
    #[error("invalid access token: {0}")]
    AccessToken(String),
    /// Caller lacks permission.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Provider rate limit was hit.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
    /// Provider API is disabled or unavailable.
    #[error("api disabled: {0}")]
    ApiDisabled(String),
    /// Transient failure that may succeed on retry.
    #[error("retryable error: {0}")]
    Retryable(String),
    /// Provider returned an empty body.
    #[error("empty response: {0}")]
    EmptyResponse(String),
    /// Provider response could not be decoded.
    #[error("failed to unmarshal response: {0}")]
    FailedUnmarshal(String),
    /// Provider reported that the resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),
    /// In-memory record does not exist.
    #[error("record not found: {0}")]
    RecordNotFound(String),
    /// Random generation exhausted its retries.
    #[error("record generation failed after {attempts} attempts: {reason}")]
    GenerationFailed {
        /// Number of attempts made.
        attempts: u32,
        /// Final validation error.
        reason: String,
    },
    /// The call context was cancelled or its deadline passed.
    #[error("operation cancelled: {0}")]
    Cancelled(String),
    /// Value serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Internal invariant failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConnectorError {
    /// Returns the canonical base kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingObjects(_) => ErrorKind::MissingObjects,
            Self::MissingFields(_) => ErrorKind::MissingFields,
            Self::MissingRecordData(_) => ErrorKind::MissingRecordData,
            Self::MissingRecordId(_) => ErrorKind::MissingRecordId,
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::OperationNotSupportedForObject(_) => ErrorKind::OperationNotSupportedForObject,
            Self::SupportNotConfigured(_) => ErrorKind::SupportNotConfigured,
            Self::ObjectNotSupported(_) => ErrorKind::ObjectNotSupported,
            Self::SchemaNotFound(_) => ErrorKind::SchemaNotFound,
            Self::InvalidSchema(_) => ErrorKind::InvalidSchema,
            Self::SchemaConversion(_) => ErrorKind::SchemaConversion,
            Self::UniqueConstraint(_) => ErrorKind::UniqueConstraint,
            Self::UniqueValue(_) => ErrorKind::UniqueValue,
            Self::ValidationFailed {
                ..
            } => ErrorKind::ValidationFailed,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::AccessToken(_) => ErrorKind::AccessToken,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::LimitExceeded(_) => ErrorKind::LimitExceeded,
            Self::ApiDisabled(_) => ErrorKind::ApiDisabled,
            Self::Retryable(_) => ErrorKind::Retryable,
            Self::EmptyResponse(_) => ErrorKind::EmptyResponse,
            Self::FailedUnmarshal(_) => ErrorKind::FailedUnmarshal,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Transport(_) => ErrorKind::Transport,
            Self::RecordNotFound(_) => ErrorKind::RecordNotFound,
            Self::GenerationFailed {
                ..
            } => ErrorKind::GenerationFailed,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true when the error is of the given base kind.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Returns the coarse category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.kind().category()
    }

    /// Returns true when the caller may retry the operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_) | Self::LimitExceeded(_))
    }

    /// Returns the detail text without the kind prefix.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::ValidationFailed {
                violations,
            } => violations.join("; "),
            Self::GenerationFailed {
                reason, ..
            } => reason.clone(),
            Self::MissingObjects(detail)
            | Self::MissingFields(detail)
            | Self::MissingRecordData(detail)
            | Self::MissingRecordId(detail)
            | Self::InvalidParameter(detail)
            | Self::OperationNotSupportedForObject(detail)
            | Self::SupportNotConfigured(detail)
            | Self::ObjectNotSupported(detail)
            | Self::SchemaNotFound(detail)
            | Self::InvalidSchema(detail)
            | Self::SchemaConversion(detail)
            | Self::UniqueConstraint(detail)
            | Self::UniqueValue(detail)
            | Self::BadRequest(detail)
            | Self::AccessToken(detail)
            | Self::Forbidden(detail)
            | Self::LimitExceeded(detail)
            | Self::ApiDisabled(detail)
            | Self::Retryable(detail)
            | Self::EmptyResponse(detail)
            | Self::FailedUnmarshal(detail)
            | Self::NotFound(detail)
            | Self::Transport(detail)
            | Self::RecordNotFound(detail)
            | Self::Cancelled(detail)
            | Self::Serialization(detail)
            | Self::Internal(detail) => detail.clone(),
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
