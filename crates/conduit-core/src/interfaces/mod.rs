// crates/conduit-core/src/interfaces/mod.rs
// ============================================================================
// Module: Conduit Interfaces
// Description: Capability traits, connector surface, and HTTP client contract.
// Purpose: Define the contract surfaces implemented by adapters and the mock.
// Dependencies: serde, serde_json, crate::core
// ============================================================================

//! ## Overview
//! A connector is polymorphic over the capability set {read, write, delete,
//! list object metadata}. Each capability is a small trait; [`Connector`]
//! exposes capability queries so callers can discover at runtime which
//! operations an adapter supports.
//!
//! The authenticated HTTP client is an external collaborator. Adapters accept
//! it through [`HttpClient`] and never construct credentials themselves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::context::Context;
use crate::core::error::ConnectorError;
use crate::core::metadata::ListObjectMetadataResult;
use crate::core::params::DeleteParams;
use crate::core::params::DeleteResult;
use crate::core::params::ReadParams;
use crate::core::params::ReadResult;
use crate::core::params::ReadResultRow;
use crate::core::params::WriteParams;
use crate::core::params::WriteResult;

// ============================================================================
// SECTION: Capability Traits
// ============================================================================

/// Paginated record reads.
pub trait Reader: Send + Sync {
    /// Reads one page of records.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] on invalid parameters, unsupported objects,
    /// or transport failures.
    fn read(&self, ctx: &Context, params: &ReadParams) -> Result<ReadResult, ConnectorError>;
}

/// Record creation and update.
pub trait Writer: Send + Sync {
    /// Creates or updates a record.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] on invalid parameters, validation failures,
    /// or transport failures.
    fn write(&self, ctx: &Context, params: &WriteParams) -> Result<WriteResult, ConnectorError>;
}

/// Record deletion.
pub trait Deleter: Send + Sync {
    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when the record is missing or the transport fails.
    fn delete(&self, ctx: &Context, params: &DeleteParams) -> Result<DeleteResult, ConnectorError>;
}

/// Source of object field metadata.
pub trait SchemaProvider: Send + Sync {
    /// Lists metadata for every requested object.
    ///
    /// Per-object failures are returned inside the result, not as `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::MissingObjects`] when `object_names` is empty,
    /// or another error when the whole call fails.
    fn list_object_metadata(
        &self,
        ctx: &Context,
        object_names: &[String],
    ) -> Result<ListObjectMetadataResult, ConnectorError>;
}

/// Batch lookup of records by identifier.
pub trait BatchRecordReader: Send + Sync {
    /// Returns rows for every identifier found; absent identifiers are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when the object is unknown or the lookup fails.
    fn get_records_by_ids(
        &self,
        ctx: &Context,
        object_name: &str,
        ids: &[String],
        fields: &BTreeSet<String>,
    ) -> Result<Vec<ReadResultRow>, ConnectorError>;
}

/// Change-notification subscriptions.
pub trait Subscriber: Send + Sync {
    /// Registers a subscription.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when the subscription cannot be created.
    fn subscribe(
        &self,
        ctx: &Context,
        params: &SubscribeParams,
    ) -> Result<SubscriptionResult, ConnectorError>;

    /// Removes a subscription.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when the subscription cannot be removed.
    fn unsubscribe(
        &self,
        ctx: &Context,
        subscription: &SubscriptionResult,
    ) -> Result<SubscriptionResult, ConnectorError>;

    /// Verifies the authenticity of an inbound webhook message.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when verification cannot be performed.
    fn verify_webhook_message(
        &self,
        ctx: &Context,
        message: &WebhookMessage,
    ) -> Result<bool, ConnectorError>;
}

// ============================================================================
// SECTION: Capabilities
// ============================================================================

/// Operation a connector may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Paginated reads.
    Read,
    /// Creates and updates.
    Write,
    /// Deletes.
    Delete,
    /// Metadata listing.
    ListObjectMetadata,
    /// Batch reads by identifier.
    BatchRead,
    /// Change subscriptions.
    Subscribe,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::ListObjectMetadata => "list_object_metadata",
            Self::BatchRead => "batch_read",
            Self::Subscribe => "subscribe",
        };
        f.write_str(label)
    }
}

/// Ordered set of capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Adds a capability.
    pub fn insert(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    /// Returns true when the capability is present.
    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// Iterates capabilities in order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no capability is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// SECTION: Connector
// ============================================================================

/// Provider adapter exposing a subset of the data-plane capabilities.
pub trait Connector: Send + Sync {
    /// Returns the provider name.
    fn provider(&self) -> &str;

    /// Returns the capabilities this connector implements.
    fn capabilities(&self) -> CapabilitySet {
        let mut set = CapabilitySet::new();
        if self.as_reader().is_some() {
            set.insert(Capability::Read);
        }
        if self.as_writer().is_some() {
            set.insert(Capability::Write);
        }
        if self.as_deleter().is_some() {
            set.insert(Capability::Delete);
        }
        if self.as_schema_provider().is_some() {
            set.insert(Capability::ListObjectMetadata);
        }
        if self.as_batch_reader().is_some() {
            set.insert(Capability::BatchRead);
        }
        if self.as_subscriber().is_some() {
            set.insert(Capability::Subscribe);
        }
        set
    }

    /// Returns the read capability, if implemented.
    fn as_reader(&self) -> Option<&dyn Reader> {
        None
    }

    /// Returns the write capability, if implemented.
    fn as_writer(&self) -> Option<&dyn Writer> {
        None
    }

    /// Returns the delete capability, if implemented.
    fn as_deleter(&self) -> Option<&dyn Deleter> {
        None
    }

    /// Returns the metadata capability, if implemented.
    fn as_schema_provider(&self) -> Option<&dyn SchemaProvider> {
        None
    }

    /// Returns the batch-read capability, if implemented.
    fn as_batch_reader(&self) -> Option<&dyn BatchRecordReader> {
        None
    }

    /// Returns the subscription capability, if implemented.
    fn as_subscriber(&self) -> Option<&dyn Subscriber> {
        None
    }
}

// ============================================================================
// SECTION: Subscriptions
// ============================================================================

/// Parameters for a change subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeParams {
    /// Objects to watch.
    pub object_names: Vec<String>,
    /// Event names to deliver; empty means every event.
    #[serde(default)]
    pub events: Vec<String>,
}

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is delivering events.
    Active,
    /// Subscription has been removed.
    Inactive,
}

/// Handle describing a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionResult {
    /// Subscription identifier.
    pub id: String,
    /// Lifecycle state.
    pub status: SubscriptionStatus,
    /// Watched objects.
    pub object_names: Vec<String>,
    /// Delivered events.
    pub events: Vec<String>,
}

/// Inbound webhook delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookMessage {
    /// Request headers as received.
    pub headers: Vec<(String, String)>,
    /// Raw request body.
    pub body: Vec<u8>,
}

// ============================================================================
// SECTION: HTTP Contract
// ============================================================================

/// HTTP method used by operation pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
}

impl HttpMethod {
    /// Returns the wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound HTTP request built by an operation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Request headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body and content type.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Serialization`] when the body cannot be encoded.
    pub fn with_json(mut self, body: &Value) -> Result<Self, ConnectorError> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers.push(("Content-Type".to_string(), "application/json".to_string()));
        Ok(self)
    }

    /// Returns the first header with the given name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Inbound HTTP response handed back to an operation pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers in wire order.
    pub headers: Vec<(String, String)>,
    /// Response body, already size-limited by the client.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the first header with the given name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Case-insensitive header lookup.
fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Authenticated HTTP transport supplied by the host.
pub trait HttpClient: Send + Sync {
    /// Executes a request and returns the buffered response.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Transport`] when no response was received and
    /// [`ConnectorError::Cancelled`] when the context expired.
    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, ConnectorError>;
}
