// crates/conduit-runtime/src/operations.rs
// ============================================================================
// Module: Operation Pipelines
// Description: Build, execute, parse, and error-handle HTTP operations.
// Purpose: Give every adapter capability the same request/response template.
// Dependencies: conduit-core, reqwest, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`HttpOperation`] is generic over a request type `R` and a response type
//! `S`. Its handlers build the request and parse the decoded JSON; the
//! pipeline executes the request, routes non-2xx responses to the error
//! interpreter, and decodes the body in between.
//!
//! [`HttpReader`], [`HttpWriter`], and [`HttpDeleter`] wrap the corresponding
//! pipeline with the pre-checks every adapter needs: parameter validation,
//! then an endpoint support check, then dispatch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::DeleteParams;
use conduit_core::DeleteResult;
use conduit_core::Deleter;
use conduit_core::HttpClient;
use conduit_core::HttpMethod;
use conduit_core::HttpRequest;
use conduit_core::HttpResponse;
use conduit_core::ListObjectMetadataResult;
use conduit_core::ObjectMetadata;
use conduit_core::ReadParams;
use conduit_core::ReadResult;
use conduit_core::Reader;
use conduit_core::WriteParams;
use conduit_core::WriteResult;
use conduit_core::Writer;
use conduit_core::coerce_id;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::http::JsonResponse;
use crate::http::parse_json_response;
use crate::interpreter::ErrorInterpreter;
use crate::pagination::PageExtractors;
use crate::pagination::to_pointer;
use crate::substitution::SubstitutionRegistry;
use crate::substitution::Template;
use crate::support::EndpointRegistry;
use crate::support::Operation;
use crate::support::ensure_supported;

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Request builder and response parser for one operation.
pub trait OperationHandlers<R, S>: Send + Sync {
    /// Builds the outbound request.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when the request cannot be built.
    fn build_request(&self, ctx: &Context, params: &R) -> Result<HttpRequest, ConnectorError>;

    /// Parses a successful, decoded response.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when the response cannot be interpreted.
    fn parse_response(
        &self,
        ctx: &Context,
        params: &R,
        response: JsonResponse,
    ) -> Result<S, ConnectorError>;

    /// Overrides error interpretation for a non-2xx response.
    ///
    /// Returning `None` defers to the pipeline's interpreter.
    fn handle_error(&self, _params: &R, _response: &HttpResponse) -> Option<ConnectorError> {
        None
    }
}

/// Boxed request builder closure.
pub type BuildFn<R> = dyn Fn(&Context, &R) -> Result<HttpRequest, ConnectorError> + Send + Sync;
/// Boxed response parser closure.
pub type ParseFn<R, S> =
    dyn Fn(&Context, &R, JsonResponse) -> Result<S, ConnectorError> + Send + Sync;

/// Closure-backed handlers, for binding adapter methods.
pub struct FnHandlers<R, S> {
    /// Request builder.
    build: Box<BuildFn<R>>,
    /// Response parser.
    parse: Box<ParseFn<R, S>>,
}

impl<R, S> FnHandlers<R, S> {
    /// Creates handlers from closures.
    #[must_use]
    pub fn new(build: Box<BuildFn<R>>, parse: Box<ParseFn<R, S>>) -> Self {
        Self {
            build,
            parse,
        }
    }
}

impl<R, S> OperationHandlers<R, S> for FnHandlers<R, S> {
    fn build_request(&self, ctx: &Context, params: &R) -> Result<HttpRequest, ConnectorError> {
        (self.build)(ctx, params)
    }

    fn parse_response(
        &self,
        ctx: &Context,
        params: &R,
        response: JsonResponse,
    ) -> Result<S, ConnectorError> {
        (self.parse)(ctx, params, response)
    }
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Generic Build, Execute, Parse, ErrorHandle pipeline.
pub struct HttpOperation<R, S> {
    /// Authenticated transport.
    client: Arc<dyn HttpClient>,
    /// Operation-specific handlers.
    handlers: Box<dyn OperationHandlers<R, S>>,
    /// Interpreter for non-2xx responses.
    interpreter: Arc<ErrorInterpreter>,
}

impl<R, S> HttpOperation<R, S> {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(
        client: Arc<dyn HttpClient>,
        handlers: Box<dyn OperationHandlers<R, S>>,
        interpreter: Arc<ErrorInterpreter>,
    ) -> Self {
        Self {
            client,
            handlers,
            interpreter,
        }
    }

    /// Runs the pipeline for one request.
    ///
    /// # Errors
    ///
    /// Returns build, transport, interpreted provider, or parse errors.
    pub fn execute(&self, ctx: &Context, params: &R) -> Result<S, ConnectorError> {
        ctx.check()?;
        let request = self.handlers.build_request(ctx, params)?;
        let method = request.method;
        let response = self.client.execute(ctx, request)?;
        if !response.is_success() {
            let err = self
                .handlers
                .handle_error(params, &response)
                .unwrap_or_else(|| self.interpreter.interpret(&response));
            debug!(%method, status = response.status, error = %err, "provider returned an error");
            return Err(err);
        }
        let decoded = parse_json_response(response)?;
        self.handlers.parse_response(ctx, params, decoded)
    }
}

/// Read pipeline.
pub type ReadOperation = HttpOperation<ReadParams, ReadResult>;
/// Write pipeline.
pub type WriteOperation = HttpOperation<WriteParams, WriteResult>;
/// Delete pipeline.
pub type DeleteOperation = HttpOperation<DeleteParams, DeleteResult>;
/// Metadata pipeline for many objects in one request.
pub type ListObjectMetadataOperation = HttpOperation<Vec<String>, ListObjectMetadataResult>;
/// Metadata pipeline for one object per request.
pub type SingleObjectMetadataOperation = HttpOperation<String, ObjectMetadata>;

// ============================================================================
// SECTION: Capability Wrappers
// ============================================================================

/// Module and registry shared by the capability wrappers.
#[derive(Debug, Clone, Default)]
pub struct SupportGate {
    /// Module id used for support lookups.
    pub module: String,
    /// Endpoint registry; `None` fails every check.
    pub registry: Option<Arc<EndpointRegistry>>,
}

impl SupportGate {
    /// Creates a gate.
    #[must_use]
    pub fn new(module: impl Into<String>, registry: Option<Arc<EndpointRegistry>>) -> Self {
        Self {
            module: module.into(),
            registry,
        }
    }

    /// Ensures an operation is supported for an object.
    ///
    /// # Errors
    ///
    /// Returns the support errors of [`ensure_supported`].
    pub fn ensure(&self, object: &str, operation: Operation) -> Result<(), ConnectorError> {
        ensure_supported(self.registry.as_deref(), &self.module, object, operation).map(|_| ())
    }
}

/// Read capability backed by a pipeline.
pub struct HttpReader {
    /// Support gate.
    gate: SupportGate,
    /// Read pipeline.
    operation: ReadOperation,
    /// When true, reads must name at least one field.
    strict: bool,
}

impl HttpReader {
    /// Creates a reader.
    #[must_use]
    pub const fn new(gate: SupportGate, operation: ReadOperation, strict: bool) -> Self {
        Self {
            gate,
            operation,
            strict,
        }
    }
}

impl Reader for HttpReader {
    fn read(&self, ctx: &Context, params: &ReadParams) -> Result<ReadResult, ConnectorError> {
        params.validate(self.strict)?;
        self.gate.ensure(&params.object_name, Operation::Read)?;
        self.operation.execute(ctx, params)
    }
}

/// Write capability backed by a pipeline.
pub struct HttpWriter {
    /// Support gate.
    gate: SupportGate,
    /// Write pipeline.
    operation: WriteOperation,
}

impl HttpWriter {
    /// Creates a writer.
    #[must_use]
    pub const fn new(gate: SupportGate, operation: WriteOperation) -> Self {
        Self {
            gate,
            operation,
        }
    }
}

impl Writer for HttpWriter {
    fn write(&self, ctx: &Context, params: &WriteParams) -> Result<WriteResult, ConnectorError> {
        params.validate()?;
        self.gate.ensure(&params.object_name, Operation::Write)?;
        self.operation.execute(ctx, params)
    }
}

/// Delete capability backed by a pipeline.
pub struct HttpDeleter {
    /// Support gate.
    gate: SupportGate,
    /// Delete pipeline.
    operation: DeleteOperation,
}

impl HttpDeleter {
    /// Creates a deleter.
    #[must_use]
    pub const fn new(gate: SupportGate, operation: DeleteOperation) -> Self {
        Self {
            gate,
            operation,
        }
    }
}

impl Deleter for HttpDeleter {
    fn delete(&self, ctx: &Context, params: &DeleteParams) -> Result<DeleteResult, ConnectorError> {
        params.validate()?;
        self.gate.ensure(&params.object_name, Operation::Delete)?;
        self.operation.execute(ctx, params)
    }
}

// ============================================================================
// SECTION: REST Handlers
// ============================================================================

/// Resolves object and record URLs under a rendered base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    /// Rendered base URL without a trailing slash.
    base: String,
}

impl UrlBuilder {
    /// Renders the base template against the catalog registry.
    #[must_use]
    pub fn new(base: &Template, registry: &SubstitutionRegistry) -> Self {
        Self {
            base: base.render(registry).trim_end_matches('/').to_string(),
        }
    }

    /// Returns the rendered base URL.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the collection URL of an object.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidParameter`] when the URL is malformed.
    pub fn object_url(&self, object: &str) -> Result<Url, ConnectorError> {
        let mut url = parse_url(&self.base)?;
        url.path_segments_mut()
            .map_err(|()| invalid_base(&self.base))?
            .pop_if_empty()
            .extend(object.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// Returns the URL of one record.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidParameter`] when the URL is malformed.
    pub fn record_url(&self, object: &str, record_id: &str) -> Result<Url, ConnectorError> {
        let mut url = self.object_url(object)?;
        url.path_segments_mut().map_err(|()| invalid_base(&self.base))?.push(record_id);
        Ok(url)
    }
}

/// Parses an absolute URL.
fn parse_url(text: &str) -> Result<Url, ConnectorError> {
    Url::parse(text)
        .map_err(|err| ConnectorError::InvalidParameter(format!("invalid url '{text}': {err}")))
}

/// Error for base URLs that cannot carry path segments.
fn invalid_base(base: &str) -> ConnectorError {
    ConnectorError::InvalidParameter(format!("base url '{base}' cannot carry a path"))
}

/// Read handlers for cursor, link, or offset paginated collections.
pub struct RestReadHandlers {
    /// URL resolver.
    urls: UrlBuilder,
    /// Extractor triple.
    extractors: PageExtractors,
    /// Query parameter carrying the continuation token.
    cursor_param: String,
    /// Query parameter carrying the page size.
    page_size_param: Option<String>,
    /// Page size used when the caller sets none.
    default_page_size: usize,
}

impl RestReadHandlers {
    /// Creates read handlers.
    #[must_use]
    pub fn new(
        urls: UrlBuilder,
        extractors: PageExtractors,
        cursor_param: impl Into<String>,
    ) -> Self {
        Self {
            urls,
            extractors,
            cursor_param: cursor_param.into(),
            page_size_param: None,
            default_page_size: 100,
        }
    }

    /// Sends the page size under `param`.
    #[must_use]
    pub fn with_page_size_param(mut self, param: impl Into<String>, default: usize) -> Self {
        self.page_size_param = Some(param.into());
        self.default_page_size = default;
        self
    }
}

impl OperationHandlers<ReadParams, ReadResult> for RestReadHandlers {
    fn build_request(
        &self,
        _ctx: &Context,
        params: &ReadParams,
    ) -> Result<HttpRequest, ConnectorError> {
        let token = params.next_page.as_str();
        if token.starts_with("http://") || token.starts_with("https://") {
            return Ok(HttpRequest::new(HttpMethod::Get, token));
        }
        let mut url = self.urls.object_url(&params.object_name)?;
        {
            let mut query = url.query_pairs_mut();
            if !token.is_empty() {
                query.append_pair(&self.cursor_param, token);
            }
            if let Some(param) = &self.page_size_param {
                let size = params.page_size.unwrap_or(self.default_page_size);
                query.append_pair(param, &size.to_string());
            }
        }
        let rendered = url.to_string();
        let rendered = rendered.strip_suffix('?').unwrap_or(&rendered).to_string();
        Ok(HttpRequest::new(HttpMethod::Get, rendered).with_header("Accept", "application/json"))
    }

    fn parse_response(
        &self,
        _ctx: &Context,
        params: &ReadParams,
        response: JsonResponse,
    ) -> Result<ReadResult, ConnectorError> {
        self.extractors.parse(&response.body, &params.fields)
    }
}

/// Where a provider reports the id of a written record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIdLocation {
    /// Dotted path or JSON pointer into the response body.
    Body(String),
    /// Response header, such as `X-Restli-Id`.
    Header(String),
}

impl RecordIdLocation {
    /// Extracts the record id from a response.
    #[must_use]
    pub fn extract(&self, response: &JsonResponse) -> Option<String> {
        match self {
            Self::Body(path) => response.body.pointer(&to_pointer(path)).and_then(coerce_id),
            Self::Header(name) => {
                response.header(name).map(str::trim).filter(|id| !id.is_empty()).map(str::to_string)
            }
        }
    }
}

/// Write handlers: POST on create, PATCH or PUT on update.
pub struct RestWriteHandlers {
    /// URL resolver.
    urls: UrlBuilder,
    /// Method used for updates.
    update_method: HttpMethod,
    /// Where the written id is reported.
    id_location: RecordIdLocation,
}

impl RestWriteHandlers {
    /// Creates write handlers that PATCH on update.
    #[must_use]
    pub const fn new(urls: UrlBuilder, id_location: RecordIdLocation) -> Self {
        Self {
            urls,
            update_method: HttpMethod::Patch,
            id_location,
        }
    }

    /// Uses PUT instead of PATCH for updates.
    #[must_use]
    pub const fn with_put_updates(mut self) -> Self {
        self.update_method = HttpMethod::Put;
        self
    }
}

impl OperationHandlers<WriteParams, WriteResult> for RestWriteHandlers {
    fn build_request(
        &self,
        _ctx: &Context,
        params: &WriteParams,
    ) -> Result<HttpRequest, ConnectorError> {
        let (method, url) = if params.is_create() {
            (HttpMethod::Post, self.urls.object_url(&params.object_name)?)
        } else {
            (self.update_method, self.urls.record_url(&params.object_name, &params.record_id)?)
        };
        let body = params.record_data.clone().unwrap_or(Value::Null);
        HttpRequest::new(method, url.to_string())
            .with_header("Accept", "application/json")
            .with_json(&body)
    }

    fn parse_response(
        &self,
        _ctx: &Context,
        params: &WriteParams,
        response: JsonResponse,
    ) -> Result<WriteResult, ConnectorError> {
        let record_id = self.id_location.extract(&response).or_else(|| {
            (!params.record_id.is_empty()).then(|| params.record_id.clone())
        });
        let Some(record_id) = record_id else {
            return Err(ConnectorError::MissingRecordId(format!(
                "provider did not report the id of the written {} record",
                params.object_name
            )));
        };
        let data = match response.body {
            Value::Object(map) => map,
            _ => conduit_core::Record::new(),
        };
        Ok(WriteResult {
            success: true,
            record_id,
            data,
            errors: Vec::new(),
        })
    }
}

/// Delete handlers: DELETE on the record URL.
pub struct RestDeleteHandlers {
    /// URL resolver.
    urls: UrlBuilder,
}

impl RestDeleteHandlers {
    /// Creates delete handlers.
    #[must_use]
    pub const fn new(urls: UrlBuilder) -> Self {
        Self {
            urls,
        }
    }
}

impl OperationHandlers<DeleteParams, DeleteResult> for RestDeleteHandlers {
    fn build_request(
        &self,
        _ctx: &Context,
        params: &DeleteParams,
    ) -> Result<HttpRequest, ConnectorError> {
        let url = self.urls.record_url(&params.object_name, &params.record_id)?;
        Ok(HttpRequest::new(HttpMethod::Delete, url.to_string()))
    }

    fn parse_response(
        &self,
        _ctx: &Context,
        _params: &DeleteParams,
        _response: JsonResponse,
    ) -> Result<DeleteResult, ConnectorError> {
        Ok(DeleteResult {
            success: true,
        })
    }
}
