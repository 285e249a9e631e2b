// crates/conduit-runtime/src/http.rs
// ============================================================================
// Module: HTTP Transport
// Description: Blocking reqwest client with timeouts and response size limits.
// Purpose: Provide a default HttpClient and JSON response decoding.
// Dependencies: conduit-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! [`ReqwestHttpClient`] executes requests built by operation pipelines. It
//! disables redirects, applies a per-request timeout bounded by the call
//! context deadline, and reads bodies under a byte limit. Authentication is
//! the host's concern: hosts either wrap this client or supply their own
//! [`HttpClient`] with credentials attached.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;

use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::HttpClient;
use conduit_core::HttpMethod;
use conduit_core::HttpRequest;
use conduit_core::HttpResponse;
use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the default HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
    /// Headers added to every request, such as a static API key.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_response_bytes: 8 * 1024 * 1024,
            user_agent: "conduit/0.1".to_string(),
            default_headers: BTreeMap::new(),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Default [`HttpClient`] backed by blocking reqwest.
pub struct ReqwestHttpClient {
    /// Client configuration, including limits.
    config: HttpClientConfig,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Transport`] when the client cannot be created.
    pub fn new(config: HttpClientConfig) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| ConnectorError::Transport(format!("http client build failed: {err}")))?;
        Ok(Self {
            config,
            client,
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, ConnectorError> {
        ctx.check()?;
        let method = to_reqwest_method(request.method);
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &self.config.default_headers {
            builder = builder.header(name, value);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(remaining) = ctx.remaining() {
            let configured = Duration::from_millis(self.config.timeout_ms);
            builder = builder.timeout(remaining.min(configured));
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        debug!(method = %request.method, url = %request.url, "executing http request");
        let mut response = builder.send().map_err(|err| {
            if err.is_timeout() {
                ConnectorError::Retryable(format!("http request timed out: {err}"))
            } else {
                ConnectorError::Transport(format!("http request failed: {err}"))
            }
        })?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = read_response_limited(&mut response, self.config.max_response_bytes)?;
        ctx.check()?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Maps the pipeline method onto reqwest.
const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut reqwest::blocking::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, ConnectorError> {
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| ConnectorError::Internal("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(ConnectorError::Transport("http response exceeds size limit".to_string()));
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle
        .read_to_end(&mut buf)
        .map_err(|err| ConnectorError::Transport(format!("failed to read response: {err}")))?;
    if buf.len() > max_bytes {
        return Err(ConnectorError::Transport("http response exceeds size limit".to_string()));
    }
    if let Some(expected) = expected_len {
        let expected = usize::try_from(expected)
            .map_err(|_| ConnectorError::Transport("invalid response length".to_string()))?;
        if buf.len() < expected {
            return Err(ConnectorError::Transport("http response truncated".to_string()));
        }
    }
    Ok(buf)
}

// ============================================================================
// SECTION: JSON Decoding
// ============================================================================

/// Decoded JSON response with the metadata parsers may need.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Decoded body; `Null` when the body was empty.
    pub body: Value,
}

impl JsonResponse {
    /// Returns the first header with the given name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Decodes a successful response body as JSON.
///
/// # Errors
///
/// Returns [`ConnectorError::FailedUnmarshal`] when a non-empty body is not JSON.
pub fn parse_json_response(response: HttpResponse) -> Result<JsonResponse, ConnectorError> {
    let body = if response.body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&response.body).map_err(|err| {
            ConnectorError::FailedUnmarshal(format!(
                "HTTP {} body is not valid json: {err}",
                response.status
            ))
        })?
    };
    Ok(JsonResponse {
        status: response.status,
        headers: response.headers,
        body,
    })
}
