// crates/conduit-runtime/tests/common/mod.rs
// ============================================================================
// Module: Runtime Test Helpers
// Description: Scripted local HTTP server and client fixtures.
// Purpose: Drive the reqwest client and operation pipelines end to end.
// Dependencies: conduit-runtime, tiny_http
// ============================================================================

//! ## Overview
//! [`TestServer`] answers a fixed script of responses in order and records
//! every request it receives before answering it, so a test can inspect the
//! recorded requests as soon as its client call returns.

#![allow(dead_code, reason = "Shared helpers are not used by every test binary.")]

use std::io::Read;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use conduit_core::HttpClient;
use conduit_runtime::HttpClientConfig;
use conduit_runtime::ReqwestHttpClient;
use serde_json::Value;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Scripted Responses
// ============================================================================

/// One response the server will send.
#[derive(Debug, Clone)]
pub struct Scripted {
    /// Status code.
    pub status: u16,
    /// Extra response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: String,
}

impl Scripted {
    /// JSON response with the given status.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    /// Plain text response with the given status.
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    /// Adds a response header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// One request the server received.
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Request method.
    pub method: String,
    /// Path and query.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Request body text.
    pub body: String,
}

impl Recorded {
    /// Returns a header value, ignoring name case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Local HTTP server answering a response script.
pub struct TestServer {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Requests received so far.
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    /// Starts a server that answers `script` in order, then stops.
    pub fn spawn(script: Vec<Scripted>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for scripted in script {
                let Ok(mut request) = server.recv() else {
                    break;
                };
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                recorded.lock().unwrap().push(Recorded {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    headers: request
                        .headers()
                        .iter()
                        .map(|header| (header.field.to_string(), header.value.to_string()))
                        .collect(),
                    body,
                });
                let mut response =
                    Response::from_string(scripted.body).with_status_code(scripted.status);
                for (name, value) in &scripted.headers {
                    response = response
                        .with_header(Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap());
                }
                let _ = request.respond(response);
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

// ============================================================================
// SECTION: Clients
// ============================================================================

/// Default reqwest client with a short timeout.
pub fn client() -> Arc<dyn HttpClient> {
    Arc::new(
        ReqwestHttpClient::new(HttpClientConfig {
            timeout_ms: 5_000,
            ..HttpClientConfig::default()
        })
        .unwrap(),
    )
}
