// crates/conduit-runtime/tests/pipelines.rs
// ============================================================================
// Module: Operation Pipeline Tests
// Description: End-to-end adapter reads, writes, and deletes over loopback.
// Purpose: Verify request building, pagination, support gating, and errors.
// Dependencies: conduit-runtime, tiny_http
// ============================================================================

//! ## Overview
//! Composes an adapter the way a provider constructor would and drives it
//! against a scripted local server.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use conduit_core::Capability;
use conduit_core::ConnectorError;
use conduit_core::Connector;
use conduit_core::Context;
use conduit_core::DeleteParams;
use conduit_core::DeleteResult;
use conduit_core::ErrorKind;
use conduit_core::HttpMethod;
use conduit_core::HttpRequest;
use conduit_core::HttpResponse;
use conduit_core::ReadParams;
use conduit_core::SchemaProvider;
use conduit_core::WriteParams;
use conduit_runtime::Adapter;
use conduit_runtime::DeleteOperation;
use conduit_runtime::EndpointRegistry;
use conduit_runtime::EndpointSupport;
use conduit_runtime::ErrorInterpreter;
use conduit_runtime::FnHandlers;
use conduit_runtime::HttpDeleter;
use conduit_runtime::HttpReader;
use conduit_runtime::HttpWriter;
use conduit_runtime::JsonResponse;
use conduit_runtime::OperationHandlers;
use conduit_runtime::PageExtractors;
use conduit_runtime::ParallelSchemaProvider;
use conduit_runtime::ParamsBuilder;
use conduit_runtime::ProviderInfo;
use conduit_runtime::ReadOperation;
use conduit_runtime::RecordIdLocation;
use conduit_runtime::RestDeleteHandlers;
use conduit_runtime::RestReadHandlers;
use conduit_runtime::RestWriteHandlers;
use conduit_runtime::SingleObjectMetadataOperation;
use conduit_runtime::Support;
use conduit_runtime::SupportGate;
use conduit_runtime::UrlBuilder;
use conduit_runtime::WriteOperation;
use conduit_runtime::new_connector;
use conduit_runtime::pagination::default_marshal;
use conduit_runtime::pagination::next_cursor_at;
use conduit_runtime::pagination::records_at;
use conduit_runtime::schema::object_metadata_from_body;
use serde_json::json;

use crate::common::Scripted;
use crate::common::TestServer;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Support table: contacts and deals are fully supported, anything else is read-only.
fn registry() -> Arc<EndpointRegistry> {
    let mut table = BTreeMap::new();
    table.insert(
        "crm".to_string(),
        vec![
            EndpointSupport::new("{contacts,deals}", Support::read_write_delete()),
            EndpointSupport::new("*", Support::read_only()),
        ],
    );
    Arc::new(EndpointRegistry::new(&table).unwrap())
}

/// Composes a read/write/delete adapter against `server`.
fn adapter(server: &TestServer) -> Adapter {
    let params = ParamsBuilder::new(ProviderInfo::new(
        "acme",
        format!("{}/{{{{workspace}}}}/v1", server.base_url),
    ))
    .with_workspace("team-1")
    .with_module("crm")
    .with_client(common::client())
    .build()
    .unwrap();
    new_connector(params, |base| {
        let client = base.client()?;
        let interpreter = Arc::new(ErrorInterpreter::with_defaults());
        let gate = base.gate(Some(registry()));
        let extractors = PageExtractors::new(
            next_cursor_at("paging.next.after"),
            records_at("results"),
            default_marshal(Some("id")),
        );
        let read = ReadOperation::new(
            Arc::clone(&client),
            Box::new(
                RestReadHandlers::new(base.urls(), extractors, "after")
                    .with_page_size_param("limit", 2),
            ),
            Arc::clone(&interpreter),
        );
        let write = WriteOperation::new(
            Arc::clone(&client),
            Box::new(RestWriteHandlers::new(base.urls(), RecordIdLocation::Body("id".to_string()))),
            Arc::clone(&interpreter),
        );
        let delete = DeleteOperation::new(
            client,
            Box::new(RestDeleteHandlers::new(base.urls())),
            interpreter,
        );
        Ok(Adapter::builder(base)
            .reader(HttpReader::new(gate.clone(), read, false))
            .writer(HttpWriter::new(gate.clone(), write))
            .deleter(HttpDeleter::new(gate, delete))
            .build())
    })
    .unwrap()
}

// ============================================================================
// SECTION: Composition
// ============================================================================

#[test]
fn adapter_reports_wired_capabilities() {
    let server = TestServer::spawn(Vec::new());
    let adapter = adapter(&server);
    let capabilities = adapter.capabilities();
    assert_eq!(adapter.provider(), "acme");
    assert!(capabilities.contains(Capability::Read));
    assert!(capabilities.contains(Capability::Write));
    assert!(capabilities.contains(Capability::Delete));
    assert!(!capabilities.contains(Capability::ListObjectMetadata));
    assert!(adapter.as_schema_provider().is_none());
    assert_eq!(adapter.base().urls().base(), format!("{}/team-1/v1", server.base_url));
}

#[test]
fn constructor_panics_become_internal_errors() {
    let params = ParamsBuilder::new(ProviderInfo::new("broken", "https://example.com"))
        .build()
        .unwrap();
    let outcome: Result<Adapter, ConnectorError> =
        new_connector(params, |_base| panic!("missing catalog entry"));
    let err = outcome.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(err.to_string().contains("missing catalog entry"));
}

#[test]
fn constructor_without_client_fails() {
    let params = ParamsBuilder::new(ProviderInfo::new("acme", "https://example.com"))
        .build()
        .unwrap();
    let outcome = new_connector(params, |base| base.client().map(|_| ()));
    assert_eq!(outcome.unwrap_err().kind(), ErrorKind::InvalidParameter);
}

// ============================================================================
// SECTION: Reads
// ============================================================================

#[test]
fn reads_follow_cursor_pages_until_done() {
    let server = TestServer::spawn(vec![
        Scripted::json(
            200,
            &json!({
                "results": [{"id": "1", "Name": "Ada"}, {"id": 2, "Name": "Bob"}],
                "paging": {"next": {"after": "c2"}}
            }),
        ),
        Scripted::json(200, &json!({"results": [{"id": "3", "Name": "Cy"}], "paging": null})),
    ]);
    let adapter = adapter(&server);
    let reader = adapter.as_reader().unwrap();
    let ctx = Context::background();

    let first = reader.read(&ctx, &ReadParams::new("contacts").with_fields(["name"])).unwrap();
    assert_eq!(first.rows, 2);
    assert!(!first.done);
    assert_eq!(first.next_page.as_str(), "c2");
    assert_eq!(first.data[0].id, "1");
    assert_eq!(first.data[1].id, "2");
    assert_eq!(first.data[0].fields.get("name"), Some(&json!("Ada")));
    assert_eq!(first.data[0].raw.get("Name"), Some(&json!("Ada")));

    let second = reader
        .read(&ctx, &ReadParams::new("contacts").with_next_page(first.next_page.clone()))
        .unwrap();
    assert!(second.done);
    assert!(second.next_page.is_empty());
    assert_eq!(second.data.len(), 1);

    let requests = server.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "/team-1/v1/contacts?limit=2");
    assert_eq!(requests[1].url, "/team-1/v1/contacts?after=c2&limit=2");
}

#[test]
fn reads_of_wildcard_objects_are_allowed() {
    let server = TestServer::spawn(vec![Scripted::json(200, &json!({"results": []}))]);
    let adapter = adapter(&server);
    let page = adapter
        .as_reader()
        .unwrap()
        .read(&Context::background(), &ReadParams::new("invoices"))
        .unwrap();
    assert!(page.done);
    assert!(page.data.is_empty());
}

#[test]
fn invalid_read_params_fail_before_any_request() {
    let server = TestServer::spawn(Vec::new());
    let adapter = adapter(&server);
    let err = adapter
        .as_reader()
        .unwrap()
        .read(&Context::background(), &ReadParams::new(""))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingObjects);
    assert!(server.requests().is_empty());
}

// ============================================================================
// SECTION: Writes And Deletes
// ============================================================================

#[test]
fn writes_post_on_create_and_patch_on_update() {
    let server = TestServer::spawn(vec![
        Scripted::json(201, &json!({"id": "9", "name": "Ada"})),
        Scripted::text(204, ""),
    ]);
    let adapter = adapter(&server);
    let writer = adapter.as_writer().unwrap();
    let ctx = Context::background();

    let created = writer.write(&ctx, &WriteParams::create("contacts", json!({"name": "Ada"}))).unwrap();
    assert!(created.success);
    assert_eq!(created.record_id, "9");
    assert_eq!(created.data.get("name"), Some(&json!("Ada")));

    let updated =
        writer.write(&ctx, &WriteParams::update("contacts", "9", json!({"name": "Ada L"}))).unwrap();
    assert_eq!(updated.record_id, "9");
    assert!(updated.data.is_empty());

    let requests = server.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/team-1/v1/contacts");
    assert_eq!(requests[0].json(), json!({"name": "Ada"}));
    assert_eq!(requests[1].method, "PATCH");
    assert_eq!(requests[1].url, "/team-1/v1/contacts/9");
}

#[test]
fn writes_to_read_only_objects_are_rejected_locally() {
    let server = TestServer::spawn(Vec::new());
    let adapter = adapter(&server);
    let err = adapter
        .as_writer()
        .unwrap()
        .write(&Context::background(), &WriteParams::create("invoices", json!({"total": 1})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationNotSupportedForObject);
    assert!(server.requests().is_empty());
}

#[test]
fn deletes_target_the_record_url() {
    let server = TestServer::spawn(vec![Scripted::text(204, "")]);
    let adapter = adapter(&server);
    let result = adapter
        .as_deleter()
        .unwrap()
        .delete(&Context::background(), &DeleteParams::new("deals", "d 1"))
        .unwrap();
    assert!(result.success);
    let requests = server.requests();
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].url, "/team-1/v1/deals/d%201");
}

#[test]
fn missing_registry_fails_closed() {
    let server = TestServer::spawn(Vec::new());
    let urls = adapter(&server).base().urls();
    let operation = DeleteOperation::new(
        common::client(),
        Box::new(RestDeleteHandlers::new(urls)),
        Arc::new(ErrorInterpreter::with_defaults()),
    );
    let deleter = HttpDeleter::new(SupportGate::new("crm", None), operation);
    let err = conduit_core::Deleter::delete(
        &deleter,
        &Context::background(),
        &DeleteParams::new("contacts", "1"),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SupportNotConfigured);
}

// ============================================================================
// SECTION: Error Interpretation
// ============================================================================

#[test]
fn provider_errors_are_interpreted_by_status_and_body() {
    let server = TestServer::spawn(vec![
        Scripted::json(401, &json!({"error": "invalid_token", "error_description": "token expired"})),
        Scripted::json(429, &json!({"message": "slow down"})),
    ]);
    let adapter = adapter(&server);
    let reader = adapter.as_reader().unwrap();
    let ctx = Context::background();

    let unauthorized = reader.read(&ctx, &ReadParams::new("contacts")).unwrap_err();
    assert_eq!(unauthorized.kind(), ErrorKind::AccessToken);
    assert_eq!(unauthorized.detail(), "HTTP 401: token expired");
    assert!(!unauthorized.is_retryable());

    let limited = reader.read(&ctx, &ReadParams::new("contacts")).unwrap_err();
    assert_eq!(limited.kind(), ErrorKind::LimitExceeded);
    assert!(limited.is_retryable());
}

/// Delete handlers that translate 404 into a missing record.
struct NotFoundAwareDeletes {
    /// Base URL resolver.
    urls: UrlBuilder,
}

impl OperationHandlers<DeleteParams, DeleteResult> for NotFoundAwareDeletes {
    fn build_request(&self, _ctx: &Context, params: &DeleteParams) -> Result<HttpRequest, ConnectorError> {
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

    fn handle_error(&self, params: &DeleteParams, response: &HttpResponse) -> Option<ConnectorError> {
        (response.status == 404).then(|| {
            ConnectorError::RecordNotFound(format!("{} {}", params.object_name, params.record_id))
        })
    }
}

#[test]
fn handler_error_overrides_take_precedence() {
    let server = TestServer::spawn(vec![
        Scripted::json(404, &json!({"message": "gone"})),
        Scripted::json(500, &json!({"message": "boom"})),
    ]);
    let urls = adapter(&server).base().urls();
    let operation = DeleteOperation::new(
        common::client(),
        Box::new(NotFoundAwareDeletes {
            urls,
        }),
        Arc::new(ErrorInterpreter::with_defaults()),
    );
    let ctx = Context::background();
    let params = DeleteParams::new("contacts", "1");

    let missing = operation.execute(&ctx, &params).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::RecordNotFound);

    let failed = operation.execute(&ctx, &params).unwrap_err();
    assert_eq!(failed.kind(), ErrorKind::Retryable);
    assert_eq!(failed.detail(), "HTTP 500: boom");
}

// ============================================================================
// SECTION: Parallel Metadata
// ============================================================================

/// Metadata pipeline fetching `{base}/schemas/{object}`.
fn metadata_operation(server: &TestServer) -> SingleObjectMetadataOperation {
    let base = server.base_url.clone();
    SingleObjectMetadataOperation::new(
        common::client(),
        Box::new(FnHandlers::new(
            Box::new(move |_ctx: &Context, object: &String| {
                Ok(HttpRequest::new(HttpMethod::Get, format!("{base}/schemas/{object}")))
            }),
            Box::new(|_ctx: &Context, object: &String, response: JsonResponse| {
                object_metadata_from_body(object, &response.body)
            }),
        )),
        Arc::new(ErrorInterpreter::with_defaults()),
    )
}

#[test]
fn parallel_metadata_resolves_every_object() {
    let schema = json!({
        "type": "object",
        "properties": {"id": {"type": "string", "readOnly": true}, "email": {"type": "string"}},
        "required": ["email"]
    });
    let server = TestServer::spawn(vec![
        Scripted::json(200, &schema),
        Scripted::json(200, &schema),
        Scripted::json(200, &schema),
    ]);
    let provider = ParallelSchemaProvider::new(metadata_operation(&server), 2);
    let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let result = provider.list_object_metadata(&Context::background(), &names).unwrap();
    assert_eq!(result.result.len(), 3);
    assert!(result.errors.is_empty());
    let email = &result.result["b"].fields["email"];
    assert_eq!(email.is_required, Some(true));
    assert_eq!(result.result["a"].fields["id"].read_only, Some(true));
    assert_eq!(server.requests().len(), 3);
}

#[test]
fn parallel_metadata_records_failures_per_object() {
    let server = TestServer::spawn(vec![
        Scripted::json(200, &json!({"type": "object", "properties": {}})),
        Scripted::json(404, &json!({"message": "no such object"})),
    ]);
    let provider = ParallelSchemaProvider::new(metadata_operation(&server), 1);
    let names = vec!["known".to_string(), "unknown".to_string()];
    let result = provider.list_object_metadata(&Context::background(), &names).unwrap();
    assert!(result.is_resolved("known"));
    assert_eq!(result.errors["unknown"].kind(), ErrorKind::NotFound);
}
