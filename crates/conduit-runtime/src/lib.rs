// crates/conduit-runtime/src/lib.rs
// ============================================================================
// Module: Conduit Runtime
// Description: Adapter runtime shared by every HTTP provider integration.
// Purpose: Supply catalog, support, pagination, pipelines, and schema sources.
// Dependencies: conduit-core, reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! The runtime turns a provider description into a working adapter. Catalog
//! templates are rendered once per adapter, endpoint support gates every
//! capability call, and typed pipelines carry each operation through build,
//! execute, parse, and error interpretation.
//! Invariants:
//! - Catalog, support, and schema registries are read-only after construction.
//! - `ReadResult::done` holds exactly when the next-page token is empty.
//! - The runtime never retries; retryable errors are returned to the caller.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod adapter;
pub mod guard;
pub mod http;
pub mod interpreter;
pub mod object_config;
pub mod operations;
pub mod pagination;
pub mod params;
pub mod schema;
pub mod substitution;
pub mod support;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use adapter::Adapter;
pub use adapter::AdapterBuilder;
pub use adapter::BaseConnector;
pub use adapter::new_connector;
pub use guard::catch_panic;
pub use http::HttpClientConfig;
pub use http::JsonResponse;
pub use http::ReqwestHttpClient;
pub use http::parse_json_response;
pub use interpreter::ErrorInterpreter;
pub use interpreter::FormatSwitch;
pub use interpreter::FormatTemplate;
pub use interpreter::StatusCodeMapping;
pub use interpreter::default_kind_for_status;
pub use object_config::ObjectConfig;
pub use object_config::ObjectConfigs;
pub use operations::DeleteOperation;
pub use operations::FnHandlers;
pub use operations::HttpDeleter;
pub use operations::HttpOperation;
pub use operations::HttpReader;
pub use operations::HttpWriter;
pub use operations::ListObjectMetadataOperation;
pub use operations::OperationHandlers;
pub use operations::ReadOperation;
pub use operations::RecordIdLocation;
pub use operations::RestDeleteHandlers;
pub use operations::RestReadHandlers;
pub use operations::RestWriteHandlers;
pub use operations::SingleObjectMetadataOperation;
pub use operations::SupportGate;
pub use operations::UrlBuilder;
pub use operations::WriteOperation;
pub use pagination::PageExtractors;
pub use pagination::parse_result;
pub use params::ConnectorParams;
pub use params::ParamsBuilder;
pub use params::PostAuthInfo;
pub use params::ProviderInfo;
pub use schema::CompositeSchemaProvider;
pub use schema::DelegateSchemaProvider;
pub use schema::OpenApiSchemaProvider;
pub use schema::OperationSchemaProvider;
pub use schema::ParallelSchemaProvider;
pub use schema::SamplingSchemaProvider;
pub use substitution::CatalogVariables;
pub use substitution::SubstitutionPlan;
pub use substitution::SubstitutionRegistry;
pub use substitution::Template;
pub use support::EndpointRegistry;
pub use support::EndpointSupport;
pub use support::Operation;
pub use support::Support;
pub use support::ensure_supported;
