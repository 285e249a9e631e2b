// crates/conduit-runtime/src/schema/remote.rs
// ============================================================================
// Module: Remote Schema Providers
// Description: Schema providers backed by metadata operation pipelines.
// Purpose: Fetch metadata over HTTP, in one request or one request per object.
// Dependencies: conduit-core, serde_json, std::thread
// ============================================================================

//! ## Overview
//! [`OperationSchemaProvider`] sends every requested object in one request.
//! [`ParallelSchemaProvider`] issues one request per object on scoped
//! threads, at most `max_concurrency` at a time, and records each object's
//! outcome independently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;

use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::InputSchema;
use conduit_core::ListObjectMetadataResult;
use conduit_core::ObjectMetadata;
use conduit_core::SchemaProvider;
use serde_json::Value;

use crate::operations::ListObjectMetadataOperation;
use crate::operations::SingleObjectMetadataOperation;
use crate::schema::ensure_objects;

// ============================================================================
// SECTION: Body Decoding
// ============================================================================

/// Converts a JSON Schema response body into object metadata.
///
/// # Errors
///
/// Returns [`ConnectorError::EmptyResponse`] for a null body and
/// [`ConnectorError::SchemaConversion`] when the body is not a schema.
pub fn object_metadata_from_body(
    object_name: &str,
    body: &Value,
) -> Result<ObjectMetadata, ConnectorError> {
    if body.is_null() {
        return Err(ConnectorError::EmptyResponse(format!(
            "no metadata returned for {object_name}"
        )));
    }
    let schema = InputSchema::from_value(body.clone()).map_err(|err| {
        ConnectorError::SchemaConversion(format!("metadata for {object_name}: {}", err.detail()))
    })?;
    Ok(schema.to_object_metadata(object_name))
}

// ============================================================================
// SECTION: Single Request
// ============================================================================

/// Schema provider issuing one metadata request for all objects.
pub struct OperationSchemaProvider {
    /// Metadata pipeline.
    operation: ListObjectMetadataOperation,
}

impl OperationSchemaProvider {
    /// Creates a provider.
    #[must_use]
    pub const fn new(operation: ListObjectMetadataOperation) -> Self {
        Self {
            operation,
        }
    }
}

impl SchemaProvider for OperationSchemaProvider {
    fn list_object_metadata(
        &self,
        ctx: &Context,
        object_names: &[String],
    ) -> Result<ListObjectMetadataResult, ConnectorError> {
        ensure_objects(object_names)?;
        self.operation.execute(ctx, &object_names.to_vec())
    }
}

// ============================================================================
// SECTION: Parallel Requests
// ============================================================================

/// Schema provider issuing one metadata request per object concurrently.
pub struct ParallelSchemaProvider {
    /// Per-object metadata pipeline.
    operation: SingleObjectMetadataOperation,
    /// Maximum requests in flight.
    max_concurrency: usize,
}

impl ParallelSchemaProvider {
    /// Creates a provider with at most `max_concurrency` requests in flight.
    #[must_use]
    pub fn new(operation: SingleObjectMetadataOperation, max_concurrency: usize) -> Self {
        Self {
            operation,
            max_concurrency: max_concurrency.max(1),
        }
    }
}

impl SchemaProvider for ParallelSchemaProvider {
    fn list_object_metadata(
        &self,
        ctx: &Context,
        object_names: &[String],
    ) -> Result<ListObjectMetadataResult, ConnectorError> {
        ensure_objects(object_names)?;
        let mut result = ListObjectMetadataResult::default();
        for batch in object_names.chunks(self.max_concurrency) {
            ctx.check()?;
            let outcomes: Vec<(String, Result<ObjectMetadata, ConnectorError>)> =
                thread::scope(|scope| {
                    let handles: Vec<_> = batch
                        .iter()
                        .map(|object_name| {
                            let handle =
                                scope.spawn(move || self.operation.execute(ctx, object_name));
                            (object_name.clone(), handle)
                        })
                        .collect();
                    handles
                        .into_iter()
                        .map(|(object_name, handle)| {
                            let outcome = handle.join().unwrap_or_else(|_| {
                                Err(ConnectorError::Internal(format!(
                                    "metadata fetch for {object_name} panicked"
                                )))
                            });
                            (object_name, outcome)
                        })
                        .collect()
                });
            for (object_name, outcome) in outcomes {
                match outcome {
                    Ok(metadata) => result.insert_metadata(object_name, metadata),
                    Err(err) => result.insert_error(object_name, err),
                }
            }
        }
        Ok(result)
    }
}
