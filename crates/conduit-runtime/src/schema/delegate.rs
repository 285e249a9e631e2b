// crates/conduit-runtime/src/schema/delegate.rs
// ============================================================================
// Module: Delegate Schema Provider
// Description: Closure-backed schema provider.
// Purpose: Bind an adapter method as a schema provider without a new type.
// Dependencies: conduit-core
// ============================================================================

//! ## Overview
//! [`DelegateSchemaProvider`] forwards to a closure. The per-object
//! constructor turns a single-object lookup into a full provider that records
//! each failure against its object.

// ============================================================================
// SECTION: Imports
// ============================================================================

use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::ListObjectMetadataResult;
use conduit_core::ObjectMetadata;
use conduit_core::SchemaProvider;

use crate::schema::ensure_objects;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Boxed listing closure.
pub type MetadataFn =
    dyn Fn(&Context, &[String]) -> Result<ListObjectMetadataResult, ConnectorError> + Send + Sync;

/// Schema provider that forwards to a closure.
pub struct DelegateSchemaProvider {
    /// Listing closure.
    delegate: Box<MetadataFn>,
}

impl DelegateSchemaProvider {
    /// Creates a provider from a listing closure.
    #[must_use]
    pub fn new(delegate: Box<MetadataFn>) -> Self {
        Self {
            delegate,
        }
    }

    /// Creates a provider from a single-object lookup.
    #[must_use]
    pub fn per_object<F>(lookup: F) -> Self
    where
        F: Fn(&Context, &str) -> Result<ObjectMetadata, ConnectorError> + Send + Sync + 'static,
    {
        Self::new(Box::new(move |ctx: &Context, object_names: &[String]| {
            let mut result = ListObjectMetadataResult::default();
            for object_name in object_names {
                ctx.check()?;
                match lookup(ctx, object_name) {
                    Ok(metadata) => result.insert_metadata(object_name.clone(), metadata),
                    Err(err) => result.insert_error(object_name.clone(), err),
                }
            }
            Ok(result)
        }))
    }
}

impl SchemaProvider for DelegateSchemaProvider {
    fn list_object_metadata(
        &self,
        ctx: &Context,
        object_names: &[String],
    ) -> Result<ListObjectMetadataResult, ConnectorError> {
        ensure_objects(object_names)?;
        (self.delegate)(ctx, object_names)
    }
}
