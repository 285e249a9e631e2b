// crates/conduit-runtime/src/schema/mod.rs
// ============================================================================
// Module: Schema Providers
// Description: Sources of object field metadata and their composition.
// Purpose: Resolve ListObjectMetadata through static, sampled, and remote sources.
// Dependencies: conduit-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! Every provider implements [`conduit_core::SchemaProvider`]. Providers
//! report per-object failures inside the result and reserve `Err` for
//! failures of the whole call. [`CompositeSchemaProvider`] chains providers,
//! handing each one only the objects that are still unresolved.

// ============================================================================
// SECTION: Imports
// ============================================================================

use conduit_core::ConnectorError;

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod composite;
pub mod delegate;
pub mod openapi;
pub mod remote;
pub mod sampling;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use composite::CompositeSchemaProvider;
pub use delegate::DelegateSchemaProvider;
pub use delegate::MetadataFn;
pub use openapi::OpenApiSchemaProvider;
pub use remote::OperationSchemaProvider;
pub use remote::ParallelSchemaProvider;
pub use remote::object_metadata_from_body;
pub use sampling::SamplingSchemaProvider;
pub use sampling::infer_object_metadata;

// ============================================================================
// SECTION: Shared Checks
// ============================================================================

/// Rejects an empty object list.
///
/// # Errors
///
/// Returns [`ConnectorError::MissingObjects`] when `object_names` is empty.
pub fn ensure_objects(object_names: &[String]) -> Result<(), ConnectorError> {
    if object_names.is_empty() {
        return Err(ConnectorError::MissingObjects("no object names requested".to_string()));
    }
    Ok(())
}
