// crates/conduit-runtime/src/schema/composite.rs
// ============================================================================
// Module: Composite Schema Provider
// Description: Sequential cascade over several schema providers.
// Purpose: Resolve each object from the first provider able to describe it.
// Dependencies: conduit-core, tracing
// ============================================================================

//! ## Overview
//! Providers run strictly in order. Each provider receives only the objects
//! still unresolved after its predecessors. Failures are recorded against
//! their objects and the cascade moves on:
//! - a per-object error from a provider is recorded and may be replaced by a
//!   later provider's error for the same object;
//! - an `Err` for the whole call is recorded against every object it covered;
//! - a panic is logged and its objects are left as they were.
//!
//! Objects that no provider resolved and no provider failed on are reported
//! as [`ConnectorError::SchemaNotFound`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::ListObjectMetadataResult;
use conduit_core::SchemaProvider;
use tracing::error;
use tracing::warn;

use crate::guard::catch_panic;
use crate::schema::ensure_objects;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Cascade of schema providers.
#[derive(Default)]
pub struct CompositeSchemaProvider {
    /// Providers in priority order.
    providers: Vec<Arc<dyn SchemaProvider>>,
}

impl CompositeSchemaProvider {
    /// Creates a cascade from providers in priority order.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn SchemaProvider>>) -> Self {
        Self {
            providers,
        }
    }

    /// Appends a provider with the lowest priority.
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn SchemaProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Returns the number of providers in the cascade.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true when the cascade has no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl SchemaProvider for CompositeSchemaProvider {
    fn list_object_metadata(
        &self,
        ctx: &Context,
        object_names: &[String],
    ) -> Result<ListObjectMetadataResult, ConnectorError> {
        ensure_objects(object_names)?;
        let mut combined = ListObjectMetadataResult::default();
        let mut pending: Vec<String> = object_names.to_vec();
        for (position, provider) in self.providers.iter().enumerate() {
            if pending.is_empty() {
                break;
            }
            ctx.check()?;
            match catch_panic(|| provider.list_object_metadata(ctx, &pending)) {
                Ok(Ok(outcome)) => {
                    for object_name in &pending {
                        if let Some(metadata) = outcome.result.get(object_name) {
                            combined.insert_metadata(object_name.clone(), metadata.clone());
                        } else if let Some(err) = outcome.errors.get(object_name) {
                            combined.insert_error(object_name.clone(), err.clone());
                        }
                    }
                }
                Ok(Err(err)) => {
                    warn!(provider = position, error = %err, "schema provider failed");
                    for object_name in &pending {
                        combined.insert_error(object_name.clone(), err.clone());
                    }
                }
                Err(panic) => {
                    error!(provider = position, panic = %panic, "schema provider panicked");
                }
            }
            pending.retain(|object_name| !combined.is_resolved(object_name));
        }
        for object_name in pending {
            if !combined.errors.contains_key(&object_name) {
                let err = ConnectorError::SchemaNotFound(format!(
                    "no schema provider resolved {object_name}"
                ));
                combined.insert_error(object_name, err);
            }
        }
        Ok(combined)
    }
}
