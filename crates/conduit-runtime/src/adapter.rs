// crates/conduit-runtime/src/adapter.rs
// ============================================================================
// Module: Adapter Composition
// Description: Base connector, capability members, and guarded construction.
// Purpose: Compose one Connector value from optional capability members.
// Dependencies: conduit-core, tracing
// ============================================================================

//! ## Overview
//! An adapter is a [`BaseConnector`] plus zero or more capability members.
//! The provider constructor receives the base, wires pipelines into
//! capabilities through [`AdapterBuilder`], and returns the composed value.
//! Callers discover what the adapter can do through
//! [`Connector::capabilities`] and the `as_*` queries.
//!
//! [`new_connector`] runs a provider constructor and converts a panic inside
//! it into [`ConnectorError::Internal`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use conduit_core::ConnectorError;
use conduit_core::Connector;
use conduit_core::Deleter;
use conduit_core::HttpClient;
use conduit_core::Reader;
use conduit_core::SchemaProvider;
use conduit_core::Writer;
use tracing::debug;
use tracing::error;

use crate::guard::catch_panic;
use crate::operations::SupportGate;
use crate::operations::UrlBuilder;
use crate::params::ConnectorParams;
use crate::substitution::SubstitutionRegistry;
use crate::substitution::Template;
use crate::support::EndpointRegistry;

// ============================================================================
// SECTION: Base Connector
// ============================================================================

/// Provider identity and catalog shared by every capability of an adapter.
#[derive(Debug, Clone)]
pub struct BaseConnector {
    /// Validated construction parameters.
    params: ConnectorParams,
    /// Catalog registry derived from the parameters.
    substitutions: SubstitutionRegistry,
    /// Pre-parsed base URL template.
    base_url: Template,
}

impl BaseConnector {
    /// Creates a base from validated parameters.
    #[must_use]
    pub fn new(params: ConnectorParams) -> Self {
        let substitutions = params.substitutions();
        let base_url = Template::parse(&params.provider.base_url);
        Self {
            params,
            substitutions,
            base_url,
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.params.provider.name
    }

    /// Returns the module id, or the empty string when none was chosen.
    #[must_use]
    pub fn module(&self) -> &str {
        self.params.module.as_deref().unwrap_or_default()
    }

    /// Returns the construction parameters.
    #[must_use]
    pub const fn params(&self) -> &ConnectorParams {
        &self.params
    }

    /// Returns the catalog registry.
    #[must_use]
    pub const fn substitutions(&self) -> &SubstitutionRegistry {
        &self.substitutions
    }

    /// Renders `template` against the catalog registry.
    #[must_use]
    pub fn render(&self, template: &Template) -> String {
        template.render(&self.substitutions)
    }

    /// Returns a URL builder rooted at the rendered base URL.
    #[must_use]
    pub fn urls(&self) -> UrlBuilder {
        UrlBuilder::new(&self.base_url, &self.substitutions)
    }

    /// Returns the authenticated transport.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidParameter`] when no client was supplied.
    pub fn client(&self) -> Result<Arc<dyn HttpClient>, ConnectorError> {
        self.params.client.clone().ok_or_else(|| {
            ConnectorError::InvalidParameter(format!(
                "provider {} requires an http client",
                self.provider()
            ))
        })
    }

    /// Returns a support gate for this adapter's module.
    #[must_use]
    pub fn gate(&self, registry: Option<Arc<EndpointRegistry>>) -> SupportGate {
        SupportGate::new(self.module(), registry)
    }
}

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// Connector composed of a base and optional capability members.
pub struct Adapter {
    /// Shared provider state.
    base: BaseConnector,
    /// Read capability.
    reader: Option<Box<dyn Reader>>,
    /// Write capability.
    writer: Option<Box<dyn Writer>>,
    /// Delete capability.
    deleter: Option<Box<dyn Deleter>>,
    /// Metadata capability.
    schema_provider: Option<Box<dyn SchemaProvider>>,
}

impl Adapter {
    /// Starts composing an adapter around `base`.
    #[must_use]
    pub const fn builder(base: BaseConnector) -> AdapterBuilder {
        AdapterBuilder::new(base)
    }

    /// Returns the shared provider state.
    #[must_use]
    pub const fn base(&self) -> &BaseConnector {
        &self.base
    }
}

impl Connector for Adapter {
    fn provider(&self) -> &str {
        self.base.provider()
    }

    fn as_reader(&self) -> Option<&dyn Reader> {
        self.reader.as_deref()
    }

    fn as_writer(&self) -> Option<&dyn Writer> {
        self.writer.as_deref()
    }

    fn as_deleter(&self) -> Option<&dyn Deleter> {
        self.deleter.as_deref()
    }

    fn as_schema_provider(&self) -> Option<&dyn SchemaProvider> {
        self.schema_provider.as_deref()
    }
}

/// Wires capability members into an [`Adapter`].
pub struct AdapterBuilder {
    /// Adapter under construction.
    adapter: Adapter,
}

impl AdapterBuilder {
    /// Creates a builder with no capabilities.
    #[must_use]
    pub const fn new(base: BaseConnector) -> Self {
        Self {
            adapter: Adapter {
                base,
                reader: None,
                writer: None,
                deleter: None,
                schema_provider: None,
            },
        }
    }

    /// Returns the base the adapter is composed around.
    #[must_use]
    pub const fn base(&self) -> &BaseConnector {
        &self.adapter.base
    }

    /// Adds the read capability.
    #[must_use]
    pub fn reader(mut self, reader: impl Reader + 'static) -> Self {
        self.adapter.reader = Some(Box::new(reader));
        self
    }

    /// Adds the write capability.
    #[must_use]
    pub fn writer(mut self, writer: impl Writer + 'static) -> Self {
        self.adapter.writer = Some(Box::new(writer));
        self
    }

    /// Adds the delete capability.
    #[must_use]
    pub fn deleter(mut self, deleter: impl Deleter + 'static) -> Self {
        self.adapter.deleter = Some(Box::new(deleter));
        self
    }

    /// Adds the metadata capability.
    #[must_use]
    pub fn schema_provider(mut self, provider: impl SchemaProvider + 'static) -> Self {
        self.adapter.schema_provider = Some(Box::new(provider));
        self
    }

    /// Finishes composition.
    #[must_use]
    pub fn build(self) -> Adapter {
        let adapter = self.adapter;
        debug!(
            provider = adapter.provider(),
            capabilities = adapter.capabilities().len(),
            "adapter composed"
        );
        adapter
    }
}

// ============================================================================
// SECTION: Guarded Construction
// ============================================================================

/// Runs a provider constructor against validated parameters.
///
/// # Errors
///
/// Returns the constructor's error, or [`ConnectorError::Internal`] when the
/// constructor panics.
pub fn new_connector<C, F>(params: ConnectorParams, constructor: F) -> Result<C, ConnectorError>
where
    F: FnOnce(BaseConnector) -> Result<C, ConnectorError>,
{
    let provider = params.provider.name.clone();
    let base = BaseConnector::new(params);
    catch_panic(|| constructor(base)).unwrap_or_else(|panic| {
        error!(provider = %provider, panic = %panic, "connector constructor panicked");
        Err(ConnectorError::Internal(format!("connector {provider} constructor {panic}")))
    })
}
