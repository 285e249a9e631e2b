// crates/conduit-runtime/src/params.rs
// ============================================================================
// Module: Connector Parameters
// Description: Option builder for adapter construction parameters.
// Purpose: Collect workspace, module, metadata, and transport for an adapter.
// Dependencies: conduit-core, crate::substitution
// ============================================================================

//! ## Overview
//! [`ParamsBuilder`] validates each option as it is applied and accumulates
//! every failure, so a caller sees the complete list of problems in one error.
//! Catalog variables come from two sources: explicit options first, then the
//! metadata returned by a provider's [`PostAuthInfo`] call, which only fills
//! gaps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::HttpClient;
use tracing::debug;

use crate::substitution::CatalogVariables;
use crate::substitution::MODULE_KEY;
use crate::substitution::SubstitutionRegistry;
use crate::substitution::WORKSPACE_KEY;

// ============================================================================
// SECTION: Provider Info
// ============================================================================

/// Static description of a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderInfo {
    /// Provider name.
    pub name: String,
    /// Base URL template, possibly containing catalog placeholders.
    pub base_url: String,
    /// True when the provider cannot be reached without a workspace.
    pub requires_workspace: bool,
    /// Metadata keys that must be supplied before construction.
    pub required_metadata: Vec<String>,
}

impl ProviderInfo {
    /// Creates provider info with no requirements.
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

// ============================================================================
// SECTION: Post-Auth Info
// ============================================================================

/// Provider hook returning catalog metadata discovered after authentication.
pub trait PostAuthInfo: Send + Sync {
    /// Fetches metadata such as the account-specific server base.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when the provider lookup fails.
    fn post_auth_info(&self, ctx: &Context) -> Result<BTreeMap<String, String>, ConnectorError>;
}

// ============================================================================
// SECTION: Connector Params
// ============================================================================

/// Validated adapter construction parameters.
#[derive(Clone, Default)]
pub struct ConnectorParams {
    /// Provider description.
    pub provider: ProviderInfo,
    /// Customer workspace.
    pub workspace: Option<String>,
    /// API module.
    pub module: Option<String>,
    /// Extra catalog metadata.
    pub metadata: BTreeMap<String, String>,
    /// Authenticated transport.
    pub client: Option<Arc<dyn HttpClient>>,
}

impl fmt::Debug for ConnectorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorParams")
            .field("provider", &self.provider)
            .field("workspace", &self.workspace)
            .field("module", &self.module)
            .field("metadata", &self.metadata)
            .field("client", &self.client.is_some())
            .finish()
    }
}

impl ConnectorParams {
    /// Returns the typed catalog variables.
    #[must_use]
    pub fn variables(&self) -> CatalogVariables {
        CatalogVariables {
            workspace: self.workspace.clone(),
            server: self.metadata.get(crate::substitution::SERVER_KEY).cloned(),
            module: self.module.clone(),
        }
    }

    /// Builds the substitution registry for this adapter.
    ///
    /// Metadata entries are exposed under their own names; explicit workspace
    /// and module values override metadata of the same name.
    #[must_use]
    pub fn substitutions(&self) -> SubstitutionRegistry {
        let mut registry = SubstitutionRegistry::new();
        for (name, value) in &self.metadata {
            registry.insert(name.clone(), value.clone());
        }
        if let Some(workspace) = &self.workspace {
            registry.insert(WORKSPACE_KEY, workspace.clone());
        }
        if let Some(module) = &self.module {
            registry.insert(MODULE_KEY, module.clone());
        }
        registry
    }

    /// Merges post-auth metadata beneath the explicit options.
    ///
    /// # Errors
    ///
    /// Returns the provider's error when the lookup fails.
    pub fn apply_post_auth(
        &mut self,
        ctx: &Context,
        source: &dyn PostAuthInfo,
    ) -> Result<(), ConnectorError> {
        ctx.check()?;
        let discovered = source.post_auth_info(ctx)?;
        for (name, value) in discovered {
            match name.as_str() {
                WORKSPACE_KEY if self.workspace.is_none() => self.workspace = Some(value),
                MODULE_KEY if self.module.is_none() => self.module = Some(value),
                WORKSPACE_KEY | MODULE_KEY => {}
                _ => {
                    if !self.metadata.contains_key(&name) {
                        debug!(
                            provider = %self.provider.name,
                            key = %name,
                            "post-auth metadata applied"
                        );
                        self.metadata.insert(name, value);
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Accumulating option builder for [`ConnectorParams`].
pub struct ParamsBuilder {
    /// Parameters under construction.
    params: ConnectorParams,
    /// Every option failure seen so far.
    errors: Vec<String>,
}

impl ParamsBuilder {
    /// Starts a builder for a provider.
    #[must_use]
    pub fn new(provider: ProviderInfo) -> Self {
        Self {
            params: ConnectorParams {
                provider,
                ..ConnectorParams::default()
            },
            errors: Vec::new(),
        }
    }

    /// Sets the workspace.
    #[must_use]
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        let workspace = workspace.into();
        if workspace.trim().is_empty() {
            self.errors.push("workspace must not be empty".to_string());
        } else if workspace.contains(['/', ' ', '?', '#']) {
            self.errors.push(format!("workspace '{workspace}' contains URL delimiters"));
        } else {
            self.params.workspace = Some(workspace);
        }
        self
    }

    /// Sets the API module.
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        let module = module.into();
        if module.trim().is_empty() {
            self.errors.push("module must not be empty".to_string());
        } else {
            self.params.module = Some(module);
        }
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if key.trim().is_empty() {
            self.errors.push("metadata key must not be empty".to_string());
        } else {
            self.params.metadata.insert(key, value.into());
        }
        self
    }

    /// Adds every entry of a metadata map.
    #[must_use]
    pub fn with_metadata_map(self, metadata: &BTreeMap<String, String>) -> Self {
        metadata.iter().fold(self, |builder, (key, value)| builder.with_metadata(key, value))
    }

    /// Applies typed catalog variables.
    #[must_use]
    pub fn with_variables(mut self, variables: &CatalogVariables) -> Self {
        if let Some(workspace) = &variables.workspace {
            self = self.with_workspace(workspace);
        }
        if let Some(module) = &variables.module {
            self = self.with_module(module);
        }
        if let Some(server) = &variables.server {
            self = self.with_metadata(crate::substitution::SERVER_KEY, server);
        }
        self
    }

    /// Sets the authenticated transport.
    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.params.client = Some(client);
        self
    }

    /// Validates provider requirements and returns the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidParameter`] listing every failure.
    pub fn build(mut self) -> Result<ConnectorParams, ConnectorError> {
        if self.params.provider.requires_workspace && self.params.workspace.is_none() {
            let provider = &self.params.provider.name;
            self.errors.push(format!("provider {provider} requires a workspace"));
        }
        for key in &self.params.provider.required_metadata {
            if !self.params.metadata.contains_key(key) {
                self.errors.push(format!(
                    "provider {} requires metadata {key}",
                    self.params.provider.name
                ));
            }
        }
        if self.errors.is_empty() {
            Ok(self.params)
        } else {
            Err(ConnectorError::InvalidParameter(self.errors.join("; ")))
        }
    }
}
