// crates/conduit-config/src/config.rs
// ============================================================================
// Module: Conduit Configuration
// Description: Configuration loading and validation for Conduit hosts.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: conduit-core, conduit-runtime, conduit-deepmock, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Each section converts into the runtime type it configures: `[http]` into
//! [`HttpClientConfig`], `[catalog]` into catalog substitution variables,
//! `[deep_mock]` into [`DeepMockConfig`], and `[support]` into an
//! [`EndpointRegistry`].
//! Missing or invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use conduit_core::ConnectorError;
use conduit_deepmock::DeepMockConfig;
use conduit_runtime::CatalogVariables;
use conduit_runtime::EndpointRegistry;
use conduit_runtime::EndpointSupport;
use conduit_runtime::HttpClientConfig;
use conduit_runtime::SubstitutionRegistry;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "conduit.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CONDUIT_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum HTTP request timeout in milliseconds.
pub const MIN_HTTP_TIMEOUT_MS: u64 = 100;
/// Maximum HTTP request timeout in milliseconds.
pub const MAX_HTTP_TIMEOUT_MS: u64 = 120_000;
/// Maximum allowed HTTP response size in bytes.
pub const MAX_HTTP_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Maximum number of default HTTP headers.
pub(crate) const MAX_DEFAULT_HEADERS: usize = 64;
/// Maximum nesting limit accepted for deep-mock generation.
pub const MAX_DEEP_MOCK_DEPTH: usize = 32;
/// Maximum number of catalog variables.
pub(crate) const MAX_CATALOG_VARIABLES: usize = 256;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level Conduit configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConduitConfig {
    /// Outbound HTTP client settings.
    #[serde(default)]
    pub http: HttpClientConfig,
    /// Catalog variables used when rendering provider URL templates.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Deep-mock connector settings.
    #[serde(default)]
    pub deep_mock: DeepMockConfig,
    /// Endpoint support rows keyed by module id.
    #[serde(default)]
    pub support: BTreeMap<String, Vec<EndpointSupport>>,
}

impl ConduitConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path argument wins over `CONDUIT_CONFIG`, which wins over
    /// `conduit.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http(&self.http)?;
        self.catalog.validate()?;
        validate_deep_mock(&self.deep_mock)?;
        validate_support(&self.support)?;
        Ok(())
    }

    /// Returns the HTTP client configuration.
    #[must_use]
    pub fn http_client_config(&self) -> HttpClientConfig {
        self.http.clone()
    }

    /// Returns the deep-mock connector configuration.
    #[must_use]
    pub fn deep_mock_config(&self) -> DeepMockConfig {
        self.deep_mock.clone()
    }

    /// Builds the endpoint support registry from the `[support]` table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a support row cannot be resolved.
    pub fn endpoint_registry(&self) -> Result<EndpointRegistry, ConfigError> {
        EndpointRegistry::new(&self.support).map_err(invalid_support)
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Catalog variables for URL template rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Customer workspace or subdomain.
    pub workspace: Option<String>,
    /// API server base.
    pub server: Option<String>,
    /// API module.
    pub module: Option<String>,
    /// Additional provider metadata placeholders.
    pub metadata: BTreeMap<String, String>,
}

impl CatalogConfig {
    /// Returns the well-known variables.
    #[must_use]
    pub fn variables(&self) -> CatalogVariables {
        CatalogVariables {
            workspace: self.workspace.clone(),
            server: self.server.clone(),
            module: self.module.clone(),
        }
    }

    /// Builds the substitution registry for template rendering.
    ///
    /// Well-known variables take precedence over metadata entries with the
    /// same placeholder name.
    #[must_use]
    pub fn substitution_registry(&self) -> SubstitutionRegistry {
        let mut registry = SubstitutionRegistry::from_variables(&self.variables());
        for (name, value) in &self.metadata {
            registry.insert_if_absent(name.clone(), value.clone());
        }
        registry
    }

    /// Validates catalog values.
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("catalog.workspace", &self.workspace),
            ("catalog.server", &self.server),
            ("catalog.module", &self.module),
        ] {
            if let Some(value) = value
                && value.trim().is_empty()
            {
                return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
            }
        }
        if self.metadata.len() > MAX_CATALOG_VARIABLES {
            return Err(ConfigError::Invalid("catalog.metadata has too many entries".to_string()));
        }
        for name in self.metadata.keys() {
            let trimmed = name.trim();
            if trimmed.is_empty() || trimmed != name {
                return Err(ConfigError::Invalid(format!(
                    "catalog.metadata key '{name}' must be non-empty and untrimmed"
                )));
            }
            if name.contains(['{', '}']) {
                return Err(ConfigError::Invalid(format!(
                    "catalog.metadata key '{name}' must not contain braces"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Section Validation
// ============================================================================

/// Validates the `[http]` section.
fn validate_http(http: &HttpClientConfig) -> Result<(), ConfigError> {
    if !(MIN_HTTP_TIMEOUT_MS ..= MAX_HTTP_TIMEOUT_MS).contains(&http.timeout_ms) {
        return Err(ConfigError::Invalid(format!(
            "http.timeout_ms must be between {MIN_HTTP_TIMEOUT_MS} and {MAX_HTTP_TIMEOUT_MS}"
        )));
    }
    if http.max_response_bytes == 0 || http.max_response_bytes > MAX_HTTP_RESPONSE_BYTES {
        return Err(ConfigError::Invalid(format!(
            "http.max_response_bytes must be between 1 and {MAX_HTTP_RESPONSE_BYTES}"
        )));
    }
    if http.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("http.user_agent must be non-empty".to_string()));
    }
    if http.default_headers.len() > MAX_DEFAULT_HEADERS {
        return Err(ConfigError::Invalid("http.default_headers has too many entries".to_string()));
    }
    for (name, value) in &http.default_headers {
        if name.is_empty() || !name.bytes().all(is_header_name_byte) {
            return Err(ConfigError::Invalid(format!(
                "http.default_headers name '{name}' is not a valid header name"
            )));
        }
        if value.contains(['\r', '\n']) {
            return Err(ConfigError::Invalid(format!(
                "http.default_headers value for '{name}' must not contain line breaks"
            )));
        }
    }
    Ok(())
}

/// Validates the `[deep_mock]` section.
fn validate_deep_mock(deep_mock: &DeepMockConfig) -> Result<(), ConfigError> {
    if deep_mock.page_size == 0 {
        return Err(ConfigError::Invalid(
            "deep_mock.page_size must be greater than zero".to_string(),
        ));
    }
    if deep_mock.max_retries == 0 {
        return Err(ConfigError::Invalid(
            "deep_mock.max_retries must be greater than zero".to_string(),
        ));
    }
    if !(1 ..= MAX_DEEP_MOCK_DEPTH).contains(&deep_mock.max_depth) {
        return Err(ConfigError::Invalid(format!(
            "deep_mock.max_depth must be between 1 and {MAX_DEEP_MOCK_DEPTH}"
        )));
    }
    for (object, path) in &deep_mock.schema_paths {
        if object.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "deep_mock.schema_paths keys must be non-empty".to_string(),
            ));
        }
        let field = format!("deep_mock.schema_paths.{object}");
        validate_path_string(&field, &path.to_string_lossy())?;
    }
    Ok(())
}

/// Validates the `[support]` table by resolving it.
fn validate_support(support: &BTreeMap<String, Vec<EndpointSupport>>) -> Result<(), ConfigError> {
    for (module, rows) in support {
        if module.trim().is_empty() {
            return Err(ConfigError::Invalid("support module ids must be non-empty".to_string()));
        }
        if rows.iter().any(|row| row.endpoint.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("support.{module} has an empty endpoint")));
        }
    }
    EndpointRegistry::new(support).map(|_| ()).map_err(invalid_support)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Returns true for bytes allowed in an HTTP header name token.
const fn is_header_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

/// Maps a support resolution failure into a config error.
fn invalid_support(err: ConnectorError) -> ConfigError {
    ConfigError::Invalid(format!("support table rejected: {err}"))
}
