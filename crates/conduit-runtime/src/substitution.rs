// crates/conduit-runtime/src/substitution.rs
// ============================================================================
// Module: Catalog Substitution
// Description: Placeholder templates and the catalog variable registry.
// Purpose: Rewrite `{{name}}` tokens in provider URLs before requests are built.
// Dependencies: serde, tracing
// ============================================================================

//! ## Overview
//! Provider catalogs carry URL templates such as
//! `https://{{workspace}}.example.com/api`. A [`Template`] is tokenized once
//! into literal and placeholder segments and then rendered per request against
//! a [`SubstitutionRegistry`]. Placeholders missing from the registry are left
//! untouched and logged once per template.
//! Invariants:
//! - Registries are read-only once handed to an adapter.
//! - Rendering never fails; unknown placeholders survive verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

// ============================================================================
// SECTION: Well-Known Keys
// ============================================================================

/// Catalog variable naming the customer workspace or subdomain.
pub const WORKSPACE_KEY: &str = "workspace";
/// Catalog variable naming the API server base.
pub const SERVER_KEY: &str = "server";
/// Catalog variable naming the API module.
pub const MODULE_KEY: &str = "module";

// ============================================================================
// SECTION: Plans and Registry
// ============================================================================

/// A single `from -> to` replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionPlan {
    /// Placeholder name, without braces.
    pub from: String,
    /// Replacement text.
    pub to: String,
}

/// Placeholder name to replacement value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRegistry {
    /// Replacement values keyed by placeholder name.
    values: BTreeMap<String, String>,
}

impl SubstitutionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Builds a registry from plans; later plans win.
    #[must_use]
    pub fn from_plans<I: IntoIterator<Item = SubstitutionPlan>>(plans: I) -> Self {
        let mut registry = Self::new();
        for plan in plans {
            registry.insert(plan.from, plan.to);
        }
        registry
    }

    /// Sets a replacement value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Sets a replacement value only when none exists yet.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_insert_with(|| value.into());
    }

    /// Builder-style variant of [`SubstitutionRegistry::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the replacement for a placeholder.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns every replacement as a plan, ordered by name.
    #[must_use]
    pub fn plans(&self) -> Vec<SubstitutionPlan> {
        self.values
            .iter()
            .map(|(from, to)| SubstitutionPlan {
                from: from.clone(),
                to: to.clone(),
            })
            .collect()
    }

    /// Returns the number of replacements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when no replacements are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renders a one-off template string.
    #[must_use]
    pub fn apply(&self, template: &str) -> String {
        Template::parse(template).render(self)
    }

    /// Projects the registry onto the well-known catalog variables.
    ///
    /// Keys other than `workspace`, `server`, and `module` are dropped and
    /// logged at info level.
    #[must_use]
    pub fn to_variables(&self) -> CatalogVariables {
        let mut variables = CatalogVariables::default();
        for (name, value) in &self.values {
            match name.as_str() {
                WORKSPACE_KEY => variables.workspace = Some(value.clone()),
                SERVER_KEY => variables.server = Some(value.clone()),
                MODULE_KEY => variables.module = Some(value.clone()),
                _ => info!(placeholder = %name, "dropping unknown catalog variable"),
            }
        }
        variables
    }

    /// Builds a registry from the well-known catalog variables.
    #[must_use]
    pub fn from_variables(variables: &CatalogVariables) -> Self {
        let mut registry = Self::new();
        if let Some(workspace) = &variables.workspace {
            registry.insert(WORKSPACE_KEY, workspace.clone());
        }
        if let Some(server) = &variables.server {
            registry.insert(SERVER_KEY, server.clone());
        }
        if let Some(module) = &variables.module {
            registry.insert(MODULE_KEY, module.clone());
        }
        registry
    }
}

/// Typed view of the well-known catalog variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVariables {
    /// Customer workspace or subdomain.
    #[serde(default)]
    pub workspace: Option<String>,
    /// API server base.
    #[serde(default)]
    pub server: Option<String>,
    /// API module.
    #[serde(default)]
    pub module: Option<String>,
}

// ============================================================================
// SECTION: Templates
// ============================================================================

/// Segment of a tokenized template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Text copied verbatim.
    Literal(String),
    /// Placeholder with its trimmed name and original spelling.
    Placeholder {
        /// Placeholder name.
        name: String,
        /// Original text including braces.
        raw: String,
    },
}

/// Pre-tokenized URL template.
#[derive(Debug)]
pub struct Template {
    /// Original template text.
    source: String,
    /// Literal and placeholder segments in order.
    tokens: Vec<Token>,
    /// Set once an unknown placeholder has been logged.
    reported: AtomicBool,
}

impl Clone for Template {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            tokens: self.tokens.clone(),
            reported: AtomicBool::new(self.reported.load(Ordering::Relaxed)),
        }
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Template {
    /// Tokenizes a template. Unterminated or empty braces stay literal.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = source;
        while let Some(start) = rest.find("{{") {
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                break;
            };
            let name = after_open[..end].trim();
            let raw_len = start + 2 + end + 2;
            if name.is_empty() || name.contains("{{") {
                literal.push_str(&rest[..start + 2]);
                rest = &rest[start + 2..];
                continue;
            }
            literal.push_str(&rest[..start]);
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::Placeholder {
                name: name.to_string(),
                raw: rest[start..raw_len].to_string(),
            });
            rest = &rest[raw_len..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }
        Self {
            source: source.to_string(),
            tokens,
            reported: AtomicBool::new(false),
        }
    }

    /// Returns the original template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Placeholder {
                name, ..
            } => Some(name.as_str()),
            Token::Literal(_) => None,
        })
    }

    /// Renders the template against a registry.
    #[must_use]
    pub fn render(&self, registry: &SubstitutionRegistry) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut unknown: Vec<&str> = Vec::new();
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Placeholder {
                    name,
                    raw,
                } => match registry.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        unknown.push(name);
                        out.push_str(raw);
                    }
                },
            }
        }
        if !unknown.is_empty() && !self.reported.swap(true, Ordering::Relaxed) {
            info!(
                template = %self.source,
                placeholders = %unknown.join(","),
                "catalog template has unresolved placeholders"
            );
        }
        out
    }
}
