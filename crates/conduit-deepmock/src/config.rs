// crates/conduit-deepmock/src/config.rs
// ============================================================================
// Module: Deep Mock Configuration
// Description: Tunables for paging, generation, and schema files.
// Purpose: Carry validated deep-mock settings into the connector.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Defaults match the documented behavior: pages of 100 rows, 100 generation
//! attempts, and a nesting limit of 5.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default rows per read page.
pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Default attempts before random generation gives up.
pub const DEFAULT_MAX_RETRIES: u32 = 100;
/// Default nesting limit for generated objects and arrays.
pub const DEFAULT_MAX_DEPTH: usize = 5;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Deep-mock connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepMockConfig {
    /// Rows per read page when the caller does not choose one.
    pub page_size: usize,
    /// Attempts per random record before failing.
    pub max_retries: u32,
    /// Nesting depth at which generation emits placeholders.
    pub max_depth: usize,
    /// Seed for reproducible generation; entropy when absent.
    pub seed: Option<u64>,
    /// Raw schema file per object name.
    pub schema_paths: BTreeMap<String, PathBuf>,
}

impl Default for DeepMockConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            max_depth: DEFAULT_MAX_DEPTH,
            seed: None,
            schema_paths: BTreeMap::new(),
        }
    }
}
