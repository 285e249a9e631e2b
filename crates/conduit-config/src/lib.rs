// crates/conduit-config/src/lib.rs
// ============================================================================
// Module: Conduit Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for conduit.toml semantics.
// Dependencies: conduit-core, conduit-runtime, conduit-deepmock, serde, toml
// ============================================================================

//! ## Overview
//! `conduit-config` defines the TOML configuration model for hosts that embed
//! Conduit adapters. Loading is strict and fail-closed: oversized, non-UTF-8,
//! or out-of-range input is rejected before any runtime type is built.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
