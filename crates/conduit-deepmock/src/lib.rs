// crates/conduit-deepmock/src/lib.rs
// ============================================================================
// Module: Conduit Deep Mock
// Description: In-memory, schema-validated connector with random data.
// Purpose: Stand in for a provider in tests and local development.
// Dependencies: conduit-core, jsonschema, rand, rand_regex, regex, uuid, tracing
// ============================================================================

//! ## Overview
//! The deep mock keeps records in memory, validates every write against a
//! JSON Schema Draft 2020-12 document, and generates random conforming
//! records on demand. Committed changes fan out to registered observers.
//! Invariants:
//! - Stored records never alias caller-held values.
//! - Every stored record validated against its object's schema.
//! - Generated records validate, or generation fails after its retry limit.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod connector;
pub mod generator;
pub mod registry;
pub mod storage;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::DeepMockConfig;
pub use connector::DeepMockConnector;
pub use connector::PROVIDER_NAME;
pub use generator::RecordGenerator;
pub use generator::generate_id;
pub use generator::generate_timestamp;
pub use registry::DerivedSchema;
pub use registry::MAX_SCHEMA_FILE_BYTES;
pub use registry::SchemaEntry;
pub use registry::SchemaRegistry;
pub use registry::SchemaSources;
pub use storage::ChangeEvent;
pub use storage::Observer;
pub use storage::ObserverHandle;
pub use storage::Storage;
pub use storage::StoreAction;
pub use validator::RecordValidator;
