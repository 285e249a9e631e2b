// crates/conduit-core/src/core/mod.rs
// ============================================================================
// Module: Conduit Core Types
// Description: Canonical data-plane, schema, and error structures.
// Purpose: Provide stable, serializable types shared by adapters and the mock.
// Dependencies: serde, serde_json, sha2, time, bigdecimal
// ============================================================================

//! ## Overview
//! Core types define transport parameters and results, object metadata, the
//! JSON-Schema input model with its identity hash, and the error taxonomy.
//! These types are the canonical source of truth for every adapter.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod context;
pub mod error;
pub mod fields;
pub mod hashing;
pub mod metadata;
pub mod params;
pub mod schema;
pub mod timestamps;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::Context;
pub use error::ConnectorError;
pub use error::ErrorCategory;
pub use error::ErrorKind;
pub use fields::coerce_id;
pub use fields::lowercase_keys;
pub use fields::select_fields;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashBuilder;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::Hashable;
pub use hashing::hash_value;
pub use metadata::FieldMetadata;
pub use metadata::FieldValue;
pub use metadata::ListObjectMetadataResult;
pub use metadata::ObjectMetadata;
pub use metadata::ValueType;
pub use params::DeleteParams;
pub use params::DeleteResult;
pub use params::NextPage;
pub use params::ReadParams;
pub use params::ReadResult;
pub use params::ReadResultRow;
pub use params::Record;
pub use params::WriteParams;
pub use params::WriteResult;
pub use schema::ExclusiveBound;
pub use schema::InputSchema;
pub use schema::SchemaNode;
pub use schema::SchemaType;
pub use schema::SpecialFields;
pub use timestamps::Timestamp;
pub use timestamps::monotonic_nanos;
