// crates/conduit-core/src/core/hashing.rs
// ============================================================================
// Module: Conduit Structural Hashing
// Description: Streaming hash builder for primitives, optionals, and nesting.
// Purpose: Provide order-independent identity digests for recursive schemas.
// Dependencies: bigdecimal, serde, sha2, thiserror
// ============================================================================

//! ## Overview
//! [`HashBuilder`] feeds typed field contributions into SHA-256. Two values
//! with identical semantic content always produce identical digests: callers
//! sort unordered map keys before hashing and emit struct fields in a fixed
//! declaration order.
//!
//! Encoding rules:
//! - A single `0x00` separator precedes every contribution except the first.
//! - Optionals carry a one-byte presence tag (`0x00` absent, `0x01` present).
//! - Optional booleans use two bytes so absent, false, and true are distinct.
//! - Integers and float bit patterns are big-endian.
//! - Rationals are hashed as their canonical (normalized) decimal string.
//! - Write errors accumulate and surface from [`HashBuilder::finish`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for schema identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing.
    Sha256,
}

/// Default hash algorithm for schema identity.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Deterministic content hash representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building a structural hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    /// One or more field contributions could not be written.
    #[error("hash write failed: {0}")]
    Write(String),
}

// ============================================================================
// SECTION: Hashable
// ============================================================================

/// Values that can stream their identity into a [`HashBuilder`].
pub trait Hashable {
    /// Emits this value's fields into the builder in a fixed order.
    fn update_hash(&self, hasher: &mut HashBuilder);
}

impl Hashable for Value {
    fn update_hash(&self, hasher: &mut HashBuilder) {
        match self {
            Self::Null => hasher.nil(),
            Self::Bool(flag) => {
                hasher.string("bool");
                hasher.bool(*flag);
            }
            Self::Number(number) => {
                hasher.string("number");
                hasher.rat_str(&number.to_string());
            }
            Self::String(text) => {
                hasher.string("string");
                hasher.string(text);
            }
            Self::Array(items) => {
                hasher.string("array");
                hasher.int64(len_i64(items.len()));
                for (index, item) in items.iter().enumerate() {
                    hasher.int64(len_i64(index));
                    hasher.hashable(item);
                }
            }
            Self::Object(map) => {
                hasher.string("object");
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                hasher.int64(len_i64(keys.len()));
                for key in keys {
                    hasher.string(key);
                    if let Some(value) = map.get(key) {
                        hasher.hashable(value);
                    }
                }
            }
        }
    }
}

impl<T: Hashable> Hashable for Box<T> {
    fn update_hash(&self, hasher: &mut HashBuilder) {
        (**self).update_hash(hasher);
    }
}

/// Converts a collection length or index into the hashed integer form.
pub fn len_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ============================================================================
// SECTION: Hash Builder
// ============================================================================

/// Streaming structural hash accumulator.
///
/// # Invariants
/// - Contributions are separated by exactly one `0x00` byte.
/// - Accumulated errors are reported together by [`HashBuilder::finish`].
pub struct HashBuilder {
    /// Underlying digest state.
    hasher: Sha256,
    /// True once the first contribution has been written.
    started: bool,
    /// Accumulated write errors.
    errors: Vec<String>,
}

impl Default for HashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HashBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            started: false,
            errors: Vec::new(),
        }
    }

    /// Writes the separator before every contribution but the first.
    fn begin(&mut self) {
        if self.started {
            self.hasher.update([0u8]);
        }
        self.started = true;
    }

    /// Hashes a string value.
    pub fn string(&mut self, value: &str) {
        self.begin();
        self.hasher.update(value.as_bytes());
    }

    /// Hashes an optional string value with a presence tag.
    pub fn string_opt(&mut self, value: Option<&str>) {
        self.begin();
        match value {
            None => self.hasher.update([0u8]),
            Some(value) => {
                self.hasher.update([1u8]);
                self.hasher.update(value.as_bytes());
            }
        }
    }

    /// Hashes a boolean value.
    pub fn bool(&mut self, value: bool) {
        self.begin();
        self.hasher.update([u8::from(value)]);
    }

    /// Hashes an optional boolean with a distinct encoding per state.
    pub fn bool_opt(&mut self, value: Option<bool>) {
        self.begin();
        let bytes = match value {
            None => [0u8, 0u8],
            Some(false) => [1u8, 0u8],
            Some(true) => [1u8, 1u8],
        };
        self.hasher.update(bytes);
    }

    /// Hashes a signed integer in big-endian form.
    pub fn int64(&mut self, value: i64) {
        self.begin();
        self.hasher.update(value.to_be_bytes());
    }

    /// Hashes a float using its IEEE-754 bit pattern.
    pub fn float64(&mut self, value: f64) {
        self.begin();
        self.hasher.update(value.to_bits().to_be_bytes());
    }

    /// Hashes an optional float with a presence tag.
    pub fn float64_opt(&mut self, value: Option<f64>) {
        self.begin();
        match value {
            None => self.hasher.update([0u8]),
            Some(value) => {
                self.hasher.update([1u8]);
                self.hasher.update(value.to_bits().to_be_bytes());
            }
        }
    }

    /// Hashes the absent tag.
    pub fn nil(&mut self) {
        self.begin();
        self.hasher.update([0u8]);
    }

    /// Hashes the present tag.
    pub fn non_nil(&mut self) {
        self.begin();
        self.hasher.update([1u8]);
    }

    /// Hashes a rational as its canonical decimal string.
    pub fn rat(&mut self, value: &BigDecimal) {
        self.begin();
        self.hasher.update(value.normalized().to_string().as_bytes());
    }

    /// Parses and hashes a decimal literal; parse failures are accumulated.
    pub fn rat_str(&mut self, literal: &str) {
        match BigDecimal::from_str(literal) {
            Ok(value) => self.rat(&value),
            Err(err) => {
                self.begin();
                self.errors.push(format!("invalid rational '{literal}': {err}"));
            }
        }
    }

    /// Hashes a nested value through its own builder.
    pub fn hashable<T: Hashable + ?Sized>(&mut self, value: &T) {
        let mut nested = Self::new();
        value.update_hash(&mut nested);
        self.errors.append(&mut nested.errors);
        let digest = nested.hasher.finalize();
        self.begin();
        self.hasher.update(digest);
    }

    /// Returns the accumulated errors joined, if any.
    #[must_use]
    pub fn error(&self) -> Option<HashError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(HashError::Write(self.errors.join("; ")))
        }
    }

    /// Finalizes the builder into a digest.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Write`] when any contribution failed.
    pub fn finish(self) -> Result<HashDigest, HashError> {
        if let Some(err) = self.error() {
            return Err(err);
        }
        let digest = self.hasher.finalize();
        Ok(HashDigest::new(DEFAULT_HASH_ALGORITHM, &digest))
    }
}

/// Hashes a value with a fresh builder.
///
/// # Errors
///
/// Returns [`HashError::Write`] when any contribution failed.
pub fn hash_value<T: Hashable + ?Sized>(value: &T) -> Result<HashDigest, HashError> {
    let mut builder = HashBuilder::new();
    value.update_hash(&mut builder);
    builder.finish()
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
