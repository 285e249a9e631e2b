// crates/conduit-deepmock/src/validator.rs
// ============================================================================
// Module: Record Validator
// Description: Draft 2020-12 validation of records against compiled schemas.
// Purpose: Report every schema violation of a record in one error.
// Dependencies: conduit-core, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! Schemas are compiled once when the registry is built. Validation collects
//! every violation the validator reports and returns them together so callers
//! can fix a payload in one round trip.

// ============================================================================
// SECTION: Imports
// ============================================================================

use conduit_core::ConnectorError;
use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Compiled validator for one object schema.
pub struct RecordValidator {
    /// Compiled Draft 2020-12 validator.
    validator: Validator,
}

impl RecordValidator {
    /// Compiles a raw schema document.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] when the document does not
    /// compile.
    pub fn compile(object_name: &str, schema: &Value) -> Result<Self, ConnectorError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(schema)
            .map_err(|err| {
                ConnectorError::InvalidSchema(format!(
                    "schema for {object_name} does not compile: {err}"
                ))
            })?;
        Ok(Self {
            validator,
        })
    }

    /// Returns true when `record` satisfies the schema.
    #[must_use]
    pub fn is_valid(&self, record: &Value) -> bool {
        self.validator.is_valid(record)
    }

    /// Validates `record` against the schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::ValidationFailed`] carrying every violation.
    pub fn validate(&self, record: &Value) -> Result<(), ConnectorError> {
        let violations: Vec<String> =
            self.validator.iter_errors(record).map(|err| err.to_string()).collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConnectorError::ValidationFailed {
                violations,
            })
        }
    }
}
