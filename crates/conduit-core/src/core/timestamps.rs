// crates/conduit-core/src/core/timestamps.rs
// ============================================================================
// Module: Conduit Timestamps
// Description: Timestamp parsing, formatting, and monotonic clock helpers.
// Purpose: Interpret updated-field values and generate mutation timestamps.
// Dependencies: bigdecimal, serde_json, time
// ============================================================================

//! ## Overview
//! Updated-field values arrive as RFC3339 strings, integer seconds, float
//! seconds, or arbitrary-precision decimal strings. [`Timestamp`] normalizes
//! every form to nanoseconds since the Unix epoch so that range filters compare
//! exactly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use ::time::OffsetDateTime;
use ::time::format_description::well_known::Rfc3339;
use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use serde_json::Number;
use serde_json::Value;

use crate::core::error::ConnectorError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Nanoseconds per second.
const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Longest decimal text accepted as a seconds value.
const MAX_DECIMAL_TEXT_LEN: usize = 64;

/// Largest decimal exponent that still fits `i64` seconds.
const MAX_DECIMAL_EXPONENT: i64 = 19;

/// Most fractional digits kept before truncation to nanoseconds.
const MAX_DECIMAL_FRACTION_DIGITS: i64 = 64;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Instant with nanosecond precision relative to the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Nanoseconds since the Unix epoch.
    nanos: i128,
}

impl Timestamp {
    /// Creates a timestamp from nanoseconds since the epoch.
    #[must_use]
    pub const fn from_unix_nanos(nanos: i128) -> Self {
        Self {
            nanos,
        }
    }

    /// Creates a timestamp from whole seconds since the epoch.
    #[must_use]
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Self {
            nanos: i128::from(seconds) * NANOS_PER_SECOND,
        }
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::from(OffsetDateTime::now_utc())
    }

    /// Returns nanoseconds since the epoch.
    #[must_use]
    pub const fn unix_nanos(self) -> i128 {
        self.nanos
    }

    /// Returns whole seconds since the epoch, rounded toward negative infinity.
    #[must_use]
    pub fn unix_seconds(self) -> i64 {
        i64::try_from(self.nanos.div_euclid(NANOS_PER_SECOND)).unwrap_or(i64::MAX)
    }

    /// Formats the timestamp as RFC3339.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Serialization`] when the instant is outside
    /// the representable calendar range.
    pub fn to_rfc3339(self) -> Result<String, ConnectorError> {
        let datetime = OffsetDateTime::from_unix_timestamp_nanos(self.nanos)
            .map_err(|err| ConnectorError::Serialization(err.to_string()))?;
        datetime.format(&Rfc3339).map_err(|err| ConnectorError::Serialization(err.to_string()))
    }

    /// Parses an RFC3339 string or a decimal number of seconds.
    #[must_use]
    pub fn parse_str(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if let Ok(datetime) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            return Some(Self::from(datetime));
        }
        Self::parse_decimal_text(trimmed)
    }

    /// Parses a JSON number of seconds.
    #[must_use]
    pub fn parse_number(number: &Number) -> Option<Self> {
        if let Some(seconds) = number.as_i64() {
            return Some(Self::from_unix_seconds(seconds));
        }
        Self::parse_decimal_text(&number.to_string())
    }

    /// Parses any supported timestamp encoding out of a JSON value.
    #[must_use]
    pub fn parse_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Self::parse_str(text),
            Value::Number(number) => Self::parse_number(number),
            _ => None,
        }
    }

    /// Parses decimal seconds, rejecting text whose magnitude or precision
    /// cannot map onto the nanosecond range.
    fn parse_decimal_text(text: &str) -> Option<Self> {
        if text.len() > MAX_DECIMAL_TEXT_LEN {
            return None;
        }
        let seconds = BigDecimal::from_str(text).ok()?;
        let (_, scale) = seconds.as_bigint_and_exponent();
        if !(-MAX_DECIMAL_EXPONENT..=MAX_DECIMAL_FRACTION_DIGITS).contains(&scale) {
            return None;
        }
        Self::from_decimal_seconds(&seconds)
    }

    /// Converts fractional seconds to a timestamp, truncating sub-nanosecond digits.
    fn from_decimal_seconds(seconds: &BigDecimal) -> Option<Self> {
        let nanos = (seconds.clone() * BigDecimal::from(1_000_000_000_i64)).with_scale(0);
        nanos.to_i128().map(Self::from_unix_nanos)
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self::from_unix_nanos(value.unix_timestamp_nanos())
    }
}

// ============================================================================
// SECTION: Monotonic Clock
// ============================================================================

/// Last value handed out by [`monotonic_nanos`].
static LAST_MONOTONIC: AtomicI64 = AtomicI64::new(0);

/// Returns a strictly increasing nanosecond reading derived from the wall clock.
///
/// Two calls in the same nanosecond still yield distinct values.
#[must_use]
pub fn monotonic_nanos() -> i64 {
    let wall = i64::try_from(Timestamp::now().unix_nanos()).unwrap_or(i64::MAX);
    let mut last = LAST_MONOTONIC.load(Ordering::Relaxed);
    loop {
        let next = wall.max(last.saturating_add(1));
        match LAST_MONOTONIC.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(observed) => last = observed,
        }
    }
}
