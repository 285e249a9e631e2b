// crates/conduit-core/tests/params.rs
// ============================================================================
// Module: Data-Plane Parameter Tests
// Description: Tests for parameter validation, field selection, and timestamps.
// ============================================================================
//! ## Overview
//! Validates fail-closed parameter checks and the helpers adapters use to
//! build read rows.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;
use std::time::Duration;

use conduit_core::Context;
use conduit_core::DeleteParams;
use conduit_core::ErrorCategory;
use conduit_core::ErrorKind;
use conduit_core::NextPage;
use conduit_core::ReadParams;
use conduit_core::ReadResult;
use conduit_core::Record;
use conduit_core::Timestamp;
use conduit_core::WriteParams;
use conduit_core::coerce_id;
use conduit_core::select_fields;
use serde_json::json;

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap()
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Tests read parameter validation in lenient and strict modes.
#[test]
fn read_params_validation() {
    assert!(ReadParams::new("").validate(false).unwrap_err().is(ErrorKind::MissingObjects));
    assert!(ReadParams::new("contacts").validate(false).is_ok());
    assert!(ReadParams::new("contacts").validate(true).unwrap_err().is(ErrorKind::MissingFields));
    assert!(ReadParams::new("contacts").with_fields(["name"]).validate(true).is_ok());

    let inverted = ReadParams::new("contacts")
        .with_window(Some(Timestamp::from_unix_seconds(10)), Some(Timestamp::from_unix_seconds(5)));
    assert!(inverted.validate(false).unwrap_err().is(ErrorKind::InvalidParameter));
    let zero_page = ReadParams::new("contacts").with_page_size(0);
    assert!(zero_page.validate(false).unwrap_err().is(ErrorKind::InvalidParameter));
}

/// Tests write and delete parameter validation.
#[test]
fn write_and_delete_validation() {
    let missing = WriteParams {
        object_name: "contacts".to_string(),
        ..WriteParams::default()
    };
    assert!(missing.validate().unwrap_err().is(ErrorKind::MissingRecordData));
    assert!(WriteParams::create("", json!({})).validate().unwrap_err().is(ErrorKind::MissingObjects));
    assert!(WriteParams::create("contacts", json!({"a": 1})).is_create());
    assert!(!WriteParams::update("contacts", "1", json!({"a": 1})).is_create());

    let err = DeleteParams::new("contacts", "").validate().unwrap_err();
    assert!(err.is(ErrorKind::MissingRecordId));
    assert_eq!(err.category(), ErrorCategory::Input);
    assert!(DeleteParams::new("contacts", "1").validate().is_ok());
}

/// Tests that read results derive done from the token.
#[test]
fn read_result_done_iff_next_page_empty() {
    let last = ReadResult::new(Vec::new(), NextPage::done());
    assert!(last.done);
    assert_eq!(last.rows, 0);
    let more = ReadResult::new(Vec::new(), NextPage::from("25"));
    assert!(!more.done);
    assert_eq!(more.next_page.as_str(), "25");
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tests kind wrapping and retry classification.
#[test]
fn error_kind_with_detail() {
    let err = ErrorKind::LimitExceeded.with_detail("slow down");
    assert!(err.is(ErrorKind::LimitExceeded));
    assert!(err.is_retryable());
    assert_eq!(err.detail(), "slow down");
    assert_eq!(err.to_string(), "limit exceeded: slow down");
    assert!(!ErrorKind::Forbidden.with_detail("no").is_retryable());
    assert_eq!(ErrorKind::RecordNotFound.category(), ErrorCategory::NotFound);
}

// ============================================================================
// SECTION: Field Selection
// ============================================================================

/// Tests case-insensitive projection with dotted paths.
#[test]
fn select_fields_is_case_insensitive() {
    let raw = record(json!({"Name": "Alice", "Email": "a@example.com", "Address": {"City": "Oslo"}}));
    let fields: BTreeSet<String> =
        ["NAME", "address.city", "missing"].into_iter().map(String::from).collect();
    let selected = select_fields(&raw, &fields);
    assert_eq!(selected, record(json!({"name": "Alice", "address.city": "Oslo"})));

    let everything = select_fields(&raw, &BTreeSet::new());
    assert!(everything.contains_key("email"));
    assert!(everything.contains_key("address"));
}

/// Tests identifier coercion.
#[test]
fn coerce_id_accepts_strings_and_integers() {
    assert_eq!(coerce_id(&json!("abc")), Some("abc".to_string()));
    assert_eq!(coerce_id(&json!(42)), Some("42".to_string()));
    assert_eq!(coerce_id(&json!("")), None);
    assert_eq!(coerce_id(&json!(1.5)), None);
    assert_eq!(coerce_id(&json!(null)), None);
}

// ============================================================================
// SECTION: Timestamps
// ============================================================================

/// Tests every supported timestamp encoding.
#[test]
fn timestamp_parsing() {
    let expected = Timestamp::from_unix_seconds(1_700_000_000);
    assert_eq!(Timestamp::parse_value(&json!(1_700_000_000)), Some(expected));
    assert_eq!(Timestamp::parse_value(&json!("1700000000")), Some(expected));
    assert_eq!(Timestamp::parse_value(&json!("2023-11-14T22:13:20Z")), Some(expected));
    assert_eq!(
        Timestamp::parse_value(&json!(1_700_000_000.5)),
        Some(Timestamp::from_unix_nanos(1_700_000_000_500_000_000))
    );
    assert_eq!(
        Timestamp::parse_value(&json!("1700000000.000000001")),
        Some(Timestamp::from_unix_nanos(1_700_000_000_000_000_001))
    );
    assert_eq!(Timestamp::parse_value(&json!("yesterday")), None);
    assert_eq!(Timestamp::parse_value(&json!(true)), None);
    assert_eq!(expected.to_rfc3339().unwrap(), "2023-11-14T22:13:20Z");
}

/// Tests that decimal seconds outside the nanosecond range are unparseable.
#[test]
fn timestamp_rejects_extreme_decimal_exponents() {
    assert_eq!(Timestamp::parse_str("1e99999999999"), None);
    assert_eq!(Timestamp::parse_str("-1e99999999999"), None);
    assert_eq!(Timestamp::parse_str("1e-99999999999"), None);
    assert_eq!(Timestamp::parse_str("1e20"), None);
    assert_eq!(Timestamp::parse_str(&"9".repeat(100)), None);
    assert_eq!(Timestamp::parse_value(&json!(1e300)), None);
    assert_eq!(
        Timestamp::parse_str("1.7e9"),
        Some(Timestamp::from_unix_seconds(1_700_000_000))
    );
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Tests cancellation propagation across clones and deadlines.
#[test]
fn context_cancellation() {
    let ctx = Context::background();
    assert!(ctx.check().is_ok());
    let child = ctx.with_timeout(Duration::from_secs(60));
    ctx.cancel();
    assert!(child.is_cancelled());
    assert!(child.check().unwrap_err().is(ErrorKind::Cancelled));

    let expired = Context::background().with_timeout(Duration::ZERO);
    assert!(expired.check().is_err());
    assert_eq!(expired.remaining(), Some(Duration::ZERO));
}
