// crates/conduit-runtime/src/guard.rs
// ============================================================================
// Module: Panic Guard
// Description: Converts unwinding panics into ordinary values.
// Purpose: Keep one misbehaving adapter or provider from ending the process.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Adapter constructors and composite schema providers run third-party logic.
//! [`catch_panic`] runs such logic and returns the panic payload as text when
//! it unwinds. Aborting panics are not recoverable and are out of reach here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Runs `f`, returning the panic message when it unwinds.
///
/// # Errors
///
/// Returns the rendered panic payload when `f` panics.
pub fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

/// Renders a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        format!("panicked: {text}")
    } else if let Some(text) = payload.downcast_ref::<String>() {
        format!("panicked: {text}")
    } else {
        "panicked".to_string()
    }
}
