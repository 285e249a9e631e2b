// crates/conduit-core/src/core/context.rs
// ============================================================================
// Module: Conduit Call Context
// Description: Per-call cancellation token with an optional deadline.
// Purpose: Let callers abort in-flight operations at well-defined yield points.
// Dependencies: crate::core::error
// ============================================================================

//! ## Overview
//! A [`Context`] is cheap to clone; clones share one cancellation flag.
//! Operations call [`Context::check`] before I/O and before taking locks, so a
//! cancelled call fails with [`ConnectorError::Cancelled`] at the next yield
//! point. Lock critical sections are never preempted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use crate::core::error::ConnectorError;

// ============================================================================
// SECTION: Context
// ============================================================================

/// Cancellation token shared by every clone of a call context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Shared cancellation flag.
    cancelled: Arc<AtomicBool>,
    /// Instant after which the context reports cancellation.
    deadline: Option<Instant>,
}

impl Context {
    /// Returns a context that is never cancelled unless asked to be.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a child context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a child context that expires at `deadline`.
    ///
    /// The earlier of the parent and child deadlines wins.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(deadline),
        }
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true when cancelled or past the deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns the time left before the deadline, if one is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fails when the context is no longer live.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Cancelled`] when cancelled or expired.
    pub fn check(&self) -> Result<(), ConnectorError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(ConnectorError::Cancelled("context cancelled".to_string()));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ConnectorError::Cancelled("context deadline exceeded".to_string()));
        }
        Ok(())
    }
}
