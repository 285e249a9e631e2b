// crates/conduit-core/src/lib.rs
// ============================================================================
// Module: Conduit Core Library
// Description: Public API surface for the Conduit core contracts.
// Purpose: Expose data-plane types, schema identity, errors, and interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Conduit core defines the uniform four-operation data plane (read, write,
//! delete, list object metadata) shared by every provider adapter and by the
//! in-memory deep-mock connector. It is backend-agnostic: HTTP transport,
//! schema storage, and provider specifics live behind the interfaces declared
//! here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::BatchRecordReader;
pub use interfaces::Capability;
pub use interfaces::CapabilitySet;
pub use interfaces::Connector;
pub use interfaces::Deleter;
pub use interfaces::HttpClient;
pub use interfaces::HttpMethod;
pub use interfaces::HttpRequest;
pub use interfaces::HttpResponse;
pub use interfaces::Reader;
pub use interfaces::SchemaProvider;
pub use interfaces::SubscribeParams;
pub use interfaces::Subscriber;
pub use interfaces::SubscriptionResult;
pub use interfaces::SubscriptionStatus;
pub use interfaces::WebhookMessage;
pub use interfaces::Writer;
