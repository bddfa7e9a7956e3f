// crates/pact-gate-broker/src/lib.rs
// ============================================================================
// Module: Pact Gate Broker Library
// Description: Client for pact broker discovery queries.
// Purpose: Resolve the pact URLs a provider verification run should replay.
// Dependencies: pact-gate-core, reqwest, serde_json, thiserror, tracing, url
// ============================================================================

//! ## Overview
//! [`BrokerClient`] issues a single read against the broker's latest-pacts
//! listing for a provider and tag, decodes the HAL links, and applies a
//! [`pact_gate_core::ConsumerFilter`].
//! Invariants:
//! - Transport, status, and decode failures are all reported as
//!   [`BrokerError`]; no partial contract set is returned.
//! - A well-formed empty listing resolves to an empty set.
//! - Listing bodies are capped at [`MAX_LISTING_BYTES`].
//! - No retries are attempted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::BrokerClient;
pub use client::BrokerClientConfig;
pub use client::BrokerError;
pub use client::MAX_LISTING_BYTES;
