// crates/pact-gate-core/src/lib.rs
// ============================================================================
// Module: Pact Gate Core Library
// Description: Shared data model for provider verification runs.
// Purpose: Define contract links, state directives, and verification requests.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Pact Gate Core defines the types exchanged between the broker client, the
//! instrumented provider, and the verification engine.
//! Invariants:
//! - Contract hrefs are carried verbatim from the broker response.
//! - A [`VerificationRequest`] is immutable once handed to an engine.
//! - Provider URLs are derived from a single [`ProviderEndpoints`] port.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod contract;
pub mod state;
pub mod verification;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use contract::ALL_CONSUMERS;
pub use contract::BrokerPactList;
pub use contract::ConsumerFilter;
pub use contract::ContractLink;
pub use contract::ContractLinkSet;
pub use state::ProviderStateDirective;
pub use state::STATE_SETUP_PATH;
pub use verification::BrokerCredentials;
pub use verification::EngineError;
pub use verification::ProviderEndpoints;
pub use verification::VerificationEngine;
pub use verification::VerificationRequest;
