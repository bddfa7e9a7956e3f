// crates/pact-gate-provider/src/lib.rs
// ============================================================================
// Module: Pact Gate Provider Library
// Description: Instrumented provider with a controllable fixture store.
// Purpose: Serve the provider under test plus a state switchboard.
// Dependencies: axum, pact-gate-core, serde, tokio, tracing
// ============================================================================

//! ## Overview
//! The provider crate stands up the service under verification:
//! - [`ProviderStateStore`] holds the single active fixture repository.
//! - [`switchboard`] installs fixtures on `POST /setup`.
//! - [`login`] is the business route replayed by pacts.
//! - [`InstrumentedProvider`] serves both on one loopback listener.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fixtures;
pub mod login;
pub mod server;
pub mod store;
pub mod switchboard;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fixtures::FixtureCatalog;
pub use fixtures::ProviderState;
pub use fixtures::User;
pub use fixtures::UserKind;
pub use fixtures::UserRepository;
pub use server::InstrumentedProvider;
pub use server::ProviderError;
pub use server::ProviderHandle;
pub use server::free_port;
pub use server::router;
pub use server::serve;
pub use store::ProviderStateStore;
