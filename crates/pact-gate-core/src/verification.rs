// crates/pact-gate-core/src/verification.rs
// ============================================================================
// Module: Verification Requests
// Description: Inputs handed to the verification engine for one run.
// Purpose: Describe a run and abstract the engine that replays it.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`VerificationRequest`] is assembled once per run from the provider
//! endpoints and the resolved contract URLs, then passed by shared reference
//! to a [`VerificationEngine`]. The engine replays interactions, drives the
//! state switchboard, and optionally publishes results to the broker.
//! Invariants:
//! - Provider base and state setup URLs derive from the same port.
//! - Credential passwords never appear in `Debug` output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::state::STATE_SETUP_PATH;

// ============================================================================
// SECTION: Provider Endpoints
// ============================================================================

/// Loopback endpoints of the instrumented provider for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEndpoints {
    /// Port the provider listener is bound to.
    port: u16,
}

impl ProviderEndpoints {
    /// Creates endpoints for the provided port.
    #[must_use]
    pub const fn new(port: u16) -> Self {
        Self {
            port,
        }
    }

    /// Returns the bound port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the provider base URL.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Returns the state setup URL on the same listener.
    #[must_use]
    pub fn states_setup_url(&self) -> String {
        format!("{}{STATE_SETUP_PATH}", self.base_url())
    }
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Basic-auth credentials for the broker.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerCredentials {
    /// Broker username.
    pub username: String,
    /// Broker password.
    pub password: String,
}

impl fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// SECTION: Request
// ============================================================================

/// Complete description of one verification run.
///
/// # Invariants
/// - `contract_urls` holds broker hrefs verbatim.
/// - Constructed once per run and never mutated after handoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    /// Base URL of the instrumented provider.
    pub provider_base_url: String,
    /// URL of the state switchboard.
    pub states_setup_url: String,
    /// Pact document URLs to verify.
    pub contract_urls: Vec<String>,
    /// Broker base URL.
    pub broker_url: String,
    /// Optional broker credentials.
    pub broker_credentials: Option<BrokerCredentials>,
    /// Whether the engine publishes results to the broker.
    pub publish_results: bool,
    /// Provider application version reported with published results.
    pub provider_version: String,
}

impl VerificationRequest {
    /// Builds a request whose provider URLs derive from `endpoints`.
    #[must_use]
    pub fn new(
        endpoints: ProviderEndpoints,
        contract_urls: Vec<String>,
        broker_url: impl Into<String>,
        broker_credentials: Option<BrokerCredentials>,
        publish_results: bool,
        provider_version: impl Into<String>,
    ) -> Self {
        Self {
            provider_base_url: endpoints.base_url(),
            states_setup_url: endpoints.states_setup_url(),
            contract_urls,
            broker_url: broker_url.into(),
            broker_credentials,
            publish_results,
            provider_version: provider_version.into(),
        }
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Errors reported by a verification engine.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be started.
    #[error("verification engine failed to launch: {0}")]
    Launch(String),
    /// One or more interactions did not match.
    #[error("provider verification failed: {0}")]
    Failed(String),
}

/// Replays contract interactions against a running provider.
pub trait VerificationEngine: Send + Sync {
    /// Verifies every contract in the request.
    ///
    /// Returns `Ok(())` only when every interaction of every contract passed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the engine cannot run or verification fails.
    fn verify(&self, request: &VerificationRequest) -> Result<(), EngineError>;
}

// ============================================================================
// SECTION: Tests
// ============================================================================
