// crates/pact-gate-provider/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Helpers for driving a live provider instance.
// Purpose: Start isolated instances and issue blocking HTTP calls.
// Dependencies: pact-gate-provider, reqwest
// ============================================================================

//! ## Overview
//! Every test starts its own store and instance on a fresh port.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::time::Duration;

use pact_gate_provider::InstrumentedProvider;
use pact_gate_provider::ProviderHandle;
use pact_gate_provider::ProviderStateStore;
use pact_gate_provider::free_port;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::CONTENT_TYPE;

/// Running provider plus the store it serves.
pub struct LiveProvider {
    /// Store shared with the instance.
    pub store: Arc<ProviderStateStore>,
    /// Instance handle.
    pub handle: ProviderHandle,
    /// HTTP client for requests.
    pub client: Client,
}

impl LiveProvider {
    /// Starts a ready provider with a fresh store.
    pub fn start() -> Self {
        let store = Arc::new(ProviderStateStore::new());
        let mut handle = InstrumentedProvider::spawn(free_port().unwrap(), Arc::clone(&store)).unwrap();
        handle.wait_ready(Duration::from_secs(5)).unwrap();
        Self {
            store,
            handle,
            client: Client::builder().timeout(Duration::from_secs(5)).build().unwrap(),
        }
    }

    /// Posts a raw body to `path`.
    pub fn post(&self, path: &str, body: &str) -> Response {
        self.client
            .post(format!("{}{path}", self.handle.endpoints().base_url()))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .unwrap()
    }

    /// Stops the instance.
    pub fn stop(self) {
        self.handle.shutdown().unwrap();
    }
}
