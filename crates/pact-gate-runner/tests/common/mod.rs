// crates/pact-gate-runner/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Stub broker, fake resolver, and recording engines.
// Purpose: Drive orchestrator runs without a real broker or verifier.
// Dependencies: pact-gate-runner, reqwest, serde_json, tiny_http
// ============================================================================

//! ## Overview
//! The replaying engine exercises the live provider over HTTP the way a
//! verification engine would: set a state, then call the business route.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use pact_gate_broker::BrokerError;
use pact_gate_core::ConsumerFilter;
use pact_gate_core::EngineError;
use pact_gate_core::VerificationEngine;
use pact_gate_core::VerificationRequest;
use pact_gate_runner::ContractResolver;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Broker Stub
// ============================================================================

/// Spawns a stub broker answering one request and returns its base URL.
pub fn spawn_broker(status: u16, body: String) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        if let Ok(Some(request)) = server.recv_timeout(Duration::from_secs(10)) {
            let header =
                Header::from_bytes(&b"Content-Type"[..], &b"application/hal+json"[..]).unwrap();
            let response = Response::from_string(body).with_status_code(status).with_header(header);
            let _ = request.respond(response);
        }
    });
    format!("http://{addr}")
}

/// Builds a broker listing body with the given pact hrefs.
pub fn listing_body(hrefs: &[&str]) -> String {
    let pacts: Vec<Value> = hrefs.iter().map(|href| json!({ "href": href })).collect();
    json!({ "_links": { "pacts": pacts } }).to_string()
}

// ============================================================================
// SECTION: Fake Resolver
// ============================================================================

/// Resolver returning a canned result and counting calls.
pub struct FakeResolver {
    /// Canned contract URLs; `None` yields a broker status error.
    contracts: Option<Vec<String>>,
    /// Number of resolve calls.
    pub calls: AtomicUsize,
}

impl FakeResolver {
    /// Resolver that returns `contracts`.
    pub fn returning(contracts: &[&str]) -> Self {
        Self {
            contracts: Some(contracts.iter().map(|href| (*href).to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Resolver that always fails.
    pub fn failing() -> Self {
        Self {
            contracts: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of resolve calls.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContractResolver for FakeResolver {
    fn resolve_contracts(
        &self,
        broker_url: &str,
        _target_tag: &str,
        consumer: &ConsumerFilter,
    ) -> Result<Vec<String>, BrokerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contracts.as_ref().map_or_else(
            || {
                Err(BrokerError::Status {
                    status: 500,
                    url: broker_url.to_string(),
                })
            },
            |contracts| {
                Ok(contracts.iter().filter(|href| consumer.matches(href)).cloned().collect())
            },
        )
    }
}

// ============================================================================
// SECTION: Engines
// ============================================================================

/// Engine that records requests and returns a fixed verdict.
pub struct RecordingEngine {
    /// Whether `verify` fails.
    fail: bool,
    /// Requests received.
    pub requests: Mutex<Vec<VerificationRequest>>,
}

impl RecordingEngine {
    /// Engine that always passes.
    pub fn passing() -> Self {
        Self {
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Engine that always reports mismatches.
    pub fn failing() -> Self {
        Self {
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of the recorded requests.
    pub fn recorded(&self) -> Vec<VerificationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl VerificationEngine for RecordingEngine {
    fn verify(&self, request: &VerificationRequest) -> Result<(), EngineError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(EngineError::Failed("1 interaction, 1 failure".to_string()));
        }
        Ok(())
    }
}

/// Engine that replays the login interactions against the live provider.
pub struct ReplayEngine {
    /// Contract URLs seen.
    pub contracts: Mutex<Vec<String>>,
}

impl ReplayEngine {
    /// Creates an engine with no history.
    pub fn new() -> Self {
        Self {
            contracts: Mutex::new(Vec::new()),
        }
    }

    fn interaction(
        client: &Client,
        request: &VerificationRequest,
        state: &str,
        password: &str,
        expected: StatusCode,
    ) -> Result<(), EngineError> {
        let setup = client
            .post(&request.states_setup_url)
            .json(&json!({ "state": state }))
            .send()
            .map_err(|err| EngineError::Launch(err.to_string()))?;
        if setup.status() != StatusCode::OK {
            return Err(EngineError::Failed(format!("state setup returned {}", setup.status())));
        }
        let login = client
            .post(format!("{}/users/login", request.provider_base_url))
            .json(&json!({ "username": "billy", "password": password }))
            .send()
            .map_err(|err| EngineError::Launch(err.to_string()))?;
        if login.status() != expected {
            return Err(EngineError::Failed(format!(
                "state '{state}': expected {expected}, got {}",
                login.status()
            )));
        }
        Ok(())
    }
}

impl VerificationEngine for ReplayEngine {
    fn verify(&self, request: &VerificationRequest) -> Result<(), EngineError> {
        self.contracts.lock().unwrap().extend(request.contract_urls.iter().cloned());
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|err| EngineError::Launch(err.to_string()))?;
        Self::interaction(&client, request, "User billy exists", "issilly", StatusCode::OK)?;
        Self::interaction(
            &client,
            request,
            "User billy is unauthorized",
            "issilly",
            StatusCode::UNAUTHORIZED,
        )?;
        Self::interaction(&client, request, "User billy does not exist", "issilly", StatusCode::NOT_FOUND)
    }
}
