// crates/pact-gate-broker/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Stub broker server for broker client tests.
// Purpose: Serve canned listings and capture the request the client sent.
// Dependencies: tiny_http, serde_json
// ============================================================================

//! ## Overview
//! Provides a single-request `tiny_http` broker stub.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Request metadata captured by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request path and query.
    pub url: String,
    /// `Authorization` header value, when present.
    pub authorization: Option<String>,
}

/// Running stub broker.
pub struct StubBroker {
    /// Base URL of the stub.
    pub url: String,
    /// Receives the captured request.
    requests: mpsc::Receiver<RecordedRequest>,
    /// Serving thread.
    join: Option<thread::JoinHandle<()>>,
}

impl StubBroker {
    /// Returns the request the stub served.
    pub fn recorded(mut self) -> RecordedRequest {
        let recorded = self.requests.recv_timeout(Duration::from_secs(5)).unwrap();
        if let Some(join) = self.join.take() {
            join.join().unwrap();
        }
        recorded
    }
}

/// Spawns a stub that answers one request with `status` and `body`.
pub fn spawn_broker(status: u16, body: String) -> StubBroker {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();
    let join = thread::spawn(move || {
        if let Ok(Some(request)) = server.recv_timeout(Duration::from_secs(5)) {
            let authorization = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Authorization"))
                .map(|header| header.value.as_str().to_string());
            let _ = tx.send(RecordedRequest {
                url: request.url().to_string(),
                authorization,
            });
            let header =
                Header::from_bytes(&b"Content-Type"[..], &b"application/hal+json"[..]).unwrap();
            let response = Response::from_string(body).with_status_code(status).with_header(header);
            let _ = request.respond(response);
        }
    });
    StubBroker {
        url: format!("http://{addr}"),
        requests: rx,
        join: Some(join),
    }
}

/// Builds a broker listing body with the given pact hrefs.
pub fn listing_body(hrefs: &[&str]) -> String {
    let pacts: Vec<Value> = hrefs.iter().map(|href| json!({ "href": href })).collect();
    json!({
        "_links": {
            "self": { "href": "http://broker/pacts/provider/bobby/latest/master" },
            "provider": { "href": "http://broker/pacticipants/bobby" },
            "pacts": pacts
        }
    })
    .to_string()
}
