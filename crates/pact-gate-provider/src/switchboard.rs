// crates/pact-gate-provider/src/switchboard.rs
// ============================================================================
// Module: State Switchboard
// Description: HTTP endpoint that installs provider states.
// Purpose: Let the verification engine select fixtures between interactions.
// Dependencies: axum, pact-gate-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! `POST /setup` accepts `{"state": "<name>"}` and swaps the
//! [`ProviderStateStore`] to the matching fixture.
//! Invariants:
//! - Unreadable or undecodable bodies answer `503` and leave the store as it
//!   was.
//! - Unknown state names install [`ProviderState::UserAbsent`] and answer
//!   `200`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::body::Body;
use axum::body::to_bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use pact_gate_core::ProviderStateDirective;
use tracing::debug;
use tracing::warn;

use crate::fixtures::ProviderState;
use crate::server::JSON_CONTENT_TYPE;
use crate::store::ProviderStateStore;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted directive body size.
pub const MAX_DIRECTIVE_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Directive Application
// ============================================================================

/// Decodes a directive body and installs the matching state.
///
/// # Errors
///
/// Returns the decode error without touching the store.
pub fn apply_state_directive(
    store: &ProviderStateStore,
    body: &[u8],
) -> Result<ProviderState, serde_json::Error> {
    let directive: ProviderStateDirective = serde_json::from_slice(body)?;
    let state = ProviderState::from_name(&directive.state);
    if state == ProviderState::UserAbsent && directive.state != ProviderState::USER_ABSENT {
        debug!(requested = %directive.state, "unrecognized provider state, installing default");
    }
    store.set_active(state);
    Ok(state)
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Handles `POST /setup`.
pub async fn setup_state(State(store): State<Arc<ProviderStateStore>>, body: Body) -> Response {
    let bytes = match to_bytes(body, MAX_DIRECTIVE_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "provider state body unreadable");
            return unavailable();
        }
    };
    match apply_state_directive(&store, &bytes) {
        Ok(_) => (StatusCode::OK, [(CONTENT_TYPE, JSON_CONTENT_TYPE)]).into_response(),
        Err(err) => {
            warn!(error = %err, "provider state directive rejected");
            unavailable()
        }
    }
}

/// Builds the `503` response used for rejected directives.
fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, [(CONTENT_TYPE, JSON_CONTENT_TYPE)]).into_response()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
