// crates/pact-gate-provider/src/login.rs
// ============================================================================
// Module: User Login Route
// Description: Business endpoint exercised by replayed interactions.
// Purpose: Authenticate users against the active fixture repository.
// Dependencies: axum, serde, serde_json
// ============================================================================

//! ## Overview
//! `POST /users/login` with `{"username", "password"}`. Responses:
//! `503` for an unreadable body, `404` for an unknown user, `401` for a
//! credential mismatch, and `200` with `{"user": {...}}` otherwise. Every
//! response carries the JSON content type and a correlation id header.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::body::Body;
use axum::body::to_bytes;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::fixtures::User;
use crate::fixtures::UserRepository;
use crate::server::JSON_CONTENT_TYPE;
use crate::store::ProviderStateStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Correlation id header returned on every login response.
pub const CORRELATION_ID_HEADER: &str = "x-api-correlation-id";

/// Correlation id value returned on every login response.
const CORRELATION_ID: &str = "1234";

/// Maximum accepted login body size.
const MAX_LOGIN_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Login request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Successful login body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    /// Authenticated user (password omitted).
    pub user: User,
}

// ============================================================================
// SECTION: Authentication
// ============================================================================

/// Result of checking a login against a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials matched.
    Authenticated(User),
    /// No such user.
    UnknownUser,
    /// User exists but the credentials do not match.
    BadCredentials,
}

impl LoginOutcome {
    /// Returns the HTTP status for this outcome.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Authenticated(_) => StatusCode::OK,
            Self::UnknownUser => StatusCode::NOT_FOUND,
            Self::BadCredentials => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Checks a login against `repository`.
#[must_use]
pub fn authenticate(repository: &UserRepository, request: &LoginRequest) -> LoginOutcome {
    match repository.by_username(&request.username) {
        None => LoginOutcome::UnknownUser,
        Some(user) if user.password != request.password => LoginOutcome::BadCredentials,
        Some(user) => LoginOutcome::Authenticated(user.clone()),
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Handles `POST /users/login`.
pub async fn login(State(store): State<Arc<ProviderStateStore>>, body: Body) -> Response {
    let Ok(bytes) = to_bytes(body, MAX_LOGIN_BYTES).await else {
        return respond(StatusCode::SERVICE_UNAVAILABLE, Vec::new());
    };
    let request: LoginRequest = match serde_json::from_slice(&bytes) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "login body rejected");
            return respond(StatusCode::SERVICE_UNAVAILABLE, Vec::new());
        }
    };
    let repository = store.active();
    match authenticate(&repository, &request) {
        LoginOutcome::Authenticated(user) => match serde_json::to_vec(&LoginResponse {
            user,
        }) {
            Ok(body) => respond(StatusCode::OK, body),
            Err(_) => respond(StatusCode::INTERNAL_SERVER_ERROR, Vec::new()),
        },
        outcome => respond(outcome.status(), Vec::new()),
    }
}

/// Builds a login response with the shared headers.
fn respond(status: StatusCode, body: Vec<u8>) -> Response {
    (
        status,
        [
            (CONTENT_TYPE, JSON_CONTENT_TYPE),
            (HeaderName::from_static(CORRELATION_ID_HEADER), CORRELATION_ID),
        ],
        body,
    )
        .into_response()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
