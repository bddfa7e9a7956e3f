// crates/pact-gate-core/src/state.rs
// ============================================================================
// Module: Provider State Directives
// Description: Wire type posted by the verification engine before replay.
// Purpose: Name the fixture the provider must install for an interaction.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Verification engines `POST` a [`ProviderStateDirective`] to
//! [`STATE_SETUP_PATH`] before replaying interactions annotated with a
//! provider state.

use serde::Deserialize;
use serde::Serialize;

/// Route on the provider instance that accepts state directives.
pub const STATE_SETUP_PATH: &str = "/setup";

/// Request body naming a provider state.
///
/// Engines may send extra fields (`consumer`, `states`, `params`); they are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStateDirective {
    /// Provider state name exactly as written in the pact.
    pub state: String,
}

impl ProviderStateDirective {
    /// Creates a directive for the provided state name.
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
        }
    }
}
