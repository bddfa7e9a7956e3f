// crates/pact-gate-runner/src/engine.rs
// ============================================================================
// Module: Command Verification Engine
// Description: Verification engine backed by an external verifier executable.
// Purpose: Replay pacts and publish results through a standalone verifier.
// Dependencies: pact-gate-core, tracing
// ============================================================================

//! ## Overview
//! [`CommandVerifier`] passes a [`VerificationRequest`] to a verifier
//! executable such as `pact-provider-verifier`. Exit status zero means every
//! interaction passed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::Command;

use pact_gate_core::EngineError;
use pact_gate_core::VerificationEngine;
use pact_gate_core::VerificationRequest;
use tracing::debug;
use tracing::info;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum characters of verifier output kept in failure messages.
const OUTPUT_TAIL_CHARS: usize = 2_000;

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Runs an external verifier process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVerifier {
    /// Executable name or path.
    program: String,
}

impl CommandVerifier {
    /// Creates a verifier that invokes `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the executable name or path.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Builds the verifier command line for a request.
    #[must_use]
    pub fn arguments(&self, request: &VerificationRequest) -> Vec<String> {
        let mut args = request.contract_urls.clone();
        args.extend([
            "--provider-base-url".to_string(),
            request.provider_base_url.clone(),
            "--provider-states-setup-url".to_string(),
            request.states_setup_url.clone(),
            "--pact-broker-base-url".to_string(),
            request.broker_url.clone(),
        ]);
        if let Some(credentials) = &request.broker_credentials {
            args.extend([
                "--broker-username".to_string(),
                credentials.username.clone(),
                "--broker-password".to_string(),
                credentials.password.clone(),
            ]);
        }
        if request.publish_results {
            args.extend([
                "--publish-verification-results".to_string(),
                "--provider-app-version".to_string(),
                request.provider_version.clone(),
            ]);
        }
        args
    }
}

impl VerificationEngine for CommandVerifier {
    fn verify(&self, request: &VerificationRequest) -> Result<(), EngineError> {
        info!(
            program = %self.program,
            contracts = request.contract_urls.len(),
            publish = request.publish_results,
            "invoking verifier"
        );
        let output = Command::new(&self.program)
            .args(self.arguments(request))
            .output()
            .map_err(|err| EngineError::Launch(format!("{}: {err}", self.program)))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            debug!(target: "pact_gate::verifier", "{line}");
        }
        if output.status.success() {
            info!("verifier reported success");
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() { stdout } else { stderr };
        Err(EngineError::Failed(format!("{}: {}", output.status, tail(detail.trim()))))
    }
}

/// Returns at most the last [`OUTPUT_TAIL_CHARS`] characters of `text`.
fn tail(text: &str) -> &str {
    let count = text.chars().count();
    if count <= OUTPUT_TAIL_CHARS {
        return text;
    }
    let skip = count - OUTPUT_TAIL_CHARS;
    text.char_indices().nth(skip).map_or(text, |(index, _)| &text[index ..])
}

// ============================================================================
// SECTION: Tests
// ============================================================================
