// crates/pact-gate-runner/src/lib.rs
// ============================================================================
// Module: Pact Gate Runner
// Description: Verification orchestration and the command-line engine.
// Purpose: Drive a provider verification run from start to verdict.
// Dependencies: pact-gate-broker, pact-gate-config, pact-gate-core,
//               pact-gate-provider
// ============================================================================

//! ## Overview
//! The runner starts an instrumented provider, resolves contracts from the
//! broker, and hands a [`pact_gate_core::VerificationRequest`] to a
//! [`pact_gate_core::VerificationEngine`]. [`CommandVerifier`] is the
//! production engine; tests substitute their own.

pub mod engine;
pub mod orchestrator;

pub use engine::CommandVerifier;
pub use orchestrator::ContractResolver;
pub use orchestrator::Orchestrator;
pub use orchestrator::OrchestratorSettings;
pub use orchestrator::RunError;
pub use orchestrator::RunFailure;
pub use orchestrator::RunOutcome;
pub use orchestrator::RunParams;
pub use orchestrator::RunPhase;
pub use orchestrator::RunReport;
pub use orchestrator::terminal_outcome;
