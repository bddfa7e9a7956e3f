// crates/pact-gate-runner/src/orchestrator/tests.rs
// ============================================================================
// Module: Orchestrator Unit Tests
// Description: Run parameter mapping and phase labels.
// Purpose: Keep config wiring and log labels stable.
// Dependencies: pact-gate-runner, pact-gate-config
// ============================================================================

//! ## Overview
//! Unit checks that do not start a provider instance.

use pact_gate_config::PactGateConfig;
use pact_gate_core::ConsumerFilter;

use super::RunOutcome;
use super::RunParams;
use super::RunPhase;
use super::terminal_outcome;

#[test]
fn params_follow_config() {
    let mut config = PactGateConfig::default();
    config.broker.consumer = "billy".to_string();
    config.broker.username = Some("ci".to_string());
    config.broker.password = Some("pw".to_string());
    config.verification.publish_results = false;
    let params = RunParams::from_config(&config);
    assert_eq!(params.broker_url, "http://pact-broker.keyshift.co:80");
    assert_eq!(params.target_tag, "master");
    assert_eq!(params.consumer, ConsumerFilter::Named("billy".to_string()));
    assert_eq!(params.credentials.map(|credentials| credentials.username), Some("ci".to_string()));
    assert!(!params.publish_results);
    assert_eq!(params.provider_version, "1.0.0");
}

#[test]
fn default_config_selects_all_consumers() {
    let params = RunParams::from_config(&PactGateConfig::default());
    assert_eq!(params.consumer, ConsumerFilter::All);
    assert!(params.credentials.is_none());
}

#[test]
fn phase_labels_are_stable() {
    assert_eq!(RunPhase::Init.to_string(), "init");
    assert_eq!(RunPhase::ProviderStarting.to_string(), "provider_starting");
    assert_eq!(RunPhase::ContractsResolved.to_string(), "contracts_resolved");
    assert_eq!(RunPhase::Verifying.to_string(), "verifying");
    assert_eq!(RunPhase::Done(RunOutcome::Success).to_string(), "done(success)");
    assert_eq!(RunPhase::Done(RunOutcome::Failure).to_string(), "done(failure)");
}

#[test]
fn terminal_outcome_reads_last_phase() {
    assert_eq!(
        terminal_outcome(&[RunPhase::Init, RunPhase::Done(RunOutcome::Success)]),
        RunOutcome::Success
    );
    assert_eq!(
        terminal_outcome(&[RunPhase::Init, RunPhase::Done(RunOutcome::Failure)]),
        RunOutcome::Failure
    );
}

#[test]
fn unfinished_history_counts_as_failure() {
    assert_eq!(terminal_outcome(&[]), RunOutcome::Failure);
    assert_eq!(terminal_outcome(&[RunPhase::Init, RunPhase::Verifying]), RunOutcome::Failure);
}
