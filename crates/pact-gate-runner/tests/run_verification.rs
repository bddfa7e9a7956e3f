// crates/pact-gate-runner/tests/run_verification.rs
// ============================================================================
// Module: Verification Run Tests
// Description: End-to-end orchestrator runs with stub collaborators.
// Purpose: Verify sequencing, verdicts, and request contents.
// Dependencies: pact-gate-runner, pact-gate-broker, pact-gate-provider
// ============================================================================

//! ## Overview
//! Each test starts a real provider instance on a free port. Broker and
//! engine are replaced by stubs so verdicts are deterministic.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

mod common;

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use pact_gate_broker::BrokerClient;
use pact_gate_broker::BrokerClientConfig;
use pact_gate_core::BrokerCredentials;
use pact_gate_core::ConsumerFilter;
use pact_gate_provider::ProviderState;
use pact_gate_provider::ProviderStateStore;
use pact_gate_runner::Orchestrator;
use pact_gate_runner::OrchestratorSettings;
use pact_gate_runner::RunError;
use pact_gate_runner::RunOutcome;
use pact_gate_runner::RunParams;
use pact_gate_runner::RunPhase;

use crate::common::FakeResolver;
use crate::common::RecordingEngine;
use crate::common::ReplayEngine;
use crate::common::listing_body;
use crate::common::spawn_broker;

const BILLY_PACT: &str = "http://broker/pacts/provider/bobby/consumer/billy/latest/master";
const MILLY_PACT: &str = "http://broker/pacts/provider/bobby/consumer/milly/latest/master";

fn params(broker_url: &str, consumer: ConsumerFilter) -> RunParams {
    RunParams {
        broker_url: broker_url.to_string(),
        target_tag: "master".to_string(),
        consumer,
        credentials: None,
        publish_results: true,
        provider_version: "1.0.0".to_string(),
    }
}

fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        port: None,
        ready_timeout: Duration::from_secs(5),
    }
}

// ============================================================================
// SECTION: Full Flow
// ============================================================================

#[test]
fn replayed_interactions_pass_against_live_provider() {
    let broker_url = spawn_broker(200, listing_body(&[BILLY_PACT, MILLY_PACT]));
    let resolver = Arc::new(BrokerClient::new(BrokerClientConfig::new("bobby")).unwrap());
    let engine = Arc::new(ReplayEngine::new());
    let store = Arc::new(ProviderStateStore::new());
    let orchestrator =
        Orchestrator::new(resolver, engine.clone(), Arc::clone(&store)).with_settings(settings());

    let report = orchestrator
        .run(&params(&broker_url, ConsumerFilter::Named("billy".to_string())))
        .unwrap();

    assert_eq!(report.outcome(), RunOutcome::Success);
    assert_eq!(report.contracts, vec![BILLY_PACT.to_string()]);
    assert_eq!(*engine.contracts.lock().unwrap(), vec![BILLY_PACT.to_string()]);
    assert_eq!(store.active_state(), ProviderState::UserAbsent);
    report.provider.shutdown().unwrap();
}

#[test]
fn phases_are_visited_in_order() {
    let resolver = Arc::new(FakeResolver::returning(&[BILLY_PACT]));
    let engine = Arc::new(RecordingEngine::passing());
    let orchestrator =
        Orchestrator::new(resolver, engine, Arc::new(ProviderStateStore::new())).with_settings(settings());

    let report = orchestrator.run(&params("http://broker", ConsumerFilter::All)).unwrap();
    assert_eq!(
        report.phases,
        vec![
            RunPhase::Init,
            RunPhase::ProviderStarting,
            RunPhase::ContractsResolved,
            RunPhase::Verifying,
            RunPhase::Done(RunOutcome::Success),
        ]
    );
    report.provider.shutdown().unwrap();
}

#[test]
fn request_carries_run_parameters_verbatim() {
    let resolver = Arc::new(FakeResolver::returning(&[BILLY_PACT, MILLY_PACT]));
    let engine = Arc::new(RecordingEngine::passing());
    let orchestrator = Orchestrator::new(resolver, engine.clone(), Arc::new(ProviderStateStore::new()))
        .with_settings(settings());
    let mut run = params("http://broker.internal", ConsumerFilter::All);
    run.credentials = Some(BrokerCredentials {
        username: "ci".to_string(),
        password: "secret".to_string(),
    });
    run.publish_results = false;
    run.provider_version = "2.3.4".to_string();

    let report = orchestrator.run(&run).unwrap();
    let recorded = engine.recorded();
    assert_eq!(recorded.len(), 1);
    let request = &recorded[0];
    let endpoints = report.provider.endpoints();
    assert_eq!(request.contract_urls, vec![BILLY_PACT.to_string(), MILLY_PACT.to_string()]);
    assert_eq!(request.provider_base_url, endpoints.base_url());
    assert_eq!(request.states_setup_url, endpoints.states_setup_url());
    assert_eq!(request.broker_url, "http://broker.internal");
    assert_eq!(request.broker_credentials, run.credentials);
    assert!(!request.publish_results);
    assert_eq!(request.provider_version, "2.3.4");
    assert_eq!(report.request.as_ref(), Some(request));
    report.provider.shutdown().unwrap();
}

// ============================================================================
// SECTION: Edge Cases
// ============================================================================

#[test]
fn no_matching_contracts_is_success_without_engine() {
    let resolver = Arc::new(FakeResolver::returning(&[MILLY_PACT]));
    let engine = Arc::new(RecordingEngine::failing());
    let orchestrator = Orchestrator::new(resolver, engine.clone(), Arc::new(ProviderStateStore::new()))
        .with_settings(settings());

    let report = orchestrator
        .run(&params("http://broker", ConsumerFilter::Named("billy".to_string())))
        .unwrap();
    assert_eq!(report.outcome(), RunOutcome::Success);
    assert!(report.contracts.is_empty());
    assert!(report.request.is_none());
    assert!(engine.recorded().is_empty());
    report.provider.shutdown().unwrap();
}

#[test]
fn discovery_failure_skips_engine() {
    let resolver = Arc::new(FakeResolver::failing());
    let engine = Arc::new(RecordingEngine::passing());
    let orchestrator = Orchestrator::new(resolver, engine.clone(), Arc::new(ProviderStateStore::new()))
        .with_settings(settings());

    let failure = orchestrator.run(&params("http://broker", ConsumerFilter::All)).unwrap_err();
    assert!(matches!(failure.error, RunError::Discovery(_)));
    assert_eq!(failure.outcome(), RunOutcome::Failure);
    assert_eq!(
        failure.phases,
        vec![RunPhase::Init, RunPhase::ProviderStarting, RunPhase::Done(RunOutcome::Failure)]
    );
    assert!(engine.recorded().is_empty());
}

#[test]
fn unreachable_broker_is_discovery_failure() {
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let resolver = Arc::new(BrokerClient::new(BrokerClientConfig::new("bobby")).unwrap());
    let engine = Arc::new(RecordingEngine::passing());
    let orchestrator = Orchestrator::new(resolver, engine.clone(), Arc::new(ProviderStateStore::new()))
        .with_settings(settings());

    let result = orchestrator.run(&params(&format!("http://127.0.0.1:{port}"), ConsumerFilter::All));
    match result.map_err(|failure| failure.error) {
        Err(RunError::Discovery(err)) => assert!(err.to_string().starts_with("broker query failed")),
        other => panic!("expected discovery failure, got {other:?}"),
    }
    assert!(engine.recorded().is_empty());
}

#[test]
fn engine_failure_fails_the_run() {
    let resolver = Arc::new(FakeResolver::returning(&[BILLY_PACT]));
    let engine = Arc::new(RecordingEngine::failing());
    let orchestrator = Orchestrator::new(resolver, engine.clone(), Arc::new(ProviderStateStore::new()))
        .with_settings(settings());

    let failure = orchestrator.run(&params("http://broker", ConsumerFilter::All)).unwrap_err();
    assert!(matches!(failure.error, RunError::Verification(_)));
    assert_eq!(
        failure.phases,
        vec![
            RunPhase::Init,
            RunPhase::ProviderStarting,
            RunPhase::ContractsResolved,
            RunPhase::Verifying,
            RunPhase::Done(RunOutcome::Failure),
        ]
    );
    assert!(failure.to_string().starts_with("verification failed"));
    assert_eq!(engine.recorded().len(), 1);
}

#[test]
fn occupied_port_fails_before_discovery() {
    let holder = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = holder.local_addr().unwrap().port();
    let resolver = Arc::new(FakeResolver::returning(&[BILLY_PACT]));
    let engine = Arc::new(RecordingEngine::passing());
    let orchestrator = Orchestrator::new(resolver.clone(), engine, Arc::new(ProviderStateStore::new()))
        .with_settings(OrchestratorSettings {
            port: Some(port),
            ready_timeout: Duration::from_secs(5),
        });

    let failure = orchestrator.run(&params("http://broker", ConsumerFilter::All)).unwrap_err();
    assert!(matches!(failure.error, RunError::Provider(_)));
    assert_eq!(failure.phases.last(), Some(&RunPhase::Done(RunOutcome::Failure)));
    assert_eq!(resolver.call_count(), 0);
    drop(holder);
}
