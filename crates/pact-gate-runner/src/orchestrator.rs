// crates/pact-gate-runner/src/orchestrator.rs
// ============================================================================
// Module: Verification Orchestrator
// Description: Sequences provider startup, discovery, and verification.
// Purpose: Turn a run request into a single pass/fail result.
// Dependencies: pact-gate-broker, pact-gate-config, pact-gate-core,
//               pact-gate-provider, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`Orchestrator::run`] walks `Init -> ProviderStarting -> ContractsResolved
//! -> Verifying -> Done`. The provider instance is started and awaited before
//! the broker is queried. Zero applicable contracts is a trivial success and
//! the engine is not invoked.
//! Invariants:
//! - Discovery failures abort the run; no partial contract set is verified.
//! - Every run ends in `Done`: reports carry the successful history and
//!   [`RunFailure`] carries the failed one.
//! - The engine's verdict is the run's verdict.
//! - The provider instance is never stopped by the orchestrator. On success
//!   the caller receives its handle; on failure it keeps running detached.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pact_gate_broker::BrokerClient;
use pact_gate_broker::BrokerClientConfig;
use pact_gate_broker::BrokerError;
use pact_gate_config::PactGateConfig;
use pact_gate_core::BrokerCredentials;
use pact_gate_core::ConsumerFilter;
use pact_gate_core::EngineError;
use pact_gate_core::VerificationEngine;
use pact_gate_core::VerificationRequest;
use pact_gate_provider::InstrumentedProvider;
use pact_gate_provider::ProviderError;
use pact_gate_provider::ProviderHandle;
use pact_gate_provider::ProviderStateStore;
use pact_gate_provider::free_port;
use thiserror::Error;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Contract Resolution
// ============================================================================

/// Source of the contract URLs a run verifies.
pub trait ContractResolver: Send + Sync {
    /// Resolves pact URLs for a tag and consumer filter.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when the broker cannot be queried.
    fn resolve_contracts(
        &self,
        broker_url: &str,
        target_tag: &str,
        consumer: &ConsumerFilter,
    ) -> Result<Vec<String>, BrokerError>;
}

impl ContractResolver for BrokerClient {
    fn resolve_contracts(
        &self,
        broker_url: &str,
        target_tag: &str,
        consumer: &ConsumerFilter,
    ) -> Result<Vec<String>, BrokerError> {
        Self::resolve_contracts(self, broker_url, target_tag, consumer)
    }
}

// ============================================================================
// SECTION: Run Model
// ============================================================================

/// Final verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every contract verified, or there were none.
    Success,
    /// Discovery, startup, or verification failed.
    Failure,
}

/// Orchestrator state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Nothing started yet.
    Init,
    /// Provider instance launched, waiting for readiness.
    ProviderStarting,
    /// Contract URLs resolved from the broker.
    ContractsResolved,
    /// Engine running.
    Verifying,
    /// Terminal phase.
    Done(RunOutcome),
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::ProviderStarting => f.write_str("provider_starting"),
            Self::ContractsResolved => f.write_str("contracts_resolved"),
            Self::Verifying => f.write_str("verifying"),
            Self::Done(RunOutcome::Success) => f.write_str("done(success)"),
            Self::Done(RunOutcome::Failure) => f.write_str("done(failure)"),
        }
    }
}

/// Arguments of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    /// Broker base URL.
    pub broker_url: String,
    /// Tag selecting the latest pacts.
    pub target_tag: String,
    /// Consumer selection.
    pub consumer: ConsumerFilter,
    /// Optional broker credentials.
    pub credentials: Option<BrokerCredentials>,
    /// Whether the engine publishes results.
    pub publish_results: bool,
    /// Provider version reported with results.
    pub provider_version: String,
}

impl RunParams {
    /// Builds run arguments from a validated config.
    #[must_use]
    pub fn from_config(config: &PactGateConfig) -> Self {
        Self {
            broker_url: config.broker.url.clone(),
            target_tag: config.broker.target_tag.clone(),
            consumer: config.consumer_filter(),
            credentials: config.credentials(),
            publish_results: config.verification.publish_results,
            provider_version: config.provider.version.clone(),
        }
    }
}

/// Provider instance settings for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Fixed port; a free port is chosen when `None`.
    pub port: Option<u16>,
    /// Maximum wait for provider readiness.
    pub ready_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            port: None,
            ready_timeout: Duration::from_secs(5),
        }
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Phases visited, ending with [`RunPhase::Done`].
    pub phases: Vec<RunPhase>,
    /// Contract URLs that were selected.
    pub contracts: Vec<String>,
    /// Request handed to the engine, when it was invoked.
    pub request: Option<VerificationRequest>,
    /// The still-running provider instance.
    pub provider: ProviderHandle,
}

impl RunReport {
    /// Returns the terminal outcome.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        terminal_outcome(&self.phases)
    }
}

/// Returns the outcome recorded by the last phase; a history that never
/// reached [`RunPhase::Done`] counts as a failure.
#[must_use]
pub fn terminal_outcome(phases: &[RunPhase]) -> RunOutcome {
    match phases.last() {
        Some(RunPhase::Done(outcome)) => *outcome,
        _ => RunOutcome::Failure,
    }
}

/// Errors that end a run with [`RunOutcome::Failure`].
#[derive(Debug, Error)]
pub enum RunError {
    /// The provider instance could not start.
    #[error("provider startup failed: {0}")]
    Provider(#[from] ProviderError),
    /// The broker query failed.
    #[error("contract discovery failed: {0}")]
    Discovery(#[from] BrokerError),
    /// The engine failed or reported mismatches.
    #[error("verification failed: {0}")]
    Verification(#[from] EngineError),
}

/// A failed run: the cause plus the phases visited before it ended.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    /// Phases visited, ending with `Done(Failure)`.
    pub phases: Vec<RunPhase>,
    /// Cause of the failure.
    pub error: RunError,
}

impl RunFailure {
    /// Returns the terminal outcome.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        terminal_outcome(&self.phases)
    }
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Runs provider verification end to end.
pub struct Orchestrator {
    /// Contract discovery.
    resolver: Arc<dyn ContractResolver>,
    /// Replay engine.
    engine: Arc<dyn VerificationEngine>,
    /// Fixture store served by the provider instance.
    store: Arc<ProviderStateStore>,
    /// Instance settings.
    settings: OrchestratorSettings,
}

impl Orchestrator {
    /// Creates an orchestrator with default settings.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn ContractResolver>,
        engine: Arc<dyn VerificationEngine>,
        store: Arc<ProviderStateStore>,
    ) -> Self {
        Self {
            resolver,
            engine,
            store,
            settings: OrchestratorSettings::default(),
        }
    }

    /// Replaces the instance settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds an orchestrator with a [`BrokerClient`] from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Discovery`] when the broker client cannot be built.
    pub fn from_config(
        config: &PactGateConfig,
        engine: Arc<dyn VerificationEngine>,
    ) -> Result<Self, RunError> {
        let client = BrokerClient::new(BrokerClientConfig {
            provider: config.provider.name.clone(),
            credentials: config.credentials(),
            timeout: config.broker_timeout(),
        })?;
        Ok(Self::new(Arc::new(client), engine, Arc::new(ProviderStateStore::new())).with_settings(
            OrchestratorSettings {
                port: config.provider.port,
                ready_timeout: config.ready_timeout(),
            },
        ))
    }

    /// Returns the fixture store served by the provider instance.
    #[must_use]
    pub fn store(&self) -> Arc<ProviderStateStore> {
        Arc::clone(&self.store)
    }

    /// Executes one verification run.
    ///
    /// # Errors
    ///
    /// Returns [`RunFailure`] when the provider cannot start, discovery fails,
    /// or the engine reports failure.
    pub fn run(&self, params: &RunParams) -> Result<RunReport, RunFailure> {
        let mut phases = vec![RunPhase::Init];

        enter(&mut phases, RunPhase::ProviderStarting);
        let provider = match self.start_provider() {
            Ok(provider) => provider,
            Err(err) => return Err(fail(phases, err.into())),
        };

        let contracts = match self.resolver.resolve_contracts(
            &params.broker_url,
            &params.target_tag,
            &params.consumer,
        ) {
            Ok(contracts) => contracts,
            Err(err) => return Err(fail(phases, err.into())),
        };
        enter(&mut phases, RunPhase::ContractsResolved);
        info!(count = contracts.len(), consumer = %params.consumer, "contracts resolved");

        if contracts.is_empty() {
            info!("no contracts apply; nothing to verify");
            enter(&mut phases, RunPhase::Done(RunOutcome::Success));
            return Ok(RunReport {
                phases,
                contracts,
                request: None,
                provider,
            });
        }

        let request = VerificationRequest::new(
            provider.endpoints(),
            contracts.clone(),
            params.broker_url.clone(),
            params.credentials.clone(),
            params.publish_results,
            params.provider_version.clone(),
        );
        enter(&mut phases, RunPhase::Verifying);
        if let Err(err) = self.engine.verify(&request) {
            return Err(fail(phases, err.into()));
        }
        enter(&mut phases, RunPhase::Done(RunOutcome::Success));
        Ok(RunReport {
            phases,
            contracts,
            request: Some(request),
            provider,
        })
    }

    /// Spawns the provider instance and waits for readiness.
    fn start_provider(&self) -> Result<ProviderHandle, ProviderError> {
        let port = match self.settings.port {
            Some(port) => port,
            None => free_port()?,
        };
        let mut provider = InstrumentedProvider::spawn(port, Arc::clone(&self.store))?;
        provider.wait_ready(self.settings.ready_timeout)?;
        Ok(provider)
    }
}

/// Records and logs a phase transition.
fn enter(phases: &mut Vec<RunPhase>, next: RunPhase) {
    let from = phases.last().copied().unwrap_or(RunPhase::Init);
    info!(from = %from, to = %next, "run phase");
    phases.push(next);
}

/// Records the failure transition and pairs it with the cause.
fn fail(mut phases: Vec<RunPhase>, error: RunError) -> RunFailure {
    warn!(error = %error, "run failed");
    enter(&mut phases, RunPhase::Done(RunOutcome::Failure));
    RunFailure {
        phases,
        error,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
