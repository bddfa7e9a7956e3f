// crates/pact-gate-cli/src/main.rs
// ============================================================================
// Module: Pact Gate CLI Entry Point
// Description: Command dispatcher for provider verification workflows.
// Purpose: Run verification, list contracts, or serve the provider locally.
// Dependencies: clap, pact-gate-*, thiserror, tokio, tracing-subscriber.
// ============================================================================

//! ## Overview
//! `pact-gate verify` starts the instrumented provider, resolves contracts
//! from the broker, and runs the external verifier. `pact-gate contracts`
//! prints the contract URLs a run would verify. `pact-gate serve` runs the
//! instrumented provider in the foreground for manual verifier runs.
//!
//! Settings are layered: defaults, then `--config`, then environment, then
//! command-line flags.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use pact_gate_broker::BrokerClient;
use pact_gate_broker::BrokerClientConfig;
use pact_gate_config::PactGateConfig;
use pact_gate_provider::ProviderState;
use pact_gate_provider::ProviderStateStore;
use pact_gate_provider::serve;
use pact_gate_runner::CommandVerifier;
use pact_gate_runner::Orchestrator;
use pact_gate_runner::RunParams;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: CLI Definitions
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "pact-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify the provider against every applicable contract.
    Verify(VerifyCommand),
    /// Print the contract URLs a verification run would use.
    Contracts(ContractsCommand),
    /// Serve the instrumented provider until interrupted.
    Serve(ServeCommand),
}

/// Broker selection flags shared by `verify` and `contracts`.
#[derive(Args, Debug, Default, Clone)]
struct BrokerOverrides {
    /// Broker base URL.
    #[arg(long, value_name = "URL")]
    broker_url: Option<String>,
    /// Tag selecting the latest pacts.
    #[arg(long, value_name = "TAG")]
    target_tag: Option<String>,
    /// Consumer name, or `<all>` for every consumer.
    #[arg(long, value_name = "NAME")]
    consumer: Option<String>,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Broker selection.
    #[command(flatten)]
    broker: BrokerOverrides,
    /// Fixed provider port.
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
    /// Provider version reported with results.
    #[arg(long, value_name = "VERSION")]
    provider_version: Option<String>,
    /// Skip publishing verification results.
    #[arg(long)]
    no_publish: bool,
    /// Verifier executable.
    #[arg(long, value_name = "PATH")]
    verifier: Option<String>,
}

/// Arguments for `contracts`.
#[derive(Args, Debug)]
struct ContractsCommand {
    /// Broker selection.
    #[command(flatten)]
    broker: BrokerOverrides,
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Listening port; a free port is chosen when omitted.
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
    /// Initial provider state name.
    #[arg(long, value_name = "STATE")]
    state: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing failures.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// Result alias for CLI operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    let config = PactGateConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    match cli.command {
        Commands::Verify(command) => command_verify(config, command).await,
        Commands::Contracts(command) => command_contracts(config, &command).await,
        Commands::Serve(command) => command_serve(&config, command).await,
    }
}

/// Installs the global tracing subscriber.
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

// ============================================================================
// SECTION: Overrides
// ============================================================================

/// Applies broker flags to `config` and revalidates.
fn apply_broker_overrides(
    config: &mut PactGateConfig,
    overrides: &BrokerOverrides,
) -> CliResult<()> {
    if let Some(url) = &overrides.broker_url {
        config.broker.url.clone_from(url);
    }
    if let Some(tag) = &overrides.target_tag {
        config.broker.target_tag.clone_from(tag);
    }
    if let Some(consumer) = &overrides.consumer {
        config.broker.consumer.clone_from(consumer);
    }
    config.validate().map_err(|err| CliError::new(format!("invalid arguments: {err}")))
}

/// Applies `verify` flags to `config` and revalidates.
fn apply_verify_overrides(config: &mut PactGateConfig, command: &VerifyCommand) -> CliResult<()> {
    if let Some(port) = command.port {
        config.provider.port = Some(port);
    }
    if let Some(version) = &command.provider_version {
        config.provider.version.clone_from(version);
    }
    if command.no_publish {
        config.verification.publish_results = false;
    }
    if let Some(verifier) = &command.verifier {
        config.verification.verifier_path.clone_from(verifier);
    }
    apply_broker_overrides(config, &command.broker)
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs a full verification.
///
/// The broker client is blocking, so it is built, used, and dropped on the
/// blocking pool rather than on a runtime worker.
async fn command_verify(mut config: PactGateConfig, command: VerifyCommand) -> CliResult<ExitCode> {
    apply_verify_overrides(&mut config, &command)?;
    let verified = tokio::task::spawn_blocking(move || -> CliResult<usize> {
        let engine = Arc::new(CommandVerifier::new(config.verification.verifier_path.clone()));
        let orchestrator = Orchestrator::from_config(&config, engine)
            .map_err(|err| CliError::new(err.to_string()))?;
        let params = RunParams::from_config(&config);
        let report = orchestrator.run(&params).map_err(|err| CliError::new(err.to_string()))?;
        let count = report.contracts.len();
        report.provider.shutdown().map_err(|err| CliError::new(err.to_string()))?;
        Ok(count)
    })
    .await
    .map_err(|err| CliError::new(format!("verification task failed: {err}")))??;
    let message = if verified == 0 {
        "no contracts to verify".to_string()
    } else {
        format!("verified {verified} contract(s)")
    };
    write_stdout_line(&message).map_err(|err| CliError::new(output_error(&err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the contract URLs selected by the current settings.
async fn command_contracts(
    mut config: PactGateConfig,
    command: &ContractsCommand,
) -> CliResult<ExitCode> {
    apply_broker_overrides(&mut config, &command.broker)?;
    let contracts = tokio::task::spawn_blocking(move || -> CliResult<Vec<String>> {
        let client = BrokerClient::new(BrokerClientConfig {
            provider: config.provider.name.clone(),
            credentials: config.credentials(),
            timeout: config.broker_timeout(),
        })
        .map_err(|err| CliError::new(err.to_string()))?;
        client
            .resolve_contracts(
                &config.broker.url,
                &config.broker.target_tag,
                &config.consumer_filter(),
            )
            .map_err(|err| CliError::new(err.to_string()))
    })
    .await
    .map_err(|err| CliError::new(format!("broker task failed: {err}")))??;
    for url in &contracts {
        write_stdout_line(url).map_err(|err| CliError::new(output_error(&err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Binds the provider listener on loopback; port `0` lets the OS choose.
async fn bind_listener(port: Option<u16>) -> CliResult<(TcpListener, u16)> {
    let requested = port.unwrap_or(0);
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, requested))
        .await
        .map_err(|err| CliError::new(format!("failed to bind port {requested}: {err}")))?;
    let bound = listener
        .local_addr()
        .map_err(|err| CliError::new(format!("failed to read bound address: {err}")))?
        .port();
    Ok((listener, bound))
}

/// Serves the instrumented provider in the foreground.
async fn command_serve(config: &PactGateConfig, command: ServeCommand) -> CliResult<ExitCode> {
    let (listener, port) = bind_listener(command.port.or(config.provider.port)).await?;
    let store = Arc::new(ProviderStateStore::new());
    if let Some(state) = &command.state {
        store.set_active(ProviderState::from_name(state));
    }
    write_stdout_line(&format!("provider listening on http://127.0.0.1:{port}"))
        .map_err(|err| CliError::new(output_error(&err)))?;
    info!(port, state = %store.active_state(), "serving provider");
    serve(listener, store).await.map_err(|err| CliError::new(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(error: &std::io::Error) -> String {
    format!("failed to write to stdout: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
