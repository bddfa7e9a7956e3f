// crates/pact-gate-provider/src/server.rs
// ============================================================================
// Module: Instrumented Provider Instance
// Description: Ephemeral listener serving business routes and the switchboard.
// Purpose: Run the provider under test on a run-scoped loopback port.
// Dependencies: axum, pact-gate-core, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! [`InstrumentedProvider::spawn`] binds the caller's port synchronously and
//! serves on a background thread with its own Tokio runtime. The returned
//! [`ProviderHandle`] exposes an explicit readiness signal and a graceful
//! shutdown; dropping it leaves the server running.
//! Invariants:
//! - Bind failures are returned before any thread is started.
//! - Business routes and [`STATE_SETUP_PATH`] share one router and listener.
//! - The port never changes after bind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use axum::Router;
use axum::routing::post;
use pact_gate_core::ProviderEndpoints;
use pact_gate_core::STATE_SETUP_PATH;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use tracing::info;

use crate::login::login;
use crate::store::ProviderStateStore;
use crate::switchboard::setup_state;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Content type used on every provider response.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Path of the login business route.
pub const LOGIN_PATH: &str = "/users/login";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while starting or running the provider instance.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The listener could not be bound.
    #[error("provider bind failed on port {port}: {message}")]
    Bind {
        /// Requested port.
        port: u16,
        /// OS error text.
        message: String,
    },
    /// The server runtime failed.
    #[error("provider runtime failed: {0}")]
    Runtime(String),
    /// The server did not signal readiness.
    #[error("provider not ready: {0}")]
    NotReady(String),
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the provider router: business routes plus the switchboard.
pub fn router(store: Arc<ProviderStateStore>) -> Router {
    Router::new()
        .route(LOGIN_PATH, post(login))
        .route(STATE_SETUP_PATH, post(setup_state))
        .with_state(store)
}

/// Asks the OS for an unused loopback port.
///
/// # Errors
///
/// Returns [`ProviderError::Bind`] when no ephemeral port can be bound.
pub fn free_port() -> Result<u16, ProviderError> {
    let listener = StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0)).map_err(|err| {
        ProviderError::Bind {
            port: 0,
            message: err.to_string(),
        }
    })?;
    let addr = listener.local_addr().map_err(|err| ProviderError::Bind {
        port: 0,
        message: err.to_string(),
    })?;
    Ok(addr.port())
}

/// Serves the provider on an already bound listener until it closes.
///
/// # Errors
///
/// Returns [`ProviderError::Runtime`] when the server loop fails.
pub async fn serve(listener: TcpListener, store: Arc<ProviderStateStore>) -> Result<(), ProviderError> {
    axum::serve(listener, router(store)).await.map_err(|err| ProviderError::Runtime(err.to_string()))
}

// ============================================================================
// SECTION: Background Instance
// ============================================================================

/// Launcher for background provider instances.
#[derive(Debug, Clone, Copy)]
pub struct InstrumentedProvider;

impl InstrumentedProvider {
    /// Binds `127.0.0.1:{port}` and serves the provider in the background.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Bind`] when the port cannot be bound and
    /// [`ProviderError::Runtime`] when the server thread cannot start.
    pub fn spawn(port: u16, store: Arc<ProviderStateStore>) -> Result<ProviderHandle, ProviderError> {
        let bind_error = |err: std::io::Error| ProviderError::Bind {
            port,
            message: err.to_string(),
        };
        let listener = StdTcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
            .map_err(bind_error)?;
        listener.set_nonblocking(true).map_err(bind_error)?;
        let bound = listener.local_addr().map_err(bind_error)?.port();
        let endpoints = ProviderEndpoints::new(bound);

        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(store);
        let join = thread::Builder::new()
            .name(format!("pact-gate-provider-{bound}"))
            .spawn(move || -> Result<(), ProviderError> {
                let runtime = Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|err| ProviderError::Runtime(err.to_string()))?;
                runtime.block_on(async move {
                    let listener = TcpListener::from_std(listener)
                        .map_err(|err| ProviderError::Runtime(err.to_string()))?;
                    let _ = ready_tx.send(());
                    axum::serve(listener, app)
                        .with_graceful_shutdown(async move {
                            // A dropped handle detaches the server instead of stopping it.
                            if shutdown_rx.await.is_err() {
                                std::future::pending::<()>().await;
                            }
                        })
                        .await
                        .map_err(|err| ProviderError::Runtime(err.to_string()))
                })
            })
            .map_err(|err| ProviderError::Runtime(err.to_string()))?;
        info!(port = bound, base_url = %endpoints.base_url(), "provider instance starting");
        Ok(ProviderHandle {
            endpoints,
            ready: ready_rx,
            is_ready: false,
            shutdown: Some(shutdown_tx),
            join: Some(join),
        })
    }
}

/// Handle to a background provider instance.
///
/// Dropping the handle detaches the server thread; it keeps serving until the
/// process exits.
#[derive(Debug)]
pub struct ProviderHandle {
    /// Endpoints derived from the bound port.
    endpoints: ProviderEndpoints,
    /// Fired once the server loop owns the listener.
    ready: mpsc::Receiver<()>,
    /// Whether readiness has already been observed.
    is_ready: bool,
    /// Graceful shutdown trigger.
    shutdown: Option<oneshot::Sender<()>>,
    /// Server thread.
    join: Option<thread::JoinHandle<Result<(), ProviderError>>>,
}

impl ProviderHandle {
    /// Returns the endpoints of this instance.
    #[must_use]
    pub const fn endpoints(&self) -> ProviderEndpoints {
        self.endpoints
    }

    /// Blocks until the server is accepting connections or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotReady`] on timeout or if the server thread
    /// exited before signalling.
    pub fn wait_ready(&mut self, timeout: Duration) -> Result<(), ProviderError> {
        if self.is_ready {
            return Ok(());
        }
        match self.ready.recv_timeout(timeout) {
            Ok(()) => {
                self.is_ready = true;
                info!(port = self.endpoints.port(), "provider instance ready");
                Ok(())
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ProviderError::NotReady(format!(
                "no readiness signal within {} ms",
                timeout.as_millis()
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ProviderError::NotReady(
                "server thread exited before accepting connections".to_string(),
            )),
        }
    }

    /// Stops the server gracefully and waits for its thread.
    ///
    /// # Errors
    ///
    /// Returns the server loop's error, or [`ProviderError::Runtime`] if the
    /// thread panicked.
    pub fn shutdown(mut self) -> Result<(), ProviderError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let Some(join) = self.join.take() else {
            return Ok(());
        };
        join.join().map_err(|_| ProviderError::Runtime("server thread panicked".to_string()))?
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
