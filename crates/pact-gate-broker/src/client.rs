// crates/pact-gate-broker/src/client.rs
// ============================================================================
// Module: Broker Client
// Description: HTTP client for the broker's latest-pacts listing.
// Purpose: Fetch and filter pact links for a provider and tag.
// Dependencies: pact-gate-core, reqwest, serde_json, thiserror, tracing, url
// ============================================================================

//! ## Overview
//! Queries `GET {broker}/pacts/provider/{provider}/latest/{tag}` and selects
//! pact hrefs with a consumer filter. Non-success status codes, oversized
//! bodies, and malformed JSON fail the query.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use pact_gate_core::BrokerCredentials;
use pact_gate_core::BrokerPactList;
use pact_gate_core::ConsumerFilter;
use pact_gate_core::ContractLinkSet;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use url::Url;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted size of a broker listing body.
pub const MAX_LISTING_BYTES: usize = 4 * 1024 * 1024;

/// Accept header sent with broker queries.
const HAL_ACCEPT: &str = "application/hal+json, application/json";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by broker queries.
///
/// # Invariants
/// - Every query failure renders with a `broker query failed` prefix.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The HTTP client could not be constructed.
    #[error("broker client setup failed: {0}")]
    Client(String),
    /// The listing URL could not be built.
    #[error("broker query failed: invalid url: {0}")]
    InvalidUrl(String),
    /// The request could not be sent or the body could not be read.
    #[error("broker query failed: {0}")]
    Transport(String),
    /// The broker answered with a non-success status.
    #[error("broker query failed: http status {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// The listing exceeded [`MAX_LISTING_BYTES`].
    #[error("broker query failed: listing exceeds {max_bytes} bytes")]
    TooLarge {
        /// Configured maximum.
        max_bytes: usize,
    },
    /// The body was not a valid listing.
    #[error("broker query failed: malformed listing: {0}")]
    Decode(String),
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Settings for [`BrokerClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerClientConfig {
    /// Provider name used in the listing path.
    pub provider: String,
    /// Optional basic-auth credentials.
    pub credentials: Option<BrokerCredentials>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl BrokerClientConfig {
    /// Creates a config for the provider with no credentials and a 30s timeout.
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            credentials: None,
            timeout: Duration::from_secs(30),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking client for broker discovery.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    /// HTTP client used for listing requests.
    client: Client,
    /// Provider name, credentials, and timeout.
    config: BrokerClientConfig,
}

impl BrokerClient {
    /// Builds a client with a default HTTP client honoring `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Client`] when the HTTP client cannot be constructed.
    pub fn new(config: BrokerClientConfig) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| BrokerError::Client(err.to_string()))?;
        Ok(Self {
            client,
            config,
        })
    }

    /// Creates a broker client with a preconfigured HTTP client.
    #[must_use]
    pub const fn with_client(client: Client, config: BrokerClientConfig) -> Self {
        Self {
            client,
            config,
        }
    }

    /// Returns the provider name this client queries for.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    /// Builds the latest-pacts listing URL for a tag.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::InvalidUrl`] when the result is not an http(s) URL.
    pub fn listing_url(&self, broker_url: &str, target_tag: &str) -> Result<Url, BrokerError> {
        let raw = format!(
            "{}/pacts/provider/{}/latest/{}",
            broker_url.trim_end_matches('/'),
            self.config.provider,
            target_tag
        );
        let url = Url::parse(&raw).map_err(|err| BrokerError::InvalidUrl(format!("{raw}: {err}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(BrokerError::InvalidUrl(format!("unsupported scheme: {scheme}"))),
        }
    }

    /// Fetches and decodes the listing for a tag.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] on transport, status, size, or decode failures.
    pub fn fetch_links(
        &self,
        broker_url: &str,
        target_tag: &str,
    ) -> Result<ContractLinkSet, BrokerError> {
        let url = self.listing_url(broker_url, target_tag)?;
        debug!(url = %url, "querying broker");
        let mut request = self.client.get(url.as_str()).header(ACCEPT, HAL_ACCEPT);
        if let Some(credentials) = &self.config.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        let response = request.send().map_err(|err| BrokerError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(BrokerError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        if let Some(length) = response.content_length()
            && usize::try_from(length).map_or(true, |length| length > MAX_LISTING_BYTES)
        {
            return Err(BrokerError::TooLarge {
                max_bytes: MAX_LISTING_BYTES,
            });
        }
        let limit = u64::try_from(MAX_LISTING_BYTES).unwrap_or(u64::MAX).saturating_add(1);
        let mut bytes = Vec::new();
        response
            .take(limit)
            .read_to_end(&mut bytes)
            .map_err(|err| BrokerError::Transport(err.to_string()))?;
        if bytes.len() > MAX_LISTING_BYTES {
            return Err(BrokerError::TooLarge {
                max_bytes: MAX_LISTING_BYTES,
            });
        }
        let listing: BrokerPactList =
            serde_json::from_slice(&bytes).map_err(|err| BrokerError::Decode(err.to_string()))?;
        Ok(listing.links)
    }

    /// Resolves the pact URLs for a tag, filtered by consumer.
    ///
    /// Hrefs are returned exactly as the broker listed them, in broker order.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when the listing cannot be fetched or decoded.
    pub fn resolve_contracts(
        &self,
        broker_url: &str,
        target_tag: &str,
        consumer: &ConsumerFilter,
    ) -> Result<Vec<String>, BrokerError> {
        let links = self.fetch_links(broker_url, target_tag)?;
        let selected = links.select(consumer);
        info!(
            provider = %self.config.provider,
            tag = target_tag,
            consumer = %consumer,
            listed = links.pacts.len(),
            selected = selected.len(),
            "resolved broker contracts"
        );
        Ok(selected)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
