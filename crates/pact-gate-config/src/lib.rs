// crates/pact-gate-config/src/lib.rs
// ============================================================================
// Module: Pact Gate Configuration
// Description: Run configuration with file, environment, and default layers.
// Purpose: Parameterize a verification run and validate it before use.
// Dependencies: pact-gate-core, serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! [`PactGateConfig`] describes the broker to query, the provider under test,
//! and how verification is performed. Layers apply in order: built-in
//! defaults, an optional TOML file, then environment variables. Callers may
//! override individual fields afterwards (the CLI does so for flags) and must
//! call [`PactGateConfig::validate`] again.
//! Invariants:
//! - Config files are capped at [`MAX_CONFIG_BYTES`] and must be UTF-8.
//! - Unknown TOML keys are rejected.
//! - Broker credentials are either fully present or fully absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::time::Duration;

use pact_gate_core::BrokerCredentials;
use pact_gate_core::ConsumerFilter;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Limits and Keys
// ============================================================================

/// Maximum size of a config file.
pub const MAX_CONFIG_BYTES: usize = 1024 * 1024;

/// Environment variable names read by [`PactGateConfig::apply_env_with`].
pub mod env_keys {
    /// Broker base URL.
    pub const BROKER_URL: &str = "PACT_BROKER_URL";
    /// Target environment tag.
    pub const TARGET_ENV: &str = "PACT_TARGET_ENV";
    /// Consumer filter.
    pub const CONSUMER: &str = "CONSUMER";
    /// Broker username.
    pub const BROKER_USERNAME: &str = "PACT_BROKER_USERNAME";
    /// Broker password.
    pub const BROKER_PASSWORD: &str = "PACT_BROKER_PASSWORD";
    /// Broker request timeout in milliseconds.
    pub const BROKER_TIMEOUT_MS: &str = "PACT_BROKER_TIMEOUT_MS";
    /// Provider name.
    pub const PROVIDER_NAME: &str = "PACT_PROVIDER_NAME";
    /// Provider version.
    pub const PROVIDER_VERSION: &str = "PACT_PROVIDER_VERSION";
    /// Fixed provider port.
    pub const PROVIDER_PORT: &str = "PACT_PROVIDER_PORT";
    /// Publish verification results.
    pub const PUBLISH_RESULTS: &str = "PACT_PUBLISH_RESULTS";
    /// Verifier executable.
    pub const VERIFIER_PATH: &str = "PACT_VERIFIER_PATH";
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// The config file is not valid TOML for this schema.
    #[error("config parse error: {0}")]
    Parse(String),
    /// An environment variable held an unusable value.
    #[error("invalid environment value for {key}: {message}")]
    Env {
        /// Variable name.
        key: &'static str,
        /// Reason.
        message: String,
    },
    /// The merged config violates an invariant.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Broker query settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    /// Broker base URL.
    pub url: String,
    /// Tag selecting the latest pacts (for example an environment name).
    pub target_tag: String,
    /// Consumer name, or `<all>`.
    pub consumer: String,
    /// Optional basic-auth username.
    pub username: Option<String>,
    /// Optional basic-auth password.
    pub password: Option<String>,
    /// Broker request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "http://pact-broker.keyshift.co:80".to_string(),
            target_tag: "master".to_string(),
            consumer: pact_gate_core::ALL_CONSUMERS.to_string(),
            username: None,
            password: None,
            timeout_ms: 30_000,
        }
    }
}

/// Provider under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Provider name as registered in the broker.
    pub name: String,
    /// Application version reported with results.
    pub version: String,
    /// Fixed port; a free port is chosen when absent.
    pub port: Option<u16>,
    /// Maximum wait for the instance to accept connections, in milliseconds.
    pub ready_timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "bobby".to_string(),
            version: "1.0.0".to_string(),
            port: None,
            ready_timeout_ms: 5_000,
        }
    }
}

/// Verification engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerificationConfig {
    /// Publish results to the broker.
    pub publish_results: bool,
    /// Verifier executable name or path.
    pub verifier_path: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            publish_results: true,
            verifier_path: "pact-provider-verifier".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PactGateConfig {
    /// Broker settings.
    pub broker: BrokerConfig,
    /// Provider settings.
    pub provider: ProviderConfig,
    /// Verification settings.
    pub verification: VerificationConfig,
}

impl PactGateConfig {
    /// Loads defaults, the optional file, and the process environment, then
    /// validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any layer is unreadable or the result is
    /// invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Like [`Self::load`] with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any layer is unreadable or the result is
    /// invalid.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for oversized, non-UTF-8, or malformed files.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::Io("config file exceeds size limit".to_string()));
        }
        let text = String::from_utf8(bytes)
            .map_err(|_| ConfigError::Io("config file must be utf-8".to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Overrides fields from environment variables returned by `lookup`.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] when a numeric or boolean value is malformed.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        if let Some(value) = get(env_keys::BROKER_URL) {
            self.broker.url = value;
        }
        if let Some(value) = get(env_keys::TARGET_ENV) {
            self.broker.target_tag = value;
        }
        if let Some(value) = get(env_keys::CONSUMER) {
            self.broker.consumer = value;
        }
        if let Some(value) = get(env_keys::BROKER_USERNAME) {
            self.broker.username = Some(value);
        }
        if let Some(value) = get(env_keys::BROKER_PASSWORD) {
            self.broker.password = Some(value);
        }
        if let Some(value) = get(env_keys::BROKER_TIMEOUT_MS) {
            self.broker.timeout_ms = parse_number(env_keys::BROKER_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = get(env_keys::PROVIDER_NAME) {
            self.provider.name = value;
        }
        if let Some(value) = get(env_keys::PROVIDER_VERSION) {
            self.provider.version = value;
        }
        if let Some(value) = get(env_keys::PROVIDER_PORT) {
            self.provider.port = Some(parse_number(env_keys::PROVIDER_PORT, &value)?);
        }
        if let Some(value) = get(env_keys::PUBLISH_RESULTS) {
            self.verification.publish_results = parse_bool(env_keys::PUBLISH_RESULTS, &value)?;
        }
        if let Some(value) = get(env_keys::VERIFIER_PATH) {
            self.verification.verifier_path = value;
        }
        Ok(())
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.broker.url)
            .map_err(|err| ConfigError::Invalid(format!("broker.url: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "broker.url must use http or https, got {}",
                url.scheme()
            )));
        }
        require_non_empty("broker.target_tag", &self.broker.target_tag)?;
        require_non_empty("broker.consumer", &self.broker.consumer)?;
        require_non_empty("provider.name", &self.provider.name)?;
        require_non_empty("provider.version", &self.provider.version)?;
        require_non_empty("verification.verifier_path", &self.verification.verifier_path)?;
        if self.broker.username.is_some() != self.broker.password.is_some() {
            return Err(ConfigError::Invalid(
                "broker.username and broker.password must be set together".to_string(),
            ));
        }
        if self.broker.timeout_ms == 0 {
            return Err(ConfigError::Invalid("broker.timeout_ms must be non-zero".to_string()));
        }
        if self.provider.ready_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "provider.ready_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.provider.port == Some(0) {
            return Err(ConfigError::Invalid("provider.port must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Returns the consumer filter for the configured consumer.
    #[must_use]
    pub fn consumer_filter(&self) -> ConsumerFilter {
        ConsumerFilter::parse(&self.broker.consumer)
    }

    /// Returns broker credentials when both halves are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<BrokerCredentials> {
        match (&self.broker.username, &self.broker.password) {
            (Some(username), Some(password)) => Some(BrokerCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    /// Returns the broker request timeout.
    #[must_use]
    pub const fn broker_timeout(&self) -> Duration {
        Duration::from_millis(self.broker.timeout_ms)
    }

    /// Returns the provider readiness timeout.
    #[must_use]
    pub const fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.provider.ready_timeout_ms)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects empty or whitespace-only values.
fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Parses a numeric environment value.
fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| ConfigError::Env {
        key,
        message: err.to_string(),
    })
}

/// Parses a boolean environment value.
fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::Env {
            key,
            message: format!("expected a boolean, got {other}"),
        }),
    }
}
