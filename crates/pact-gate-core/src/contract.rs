// crates/pact-gate-core/src/contract.rs
// ============================================================================
// Module: Contract Links
// Description: Broker HAL links describing discoverable pact documents.
// Purpose: Decode broker listings and select the links a run should verify.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The broker lists pacts for a provider/tag pair as a HAL `_links` object.
//! [`ContractLinkSet`] mirrors that object and [`ConsumerFilter`] selects the
//! subset of hrefs that applies to a run.
//! Invariants:
//! - `pacts` keeps broker order.
//! - Selected hrefs are returned unmodified.
//! - Named filters use substring matching on `/consumer/{name}`, so a name
//!   that is a prefix of another consumer also matches that consumer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sentinel consumer name selecting every pact for the provider.
///
/// Matching is case-sensitive: `<ALL>` is treated as a consumer name.
pub const ALL_CONSUMERS: &str = "<all>";

// ============================================================================
// SECTION: Links
// ============================================================================

/// A single discoverable contract document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractLink {
    /// Absolute URI of the linked resource.
    pub href: String,
}

impl ContractLink {
    /// Creates a link for the provided href.
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
        }
    }
}

/// HAL `_links` object returned by the broker's latest-pacts listing.
///
/// # Invariants
/// - `pacts` preserves the order the broker returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractLinkSet {
    /// Link to the listing itself.
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<ContractLink>,
    /// Link to the provider resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ContractLink>,
    /// Links to the individual pact documents.
    #[serde(default)]
    pub pacts: Vec<ContractLink>,
}

impl ContractLinkSet {
    /// Returns the hrefs of every pact accepted by `filter`, in broker order.
    #[must_use]
    pub fn select(&self, filter: &ConsumerFilter) -> Vec<String> {
        self.pacts
            .iter()
            .filter(|link| filter.matches(&link.href))
            .map(|link| link.href.clone())
            .collect()
    }
}

/// Top-level body of `GET /pacts/provider/{provider}/latest/{tag}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerPactList {
    /// HAL links section.
    #[serde(rename = "_links")]
    pub links: ContractLinkSet,
}

// ============================================================================
// SECTION: Consumer Filter
// ============================================================================

/// Consumer selection applied to broker pact links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerFilter {
    /// Every pact is selected.
    All,
    /// Only pacts whose href contains `/consumer/{name}`.
    Named(String),
}

impl ConsumerFilter {
    /// Parses a consumer setting, mapping [`ALL_CONSUMERS`] to [`Self::All`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == ALL_CONSUMERS {
            Self::All
        } else {
            Self::Named(raw.to_string())
        }
    }

    /// Returns true when the href is selected by this filter.
    #[must_use]
    pub fn matches(&self, href: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => href.contains(&format!("/consumer/{name}")),
        }
    }
}

impl fmt::Display for ConsumerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_CONSUMERS),
            Self::Named(name) => f.write_str(name),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
