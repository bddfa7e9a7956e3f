// crates/pact-gate-provider/src/store.rs
// ============================================================================
// Module: Provider-State Store
// Description: Single-writer cell holding the active fixture repository.
// Purpose: Let the switchboard swap datasets while handlers read them.
// Dependencies: std, tracing
// ============================================================================

//! ## Overview
//! [`ProviderStateStore`] holds exactly one active [`UserRepository`]. The
//! switchboard is the only writer; business handlers call
//! [`ProviderStateStore::active`] once per request and work from that
//! snapshot.
//! Invariants:
//! - A swap replaces the state and repository reference together.
//! - Installed repositories are never mutated.
//! - A poisoned lock is recovered; the stored value is always complete.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use tracing::info;

use crate::fixtures::FixtureCatalog;
use crate::fixtures::ProviderState;
use crate::fixtures::UserRepository;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Active state and its repository.
#[derive(Debug, Clone)]
struct ActiveFixture {
    /// Installed state.
    state: ProviderState,
    /// Repository for `state`.
    repository: Arc<UserRepository>,
}

/// Process-wide provider fixture cell.
#[derive(Debug)]
pub struct ProviderStateStore {
    /// Prebuilt repositories for every state.
    catalog: FixtureCatalog,
    /// Currently installed fixture.
    active: RwLock<ActiveFixture>,
}

impl ProviderStateStore {
    /// Creates a store with the default catalog, starting at
    /// [`ProviderState::UserAbsent`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(FixtureCatalog::default(), ProviderState::UserAbsent)
    }

    /// Creates a store from a catalog and an initial state.
    #[must_use]
    pub fn with_catalog(catalog: FixtureCatalog, initial: ProviderState) -> Self {
        let active = ActiveFixture {
            state: initial,
            repository: catalog.repository(initial),
        };
        Self {
            catalog,
            active: RwLock::new(active),
        }
    }

    /// Returns the repository installed right now.
    #[must_use]
    pub fn active(&self) -> Arc<UserRepository> {
        let guard = self.active.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard.repository)
    }

    /// Returns the state installed right now.
    #[must_use]
    pub fn active_state(&self) -> ProviderState {
        self.active.read().unwrap_or_else(PoisonError::into_inner).state
    }

    /// Installs the repository for `state`.
    pub fn set_active(&self, state: ProviderState) {
        let repository = self.catalog.repository(state);
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *guard = ActiveFixture {
            state,
            repository,
        };
        drop(guard);
        info!(state = %state, "provider state installed");
    }
}

impl Default for ProviderStateStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
