// crates/pact-gate-provider/src/fixtures.rs
// ============================================================================
// Module: Provider Fixtures
// Description: Named user datasets backing the provider under test.
// Purpose: Map provider state names to immutable user repositories.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each [`ProviderState`] owns one [`UserRepository`] fixture. State names are
//! decoded into the closed enum with an explicit default arm, so an unknown
//! name always installs the empty "user absent" dataset.
//! Invariants:
//! - Repositories are never mutated after construction.
//! - Name matching is exact and case-sensitive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Users
// ============================================================================

/// Account classification exposed by the login route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    /// Full access.
    Admin,
    /// Account is locked out.
    Blocked,
}

/// A user record in a fixture repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name.
    pub name: String,
    /// Login name.
    pub username: String,
    /// Login password; never serialized.
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Account classification.
    #[serde(rename = "type")]
    pub kind: UserKind,
}

/// Immutable user dataset keyed by username.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRepository {
    /// Users keyed by username.
    users: BTreeMap<String, User>,
}

impl UserRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a repository containing `users`, keyed by username.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|user| (user.username.clone(), user)).collect(),
        }
    }

    /// Looks up a user by login name.
    #[must_use]
    pub fn by_username(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// Returns the number of users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns true when the repository holds no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

// ============================================================================
// SECTION: Provider States
// ============================================================================

/// Known provider states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderState {
    /// `billy` exists as an admin with the correct password.
    UserExists,
    /// `billy` exists but is blocked and has a different password.
    UserUnauthorized,
    /// No users. Every unrecognized state name maps here.
    UserAbsent,
}

impl ProviderState {
    /// State name for [`Self::UserExists`].
    pub const USER_EXISTS: &'static str = "User billy exists";
    /// State name for [`Self::UserUnauthorized`].
    pub const USER_UNAUTHORIZED: &'static str = "User billy is unauthorized";
    /// State name for [`Self::UserAbsent`].
    pub const USER_ABSENT: &'static str = "User billy does not exist";

    /// Decodes a state name; unknown names resolve to [`Self::UserAbsent`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            Self::USER_EXISTS => Self::UserExists,
            Self::USER_UNAUTHORIZED => Self::UserUnauthorized,
            _ => Self::UserAbsent,
        }
    }

    /// Returns the canonical state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserExists => Self::USER_EXISTS,
            Self::UserUnauthorized => Self::USER_UNAUTHORIZED,
            Self::UserAbsent => Self::USER_ABSENT,
        }
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Prebuilt repositories for every [`ProviderState`].
///
/// # Invariants
/// - [`FixtureCatalog::repository`] returns the same `Arc` for a state on
///   every call.
#[derive(Debug, Clone)]
pub struct FixtureCatalog {
    /// Fixture for [`ProviderState::UserExists`].
    exists: Arc<UserRepository>,
    /// Fixture for [`ProviderState::UserUnauthorized`].
    unauthorized: Arc<UserRepository>,
    /// Fixture for [`ProviderState::UserAbsent`].
    absent: Arc<UserRepository>,
}

impl FixtureCatalog {
    /// Returns the repository for a state.
    #[must_use]
    pub fn repository(&self, state: ProviderState) -> Arc<UserRepository> {
        match state {
            ProviderState::UserExists => Arc::clone(&self.exists),
            ProviderState::UserUnauthorized => Arc::clone(&self.unauthorized),
            ProviderState::UserAbsent => Arc::clone(&self.absent),
        }
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self {
            exists: Arc::new(UserRepository::with_users([User {
                name: "billy".to_string(),
                username: "billy".to_string(),
                password: "issilly".to_string(),
                kind: UserKind::Admin,
            }])),
            unauthorized: Arc::new(UserRepository::with_users([User {
                name: "billy".to_string(),
                username: "billy".to_string(),
                password: "issilly1".to_string(),
                kind: UserKind::Blocked,
            }])),
            absent: Arc::new(UserRepository::new()),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
