//! User types for the review roster.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a user.
///
/// Identifiers are assigned by the caller (e.g. `"u1"`) and compared
/// byte-wise, which gives the store a deterministic roster order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A user and the single team they belong to.
///
/// The active flag only controls reviewer eligibility. Inactive users stay
/// on their team's roster and keep any reviews they were already given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Name of the team the user belongs to.
    pub team_name: String,
    /// Whether the user may be picked as a reviewer.
    pub is_active: bool,
}

impl User {
    /// Create a new user.
    pub fn new(
        user_id: impl Into<UserId>,
        username: impl Into<String>,
        team_name: impl Into<String>,
        is_active: bool,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            team_name: team_name.into(),
            is_active,
        }
    }

    /// Project this user onto its roster entry.
    pub fn as_member(&self) -> TeamMember {
        TeamMember {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            is_active: self.is_active,
        }
    }
}

/// A user as listed on a team roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Unique user identifier.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Whether the user may be picked as a reviewer.
    pub is_active: bool,
}

impl TeamMember {
    /// Create a new roster entry.
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_active,
        }
    }

    /// Bind this roster entry to a team, producing the stored user.
    pub fn into_user(self, team_name: impl Into<String>) -> User {
        User {
            user_id: self.user_id,
            username: self.username,
            team_name: team_name.into(),
            is_active: self.is_active,
        }
    }
}
