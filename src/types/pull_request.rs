//! Pull request types and the review lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::user::UserId;

/// Maximum number of reviewers a pull request can carry.
pub const MAX_REVIEWERS: usize = 2;

/// Unique, caller-assigned identifier for a pull request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestId(String);

impl PullRequestId {
    /// Create a new PullRequestId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PullRequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PullRequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle state of a pull request.
///
/// `Open` is the initial state; `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
    /// Open for review; reviewers may be reassigned.
    Open,
    /// Merged; the reviewer set is frozen.
    Merged,
}

impl PrStatus {
    /// Parse a status from its stored representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "MERGED" => Some(Self::Merged),
            _ => None,
        }
    }

    /// Stored representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl Default for PrStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request with its assigned reviewers.
///
/// `assigned_reviewers` keeps slot order: a reassignment replaces a reviewer
/// in place, so the other slot never moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Unique identifier.
    pub pull_request_id: PullRequestId,
    /// Free-text title.
    pub pull_request_name: String,
    /// Author of the pull request.
    pub author_id: UserId,
    /// Lifecycle state.
    pub status: PrStatus,
    /// Reviewers in slot order (at most [`MAX_REVIEWERS`], never the author).
    pub assigned_reviewers: Vec<UserId>,
    /// Set by the store on creation.
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Set exactly once, on the first merge.
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none", default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Whether the pull request has been merged.
    pub fn is_merged(&self) -> bool {
        self.status == PrStatus::Merged
    }

    /// Whether `user_id` is currently one of the reviewers.
    pub fn is_reviewer_assigned(&self, user_id: &UserId) -> bool {
        self.assigned_reviewers.contains(user_id)
    }

    /// Short listing form.
    pub fn to_short(&self) -> PullRequestShort {
        PullRequestShort {
            pull_request_id: self.pull_request_id.clone(),
            pull_request_name: self.pull_request_name.clone(),
            author_id: self.author_id.clone(),
            status: self.status,
        }
    }
}

/// Pull request as it appears in review listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
    /// Unique identifier.
    pub pull_request_id: PullRequestId,
    /// Free-text title.
    pub pull_request_name: String,
    /// Author of the pull request.
    pub author_id: UserId,
    /// Lifecycle state.
    pub status: PrStatus,
}

/// A pull request about to be persisted.
///
/// Timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    /// Unique identifier.
    pub pull_request_id: PullRequestId,
    /// Free-text title.
    pub pull_request_name: String,
    /// Author of the pull request.
    pub author_id: UserId,
    /// Reviewers chosen at creation time.
    pub assigned_reviewers: Vec<UserId>,
}
