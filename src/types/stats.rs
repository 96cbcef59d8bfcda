//! Reporting types for review statistics.

use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Review load for a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    /// User identifier.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Pull requests the user is currently assigned to review (any status).
    pub review_assignments: u64,
    /// Pull requests the user authored.
    pub authored_prs: u64,
    /// Assigned pull requests that are still open.
    pub active_reviews: u64,
}

/// Aggregate pull request counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrStats {
    /// All pull requests.
    pub total_prs: u64,
    /// Pull requests in `OPEN`.
    pub open_prs: u64,
    /// Pull requests in `MERGED`.
    pub merged_prs: u64,
    /// Reviewer assignments across all pull requests.
    pub total_reviewers: u64,
}

/// Combined statistics report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Per-user load, busiest reviewers first.
    pub user_stats: Vec<UserStats>,
    /// Aggregate counts.
    pub pr_stats: PrStats,
}
