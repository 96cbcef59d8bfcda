//! Review storage backends.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use crate::types::{
    NewPullRequest, PullRequest, PullRequestId, PullRequestShort, Stats, Team, User, UserId,
    UserStats,
};

/// Trait for review storage backends.
///
/// Backends own no behavior beyond CRUD and constraints, but every mutation
/// here is a single atomic unit: readers never observe a pull request
/// without its reviewer rows, a half-merged row, or a half-created team.
/// Conflicts are reported through return values (`false` / `None`) rather
/// than errors, so `Self::Error` only ever carries infrastructure failures.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a team and upsert its members bound to it.
    ///
    /// Returns `false` (and writes nothing) if the team name is taken.
    /// Existing users listed as members are moved to this team and their
    /// name and active flag overwritten.
    async fn create_team(&self, team: &Team) -> Result<bool, Self::Error>;

    /// Fetch a team with all members (active or not), ordered by user id.
    async fn get_team(&self, team_name: &str) -> Result<Option<Team>, Self::Error>;

    /// Fetch a user by id.
    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, Self::Error>;

    /// Set a user's active flag, returning the updated user.
    async fn set_user_active(
        &self,
        user_id: &UserId,
        is_active: bool,
    ) -> Result<Option<User>, Self::Error>;

    /// Active members of a team, ordered by user id.
    async fn active_team_members(&self, team_name: &str) -> Result<Vec<User>, Self::Error>;

    /// Insert an OPEN pull request together with its reviewer rows.
    ///
    /// The store assigns `created_at`. Returns `false` if the id is taken.
    async fn insert_pull_request(&self, pr: &NewPullRequest) -> Result<bool, Self::Error>;

    /// Fetch a pull request with reviewers in slot order.
    async fn get_pull_request(
        &self,
        id: &PullRequestId,
    ) -> Result<Option<PullRequest>, Self::Error>;

    /// Transition to MERGED if not already merged, returning the row either way.
    ///
    /// `merged_at` is written only on the first transition.
    async fn merge_pull_request(
        &self,
        id: &PullRequestId,
    ) -> Result<Option<PullRequest>, Self::Error>;

    /// Compare-and-swap one reviewer slot: replace `old` with `new` in `id`.
    ///
    /// Applies only while the pull request is OPEN, `old` holds a slot and
    /// `new` holds none. Returns `false` when any of those no longer hold
    /// (a concurrent caller got there first); nothing is written then.
    async fn replace_reviewer(
        &self,
        id: &PullRequestId,
        old: &UserId,
        new: &UserId,
    ) -> Result<bool, Self::Error>;

    /// Pull requests (any status) reviewed by `user_id`, newest first.
    async fn pull_requests_by_reviewer(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PullRequestShort>, Self::Error>;

    /// Review statistics for every user plus aggregate counts.
    async fn stats(&self) -> Result<Stats, Self::Error>;

    /// Review statistics for one user.
    async fn user_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, Self::Error>;

    /// Whether the backend is reachable.
    async fn is_healthy(&self) -> bool {
        true
    }
}

pub use memory::{InMemoryError, InMemoryReviewStore};

#[cfg(feature = "postgres")]
pub use postgres::{PoolStats, PostgresConfig, PostgresError, PostgresReviewStore};
