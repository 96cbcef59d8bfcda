//! # review-roster
//!
//! Pull request review assignment for teams.
//!
//! The service answers one question:
//!
//! > Given a new pull request, which of the author's teammates should review it?
//!
//! ## Core Contract
//!
//! 1. A new pull request gets up to two reviewers, drawn uniformly at random
//!    from the author's *active* teammates, never the author
//! 2. A reviewer of an open pull request can be swapped for another active
//!    member of the reviewer's team, keeping their slot
//! 3. Merging is idempotent; once merged the reviewer set is frozen
//!
//! ## Architecture
//!
//! ```text
//! HTTP (axum) → PullRequestLifecycle ─┬─▶ ReviewerSelector (seedable RNG)
//!             → TeamDirectory         └─▶ ReviewStore (Postgres or Memory)
//! ```
//!
//! ## Consistency Guarantees
//!
//! - Pull request creation, team creation and merge are single atomic units
//! - Reassignment is an optimistic compare-and-swap: a lost race surfaces
//!   as `PR_MERGED` or `NOT_ASSIGNED`, never as a partial write
//! - `mergedAt` is written exactly once

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod membership;
pub mod selector;
pub mod store;
pub mod types;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use auth::{
    AuthError, Authenticated, CacheConfig, Claims, CredentialIssuer, CredentialVerifier,
    VerificationMode,
};
pub use config::{ConfigError, ServiceConfig};
pub use error::{ErrorCode, ReviewError};
pub use lifecycle::PullRequestLifecycle;
pub use membership::TeamDirectory;
pub use selector::ReviewerSelector;
pub use store::{InMemoryError, InMemoryReviewStore, ReviewStore};
#[cfg(feature = "postgres")]
pub use store::{PostgresConfig, PostgresError, PostgresReviewStore};
pub use types::{
    NewPullRequest, PrStats, PrStatus, PullRequest, PullRequestId, PullRequestShort, Stats, Team,
    TeamMember, User, UserId, UserStats, MAX_REVIEWERS,
};

#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};
