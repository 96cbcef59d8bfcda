//! Core types for the review roster.

pub mod user;
pub mod team;
pub mod pull_request;
pub mod stats;

pub use user::{UserId, User, TeamMember};
pub use team::Team;
pub use pull_request::{
    PullRequestId, PullRequest, PullRequestShort, NewPullRequest, PrStatus, MAX_REVIEWERS,
};
pub use stats::{UserStats, PrStats, Stats};
