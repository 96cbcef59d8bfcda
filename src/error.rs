//! Error taxonomy for review operations.
//!
//! Domain errors are expected outcomes of valid requests against the current
//! state and map 1:1 onto client-visible [`ErrorCode`]s. Store failures are
//! carried as [`ReviewError::Store`] and stay opaque to callers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{PullRequestId, UserId};

/// Error type for lifecycle, membership and statistics operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    /// A team with this name already exists.
    #[error("Team already exists: {0}")]
    TeamExists(String),
    /// A pull request with this id already exists.
    #[error("Pull request already exists: {0}")]
    PrExists(PullRequestId),
    /// The pull request is merged and can no longer be modified.
    #[error("Cannot modify merged pull request: {0}")]
    PrMerged(PullRequestId),
    /// The user is not a reviewer of the pull request.
    #[error("Reviewer {reviewer} is not assigned to {pull_request}")]
    NotAssigned {
        /// Pull request that was targeted.
        pull_request: PullRequestId,
        /// User that was expected to be assigned.
        reviewer: UserId,
    },
    /// No active replacement candidate is left in the team.
    #[error("No active replacement candidate in team")]
    NoCandidate,
    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    /// Team not found.
    #[error("Team not found: {0}")]
    TeamNotFound(String),
    /// Pull request not found.
    #[error("Pull request not found: {0}")]
    PrNotFound(PullRequestId),
    /// Store error.
    #[error("Store error: {0}")]
    Store(String),
}

impl ReviewError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }

    /// Client-visible code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TeamExists(_) => ErrorCode::TeamExists,
            Self::PrExists(_) => ErrorCode::PrExists,
            Self::PrMerged(_) => ErrorCode::PrMerged,
            Self::NotAssigned { .. } => ErrorCode::NotAssigned,
            Self::NoCandidate => ErrorCode::NoCandidate,
            Self::UserNotFound(_) | Self::TeamNotFound(_) | Self::PrNotFound(_) => {
                ErrorCode::NotFound
            }
            Self::Store(_) => ErrorCode::InternalError,
        }
    }

    /// Whether this is an infrastructure fault rather than a domain outcome.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Machine-readable error codes exposed in the API error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Team name taken.
    TeamExists,
    /// Pull request id taken.
    PrExists,
    /// Pull request is merged.
    PrMerged,
    /// Reviewer not assigned.
    NotAssigned,
    /// No replacement candidate.
    NoCandidate,
    /// Resource not found.
    NotFound,
    /// Missing or invalid credential.
    Unauthorized,
    /// Malformed request.
    BadRequest,
    /// Unexpected server-side failure.
    InternalError,
}

impl ErrorCode {
    /// Wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TeamExists => "TEAM_EXISTS",
            Self::PrExists => "PR_EXISTS",
            Self::PrMerged => "PR_MERGED",
            Self::NotAssigned => "NOT_ASSIGNED",
            Self::NoCandidate => "NO_CANDIDATE",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest => "BAD_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_variants_share_a_code() {
        assert_eq!(ReviewError::UserNotFound(UserId::new("u1")).code(), ErrorCode::NotFound);
        assert_eq!(ReviewError::TeamNotFound("t".into()).code(), ErrorCode::NotFound);
        assert_eq!(ReviewError::PrNotFound(PullRequestId::new("p")).code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_code_serialization_matches_as_str() {
        for code in [
            ErrorCode::TeamExists,
            ErrorCode::PrExists,
            ErrorCode::PrMerged,
            ErrorCode::NotAssigned,
            ErrorCode::NoCandidate,
            ErrorCode::NotFound,
            ErrorCode::Unauthorized,
            ErrorCode::BadRequest,
            ErrorCode::InternalError,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_only_store_errors_are_internal() {
        assert!(ReviewError::Store("connection reset".into()).is_internal());
        assert!(!ReviewError::NoCandidate.is_internal());
        assert_eq!(ReviewError::Store("x".into()).code(), ErrorCode::InternalError);
    }
}
