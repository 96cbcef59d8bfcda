//! Pull request review lifecycle.
//!
//! ```text
//!            create                 merge (idempotent)
//!   (none) ─────────▶ OPEN ─────────────────────────▶ MERGED
//!                     │  ▲
//!                     └──┘ reassign
//! ```
//!
//! The lifecycle is the only writer of pull request state. It keeps no
//! mutable state of its own beyond the selector's generator: every check
//! that matters under concurrency is re-asserted by the store's atomic
//! operations, so a lost race surfaces as a domain error, never as a
//! partial write.

use std::sync::Arc;

use crate::error::ReviewError;
use crate::selector::ReviewerSelector;
use crate::store::ReviewStore;
use crate::types::{
    NewPullRequest, PullRequest, PullRequestId, PullRequestShort, UserId, MAX_REVIEWERS,
};

/// Drives pull requests through creation, reassignment and merge.
pub struct PullRequestLifecycle<S: ReviewStore> {
    store: Arc<S>,
    selector: Arc<ReviewerSelector>,
}

impl<S: ReviewStore> Clone for PullRequestLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            selector: Arc::clone(&self.selector),
        }
    }
}

impl<S: ReviewStore + 'static> PullRequestLifecycle<S> {
    /// Create a lifecycle over a store and a reviewer selector.
    pub fn new(store: Arc<S>, selector: Arc<ReviewerSelector>) -> Self {
        Self { store, selector }
    }

    /// Create an OPEN pull request and assign up to two reviewers.
    ///
    /// Reviewers are drawn from the author's active teammates. A team with
    /// nobody eligible yields a pull request with no reviewers, not an error.
    pub async fn create(
        &self,
        id: PullRequestId,
        name: impl Into<String>,
        author_id: UserId,
    ) -> Result<PullRequest, ReviewError> {
        if self.fetch(&id).await?.is_some() {
            return Err(ReviewError::PrExists(id));
        }

        let author = self
            .store
            .get_user(&author_id)
            .await
            .map_err(ReviewError::from_store)?
            .ok_or_else(|| ReviewError::UserNotFound(author_id.clone()))?;

        let candidates: Vec<UserId> = self
            .store
            .active_team_members(&author.team_name)
            .await
            .map_err(ReviewError::from_store)?
            .into_iter()
            .map(|u| u.user_id)
            .filter(|u| *u != author_id)
            .collect();

        let reviewers = self.selector.select_reviewers(&candidates, MAX_REVIEWERS);

        let new_pr = NewPullRequest {
            pull_request_id: id.clone(),
            pull_request_name: name.into(),
            author_id,
            assigned_reviewers: reviewers,
        };

        // A concurrent create with the same id can win between the check
        // above and this insert.
        let inserted = self
            .store
            .insert_pull_request(&new_pr)
            .await
            .map_err(ReviewError::from_store)?;
        if !inserted {
            return Err(ReviewError::PrExists(id));
        }

        tracing::info!(
            pull_request_id = %id,
            author_id = %new_pr.author_id,
            team = %author.team_name,
            candidates = candidates.len(),
            reviewers = ?new_pr.assigned_reviewers,
            "Pull request created"
        );

        self.get(&id).await
    }

    /// Merge a pull request.
    ///
    /// Idempotent: merging a merged pull request returns it unchanged,
    /// including its original `merged_at`.
    pub async fn merge(&self, id: &PullRequestId) -> Result<PullRequest, ReviewError> {
        let pr = self
            .store
            .merge_pull_request(id)
            .await
            .map_err(ReviewError::from_store)?
            .ok_or_else(|| ReviewError::PrNotFound(id.clone()))?;

        tracing::info!(
            pull_request_id = %id,
            merged_at = ?pr.merged_at,
            "Pull request merged"
        );

        Ok(pr)
    }

    /// Replace `old_reviewer` with a random active member of their team.
    ///
    /// Candidates exclude every current reviewer and the author. On
    /// [`ReviewError::NoCandidate`] nothing is written and the old reviewer
    /// stays assigned. Returns the updated pull request and the new
    /// reviewer, who takes over the old reviewer's slot.
    ///
    /// Fails with [`ReviewError::NotAssigned`] when a concurrent call changes
    /// the slot first. That includes a reassignment of the other slot that
    /// claims the same replacement, even though `old_reviewer` is still
    /// assigned afterwards; the caller may retry.
    pub async fn reassign(
        &self,
        id: &PullRequestId,
        old_reviewer: &UserId,
    ) -> Result<(PullRequest, UserId), ReviewError> {
        let pr = self.get(id).await?;
        Self::check_reassignable(&pr, old_reviewer)?;

        let departing = self
            .store
            .get_user(old_reviewer)
            .await
            .map_err(ReviewError::from_store)?
            .ok_or_else(|| ReviewError::UserNotFound(old_reviewer.clone()))?;

        let candidates: Vec<UserId> = self
            .store
            .active_team_members(&departing.team_name)
            .await
            .map_err(ReviewError::from_store)?
            .into_iter()
            .map(|u| u.user_id)
            .collect();

        let mut excluded = pr.assigned_reviewers.clone();
        excluded.push(pr.author_id.clone());

        let replacement = self.selector.select_replacement(&candidates, &excluded)?;

        let swapped = self
            .store
            .replace_reviewer(id, old_reviewer, &replacement)
            .await
            .map_err(ReviewError::from_store)?;

        if !swapped {
            // Lost a race: find out what changed underneath us.
            let current = self.get(id).await?;
            Self::check_reassignable(&current, old_reviewer)?;
            tracing::warn!(
                pull_request_id = %id,
                old_reviewer = %old_reviewer,
                replacement = %replacement,
                "Reviewer slot changed concurrently"
            );
            return Err(ReviewError::NotAssigned {
                pull_request: id.clone(),
                reviewer: old_reviewer.clone(),
            });
        }

        tracing::info!(
            pull_request_id = %id,
            old_reviewer = %old_reviewer,
            new_reviewer = %replacement,
            team = %departing.team_name,
            "Reviewer reassigned"
        );

        let updated = self.get(id).await?;
        Ok((updated, replacement))
    }

    /// Pull requests (any status) where `user_id` is a reviewer, newest first.
    pub async fn reviews_for(&self, user_id: &UserId) -> Result<Vec<PullRequestShort>, ReviewError> {
        self.store
            .pull_requests_by_reviewer(user_id)
            .await
            .map_err(ReviewError::from_store)
    }

    /// Fetch a pull request by id.
    pub async fn get(&self, id: &PullRequestId) -> Result<PullRequest, ReviewError> {
        self.fetch(id)
            .await?
            .ok_or_else(|| ReviewError::PrNotFound(id.clone()))
    }

    async fn fetch(&self, id: &PullRequestId) -> Result<Option<PullRequest>, ReviewError> {
        self.store
            .get_pull_request(id)
            .await
            .map_err(ReviewError::from_store)
    }

    fn check_reassignable(pr: &PullRequest, old_reviewer: &UserId) -> Result<(), ReviewError> {
        if pr.is_merged() {
            return Err(ReviewError::PrMerged(pr.pull_request_id.clone()));
        }
        if !pr.is_reviewer_assigned(old_reviewer) {
            return Err(ReviewError::NotAssigned {
                pull_request: pr.pull_request_id.clone(),
                reviewer: old_reviewer.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryReviewStore;
    use crate::types::{Team, TeamMember};

    async fn lifecycle_with(members: &[(&str, bool)]) -> PullRequestLifecycle<InMemoryReviewStore> {
        let store = InMemoryReviewStore::new();
        let team = Team::new(
            "core",
            members
                .iter()
                .map(|(id, active)| TeamMember::new(*id, id.to_uppercase(), *active))
                .collect(),
        );
        store.create_team(&team).await.unwrap();
        PullRequestLifecycle::new(Arc::new(store), Arc::new(ReviewerSelector::with_seed(17)))
    }

    #[tokio::test]
    async fn test_create_skips_author_and_inactive() {
        let lifecycle = lifecycle_with(&[("u1", true), ("u2", false), ("u3", true)]).await;
        let pr = lifecycle
            .create(PullRequestId::new("pr-1"), "Fix", UserId::new("u1"))
            .await
            .unwrap();

        assert_eq!(pr.assigned_reviewers, vec![UserId::new("u3")]);
        assert!(pr.created_at.is_some());
    }

    #[tokio::test]
    async fn test_create_unknown_author() {
        let lifecycle = lifecycle_with(&[("u1", true)]).await;
        let err = lifecycle
            .create(PullRequestId::new("pr-1"), "Fix", UserId::new("ghost"))
            .await
            .unwrap_err();
        assert_eq!(err, ReviewError::UserNotFound(UserId::new("ghost")));
    }

    #[tokio::test]
    async fn test_reassign_never_picks_author() {
        // Author and the only reviewer make up the whole team.
        let lifecycle = lifecycle_with(&[("u1", true), ("u2", true)]).await;
        let pr = lifecycle
            .create(PullRequestId::new("pr-1"), "Fix", UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(pr.assigned_reviewers, vec![UserId::new("u2")]);

        let err = lifecycle
            .reassign(&pr.pull_request_id, &UserId::new("u2"))
            .await
            .unwrap_err();
        assert_eq!(err, ReviewError::NoCandidate);
    }

    #[tokio::test]
    async fn test_reassign_keeps_slot_order() {
        let lifecycle =
            lifecycle_with(&[("u1", true), ("u2", true), ("u3", true), ("u4", true)]).await;
        let pr = lifecycle
            .create(PullRequestId::new("pr-1"), "Fix", UserId::new("u1"))
            .await
            .unwrap();
        let first = pr.assigned_reviewers[0].clone();
        let second = pr.assigned_reviewers[1].clone();

        let (updated, replacement) = lifecycle
            .reassign(&pr.pull_request_id, &first)
            .await
            .unwrap();

        assert_eq!(updated.assigned_reviewers, vec![replacement.clone(), second.clone()]);
        assert_ne!(replacement, first);
        assert_ne!(replacement, second);
        assert_ne!(replacement, UserId::new("u1"));
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let store = Arc::new(InMemoryReviewStore::new());
        let lifecycle =
            PullRequestLifecycle::new(Arc::clone(&store), Arc::new(ReviewerSelector::with_seed(1)));
        store.set_unavailable(true);

        let err = lifecycle.merge(&PullRequestId::new("pr-1")).await.unwrap_err();
        assert!(err.is_internal());
    }
}
