//! In-memory review store for testing and local development.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::types::{
    NewPullRequest, PrStats, PrStatus, PullRequest, PullRequestId, PullRequestShort, Stats, Team,
    User, UserId, UserStats,
};
use super::ReviewStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// The store was switched offline with [`InMemoryReviewStore::set_unavailable`].
    #[error("Store unavailable")]
    Unavailable,
}

/// Stored pull request plus its insertion sequence number.
///
/// The sequence breaks ties between pull requests created within the same
/// clock tick, so "newest first" stays total.
#[derive(Debug, Clone)]
struct StoredPullRequest {
    pr: PullRequest,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    teams: BTreeSet<String>,
    users: BTreeMap<UserId, User>,
    pull_requests: BTreeMap<PullRequestId, StoredPullRequest>,
    next_seq: u64,
}

impl Inner {
    fn user_stats(&self, user: &User) -> UserStats {
        let mut review_assignments = 0;
        let mut active_reviews = 0;
        let mut authored_prs = 0;

        for stored in self.pull_requests.values() {
            let pr = &stored.pr;
            if pr.author_id == user.user_id {
                authored_prs += 1;
            }
            if pr.is_reviewer_assigned(&user.user_id) {
                review_assignments += 1;
                if pr.status == PrStatus::Open {
                    active_reviews += 1;
                }
            }
        }

        UserStats {
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            review_assignments,
            authored_prs,
            active_reviews,
        }
    }
}

/// In-memory review store.
///
/// Every trait operation runs inside a single lock critical section, which
/// gives the same all-or-nothing visibility the PostgreSQL store gets from
/// transactions. Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Default)]
pub struct InMemoryReviewStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl InMemoryReviewStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every operation fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored pull requests.
    pub fn num_pull_requests(&self) -> usize {
        self.inner.read().pull_requests.len()
    }

    /// Number of stored users.
    pub fn num_users(&self) -> usize {
        self.inner.read().users.len()
    }

    fn check_available(&self) -> Result<(), InMemoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(InMemoryError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    type Error = InMemoryError;

    async fn create_team(&self, team: &Team) -> Result<bool, Self::Error> {
        self.check_available()?;
        let mut inner = self.inner.write();

        if !inner.teams.insert(team.team_name.clone()) {
            return Ok(false);
        }

        for member in &team.members {
            let user = member.clone().into_user(team.team_name.clone());
            inner.users.insert(user.user_id.clone(), user);
        }

        Ok(true)
    }

    async fn get_team(&self, team_name: &str) -> Result<Option<Team>, Self::Error> {
        self.check_available()?;
        let inner = self.inner.read();

        if !inner.teams.contains(team_name) {
            return Ok(None);
        }

        let members = inner
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .map(User::as_member)
            .collect();

        Ok(Some(Team::new(team_name, members)))
    }

    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, Self::Error> {
        self.check_available()?;
        Ok(self.inner.read().users.get(user_id).cloned())
    }

    async fn set_user_active(
        &self,
        user_id: &UserId,
        is_active: bool,
    ) -> Result<Option<User>, Self::Error> {
        self.check_available()?;
        let mut inner = self.inner.write();

        Ok(inner.users.get_mut(user_id).map(|user| {
            user.is_active = is_active;
            user.clone()
        }))
    }

    async fn active_team_members(&self, team_name: &str) -> Result<Vec<User>, Self::Error> {
        self.check_available()?;
        Ok(self
            .inner
            .read()
            .users
            .values()
            .filter(|u| u.team_name == team_name && u.is_active)
            .cloned()
            .collect())
    }

    async fn insert_pull_request(&self, pr: &NewPullRequest) -> Result<bool, Self::Error> {
        self.check_available()?;
        let mut inner = self.inner.write();

        if inner.pull_requests.contains_key(&pr.pull_request_id) {
            return Ok(false);
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;

        let stored = StoredPullRequest {
            pr: PullRequest {
                pull_request_id: pr.pull_request_id.clone(),
                pull_request_name: pr.pull_request_name.clone(),
                author_id: pr.author_id.clone(),
                status: PrStatus::Open,
                assigned_reviewers: pr.assigned_reviewers.clone(),
                created_at: Some(Utc::now()),
                merged_at: None,
            },
            seq,
        };
        inner.pull_requests.insert(pr.pull_request_id.clone(), stored);

        Ok(true)
    }

    async fn get_pull_request(
        &self,
        id: &PullRequestId,
    ) -> Result<Option<PullRequest>, Self::Error> {
        self.check_available()?;
        Ok(self.inner.read().pull_requests.get(id).map(|s| s.pr.clone()))
    }

    async fn merge_pull_request(
        &self,
        id: &PullRequestId,
    ) -> Result<Option<PullRequest>, Self::Error> {
        self.check_available()?;
        let mut inner = self.inner.write();

        Ok(inner.pull_requests.get_mut(id).map(|stored| {
            if stored.pr.status != PrStatus::Merged {
                stored.pr.status = PrStatus::Merged;
                stored.pr.merged_at = Some(Utc::now());
            }
            stored.pr.clone()
        }))
    }

    async fn replace_reviewer(
        &self,
        id: &PullRequestId,
        old: &UserId,
        new: &UserId,
    ) -> Result<bool, Self::Error> {
        self.check_available()?;
        let mut inner = self.inner.write();

        let Some(stored) = inner.pull_requests.get_mut(id) else {
            return Ok(false);
        };
        let pr = &mut stored.pr;

        if pr.status != PrStatus::Open || pr.is_reviewer_assigned(new) {
            return Ok(false);
        }

        match pr.assigned_reviewers.iter_mut().find(|r| **r == *old) {
            Some(slot) => {
                *slot = new.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_requests_by_reviewer(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PullRequestShort>, Self::Error> {
        self.check_available()?;
        let inner = self.inner.read();

        let mut matches: Vec<&StoredPullRequest> = inner
            .pull_requests
            .values()
            .filter(|s| s.pr.is_reviewer_assigned(user_id))
            .collect();

        // Newest first, insertion order breaking clock ties
        matches.sort_by(|a, b| {
            b.pr.created_at
                .cmp(&a.pr.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        Ok(matches.into_iter().map(|s| s.pr.to_short()).collect())
    }

    async fn stats(&self) -> Result<Stats, Self::Error> {
        self.check_available()?;
        let inner = self.inner.read();

        let mut user_stats: Vec<UserStats> =
            inner.users.values().map(|u| inner.user_stats(u)).collect();
        user_stats.sort_by(|a, b| {
            b.review_assignments
                .cmp(&a.review_assignments)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let mut pr_stats = PrStats::default();
        for stored in inner.pull_requests.values() {
            pr_stats.total_prs += 1;
            match stored.pr.status {
                PrStatus::Open => pr_stats.open_prs += 1,
                PrStatus::Merged => pr_stats.merged_prs += 1,
            }
            pr_stats.total_reviewers += stored.pr.assigned_reviewers.len() as u64;
        }

        Ok(Stats { user_stats, pr_stats })
    }

    async fn user_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, Self::Error> {
        self.check_available()?;
        let inner = self.inner.read();
        Ok(inner.users.get(user_id).map(|u| inner.user_stats(u)))
    }

    async fn is_healthy(&self) -> bool {
        self.check_available().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TeamMember;

    fn backend_team() -> Team {
        Team::new(
            "backend",
            vec![
                TeamMember::new("u2", "Bob", true),
                TeamMember::new("u1", "Alice", true),
                TeamMember::new("u3", "Carol", false),
            ],
        )
    }

    fn new_pr(id: &str, author: &str, reviewers: &[&str]) -> NewPullRequest {
        NewPullRequest {
            pull_request_id: PullRequestId::new(id),
            pull_request_name: format!("PR {}", id),
            author_id: UserId::new(author),
            assigned_reviewers: reviewers.iter().map(|r| UserId::new(*r)).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_team() {
        let store = InMemoryReviewStore::new();
        assert!(store.create_team(&backend_team()).await.unwrap());
        assert!(!store.create_team(&backend_team()).await.unwrap());

        let team = store.get_team("backend").await.unwrap().unwrap();
        let ids: Vec<_> = team.members.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2", "u3"]);

        assert!(store.get_team("frontend").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_moves_user_between_teams() {
        let store = InMemoryReviewStore::new();
        store.create_team(&backend_team()).await.unwrap();
        store
            .create_team(&Team::new("frontend", vec![TeamMember::new("u2", "Bobby", false)]))
            .await
            .unwrap();

        let user = store.get_user(&UserId::new("u2")).await.unwrap().unwrap();
        assert_eq!(user.team_name, "frontend");
        assert_eq!(user.username, "Bobby");
        assert!(!user.is_active);

        let backend = store.get_team("backend").await.unwrap().unwrap();
        assert_eq!(backend.members.len(), 2);
    }

    #[tokio::test]
    async fn test_active_team_members_filters_inactive() {
        let store = InMemoryReviewStore::new();
        store.create_team(&backend_team()).await.unwrap();

        let active = store.active_team_members("backend").await.unwrap();
        let ids: Vec<_> = active.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryReviewStore::new();
        assert!(store.insert_pull_request(&new_pr("pr-1", "u1", &["u2"])).await.unwrap());
        assert!(!store.insert_pull_request(&new_pr("pr-1", "u2", &[])).await.unwrap());

        let pr = store.get_pull_request(&PullRequestId::new("pr-1")).await.unwrap().unwrap();
        assert_eq!(pr.author_id, UserId::new("u1"));
        assert_eq!(pr.status, PrStatus::Open);
        assert!(pr.created_at.is_some());
    }

    #[tokio::test]
    async fn test_merge_keeps_first_timestamp() {
        let store = InMemoryReviewStore::new();
        store.insert_pull_request(&new_pr("pr-1", "u1", &[])).await.unwrap();

        let id = PullRequestId::new("pr-1");
        let first = store.merge_pull_request(&id).await.unwrap().unwrap();
        let second = store.merge_pull_request(&id).await.unwrap().unwrap();

        assert_eq!(first.status, PrStatus::Merged);
        assert_eq!(first.merged_at, second.merged_at);
        assert!(store.merge_pull_request(&PullRequestId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_reviewer_preserves_slot() {
        let store = InMemoryReviewStore::new();
        store.insert_pull_request(&new_pr("pr-1", "u1", &["u2", "u3"])).await.unwrap();
        let id = PullRequestId::new("pr-1");

        assert!(store
            .replace_reviewer(&id, &UserId::new("u2"), &UserId::new("u4"))
            .await
            .unwrap());
        let pr = store.get_pull_request(&id).await.unwrap().unwrap();
        assert_eq!(pr.assigned_reviewers, vec![UserId::new("u4"), UserId::new("u3")]);

        // Old reviewer already swapped out
        assert!(!store
            .replace_reviewer(&id, &UserId::new("u2"), &UserId::new("u5"))
            .await
            .unwrap());
        // New reviewer already holds the other slot
        assert!(!store
            .replace_reviewer(&id, &UserId::new("u4"), &UserId::new("u3"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_replace_reviewer_refuses_merged() {
        let store = InMemoryReviewStore::new();
        store.insert_pull_request(&new_pr("pr-1", "u1", &["u2"])).await.unwrap();
        let id = PullRequestId::new("pr-1");
        store.merge_pull_request(&id).await.unwrap();

        assert!(!store
            .replace_reviewer(&id, &UserId::new("u2"), &UserId::new("u3"))
            .await
            .unwrap());
        let pr = store.get_pull_request(&id).await.unwrap().unwrap();
        assert_eq!(pr.assigned_reviewers, vec![UserId::new("u2")]);
    }

    #[tokio::test]
    async fn test_reviews_newest_first() {
        let store = InMemoryReviewStore::new();
        store.insert_pull_request(&new_pr("pr-a", "u1", &["u2"])).await.unwrap();
        store.insert_pull_request(&new_pr("pr-b", "u1", &["u3"])).await.unwrap();
        store.insert_pull_request(&new_pr("pr-c", "u3", &["u2"])).await.unwrap();

        let reviews = store.pull_requests_by_reviewer(&UserId::new("u2")).await.unwrap();
        let ids: Vec<_> = reviews.iter().map(|r| r.pull_request_id.as_str()).collect();
        assert_eq!(ids, vec!["pr-c", "pr-a"]);

        assert!(store
            .pull_requests_by_reviewer(&UserId::new("u9"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let store = InMemoryReviewStore::new();
        store.create_team(&backend_team()).await.unwrap();
        store.insert_pull_request(&new_pr("pr-1", "u1", &["u2"])).await.unwrap();
        store.insert_pull_request(&new_pr("pr-2", "u1", &["u2", "u3"])).await.unwrap();
        store.merge_pull_request(&PullRequestId::new("pr-1")).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.pr_stats.total_prs, 2);
        assert_eq!(stats.pr_stats.open_prs, 1);
        assert_eq!(stats.pr_stats.merged_prs, 1);
        assert_eq!(stats.pr_stats.total_reviewers, 3);
        assert_eq!(stats.user_stats[0].user_id, UserId::new("u2"));

        let bob = store.user_stats(&UserId::new("u2")).await.unwrap().unwrap();
        assert_eq!(bob.review_assignments, 2);
        assert_eq!(bob.active_reviews, 1);
        assert_eq!(bob.authored_prs, 0);

        let alice = store.user_stats(&UserId::new("u1")).await.unwrap().unwrap();
        assert_eq!(alice.authored_prs, 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = InMemoryReviewStore::new();
        store.set_unavailable(true);

        assert!(!store.is_healthy().await);
        assert!(store.get_user(&UserId::new("u1")).await.is_err());

        store.set_unavailable(false);
        assert!(store.is_healthy().await);
    }
}
