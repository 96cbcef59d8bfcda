//! Team rosters and user activity.

use std::sync::Arc;

use crate::error::ReviewError;
use crate::store::ReviewStore;
use crate::types::{Stats, Team, User, UserId, UserStats};

/// Team and user management backed by a review store.
pub struct TeamDirectory<S: ReviewStore> {
    store: Arc<S>,
}

impl<S: ReviewStore> Clone for TeamDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ReviewStore + 'static> TeamDirectory<S> {
    /// Create a directory over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a team and upsert its members.
    ///
    /// Members that already exist are moved into this team and their name
    /// and active flag overwritten. Moves are logged at warn.
    pub async fn add_team(&self, team: &Team) -> Result<Team, ReviewError> {
        for member in &team.members {
            if let Some(existing) = self
                .store
                .get_user(&member.user_id)
                .await
                .map_err(ReviewError::from_store)?
            {
                if existing.team_name != team.team_name {
                    tracing::warn!(
                        user_id = %member.user_id,
                        from_team = %existing.team_name,
                        to_team = %team.team_name,
                        "User moved between teams"
                    );
                }
            }
        }

        let created = self
            .store
            .create_team(team)
            .await
            .map_err(ReviewError::from_store)?;
        if !created {
            return Err(ReviewError::TeamExists(team.team_name.clone()));
        }

        tracing::info!(
            team = %team.team_name,
            members = team.members.len(),
            "Team created"
        );

        self.get_team(&team.team_name).await
    }

    /// Fetch a team with every member, active or not.
    pub async fn get_team(&self, team_name: &str) -> Result<Team, ReviewError> {
        self.store
            .get_team(team_name)
            .await
            .map_err(ReviewError::from_store)?
            .ok_or_else(|| ReviewError::TeamNotFound(team_name.to_string()))
    }

    /// Fetch a user by id.
    pub async fn get_user(&self, user_id: &UserId) -> Result<User, ReviewError> {
        self.store
            .get_user(user_id)
            .await
            .map_err(ReviewError::from_store)?
            .ok_or_else(|| ReviewError::UserNotFound(user_id.clone()))
    }

    /// Set a user's active flag.
    ///
    /// Only affects future selections; pull requests the user already
    /// reviews keep them until explicitly reassigned.
    pub async fn set_active(&self, user_id: &UserId, is_active: bool) -> Result<User, ReviewError> {
        let user = self
            .store
            .set_user_active(user_id, is_active)
            .await
            .map_err(ReviewError::from_store)?
            .ok_or_else(|| ReviewError::UserNotFound(user_id.clone()))?;

        tracing::info!(user_id = %user_id, is_active, "User activity updated");
        Ok(user)
    }

    /// Review statistics across all users.
    pub async fn stats(&self) -> Result<Stats, ReviewError> {
        self.store.stats().await.map_err(ReviewError::from_store)
    }

    /// Review statistics for one user.
    pub async fn user_stats(&self, user_id: &UserId) -> Result<UserStats, ReviewError> {
        self.store
            .user_stats(user_id)
            .await
            .map_err(ReviewError::from_store)?
            .ok_or_else(|| ReviewError::UserNotFound(user_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryReviewStore;
    use crate::types::TeamMember;

    fn directory() -> TeamDirectory<InMemoryReviewStore> {
        TeamDirectory::new(Arc::new(InMemoryReviewStore::new()))
    }

    #[tokio::test]
    async fn test_add_team_twice() {
        let dir = directory();
        let team = Team::new("qa", vec![TeamMember::new("q1", "Quinn", true)]);

        let created = dir.add_team(&team).await.unwrap();
        assert_eq!(created, team);

        let err = dir.add_team(&team).await.unwrap_err();
        assert_eq!(err, ReviewError::TeamExists("qa".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing_team() {
        let err = directory().get_team("nobody").await.unwrap_err();
        assert_eq!(err, ReviewError::TeamNotFound("nobody".to_string()));
    }

    #[tokio::test]
    async fn test_set_active_round_trip() {
        let dir = directory();
        dir.add_team(&Team::new("qa", vec![TeamMember::new("q1", "Quinn", true)]))
            .await
            .unwrap();

        let user = dir.set_active(&UserId::new("q1"), false).await.unwrap();
        assert!(!user.is_active);

        // Inactive users stay on the roster.
        let team = dir.get_team("qa").await.unwrap();
        assert_eq!(team.members.len(), 1);
        assert!(!team.members[0].is_active);

        let err = dir.set_active(&UserId::new("ghost"), true).await.unwrap_err();
        assert_eq!(err, ReviewError::UserNotFound(UserId::new("ghost")));
    }

    #[tokio::test]
    async fn test_user_stats_for_unknown_user() {
        let err = directory().user_stats(&UserId::new("ghost")).await.unwrap_err();
        assert_eq!(err, ReviewError::UserNotFound(UserId::new("ghost")));
    }
}
