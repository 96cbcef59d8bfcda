//! Shared service state.

use std::sync::Arc;

use crate::auth::{CredentialIssuer, CredentialVerifier};
use crate::config::ServiceConfig;
use crate::lifecycle::PullRequestLifecycle;
use crate::membership::TeamDirectory;
use crate::selector::ReviewerSelector;
use crate::store::ReviewStore;

/// Shared service state.
///
/// Contains the review store, the components built on it, and the credential
/// issuer/verifier pair. Cloning is cheap; every field is reference counted.
pub struct ServiceState<S: ReviewStore + 'static> {
    /// The review store backend.
    pub store: Arc<S>,
    /// Pull request state machine.
    pub lifecycle: PullRequestLifecycle<S>,
    /// Team and user roster.
    pub directory: TeamDirectory<S>,
    issuer: Arc<CredentialIssuer>,
    verifier: Arc<CredentialVerifier>,
}

impl<S: ReviewStore + 'static> ServiceState<S> {
    /// Create service state from its parts.
    pub fn new(
        store: S,
        selector: ReviewerSelector,
        issuer: CredentialIssuer,
        verifier: CredentialVerifier,
    ) -> Self {
        let store = Arc::new(store);
        Self {
            lifecycle: PullRequestLifecycle::new(Arc::clone(&store), Arc::new(selector)),
            directory: TeamDirectory::new(Arc::clone(&store)),
            store,
            issuer: Arc::new(issuer),
            verifier: Arc::new(verifier),
        }
    }

    /// Create service state with an entropy-seeded selector and the
    /// credential settings of `config`.
    pub fn from_config(store: S, config: &ServiceConfig) -> Self {
        Self::new(
            store,
            ReviewerSelector::from_entropy(),
            config.issuer(),
            config.verifier(),
        )
    }

    /// Credential issuer used by login.
    pub fn issuer(&self) -> &CredentialIssuer {
        &self.issuer
    }

    /// Credential verifier used by the bearer middleware.
    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }
}

impl<S: ReviewStore + 'static> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            lifecycle: self.lifecycle.clone(),
            directory: self.directory.clone(),
            issuer: Arc::clone(&self.issuer),
            verifier: Arc::clone(&self.verifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryReviewStore;
    use crate::types::{Team, TeamMember};

    #[tokio::test]
    async fn test_clones_share_store() {
        let state = ServiceState::from_config(InMemoryReviewStore::new(), &ServiceConfig::default());
        let other = state.clone();

        state
            .directory
            .add_team(&Team::new("backend", vec![TeamMember::new("u1", "Alice", true)]))
            .await
            .unwrap();

        assert_eq!(other.store.num_users(), 1);
        assert!(Arc::ptr_eq(&state.store, &other.store));
    }
}
