//! github::factory
//!
//! Store creation behind a factory boundary.
//!
//! # Design
//!
//! The commit layer sometimes needs a store for a repository other than the
//! one it started with - the fork-and-retry path retargets the same commit
//! context at a fork. `StoreFactory` lets it do that without importing a
//! concrete backend, so the resolver works identically against the REST
//! store and the mock.

use std::sync::Arc;

use super::rest::{GitHubStore, PollSettings};
use super::traits::ObjectStore;
use crate::auth::CredentialProvider;

/// Opens object stores for arbitrary repositories of one backend.
pub trait StoreFactory: Send + Sync {
    /// Open a store bound to `owner/repo`.
    fn open(&self, owner: &str, repo: &str) -> Arc<dyn ObjectStore>;
}

/// Factory producing [`GitHubStore`] instances that share credentials and
/// API base.
pub struct GitHubStoreFactory {
    credentials: Arc<dyn CredentialProvider>,
    api_base: String,
    poll: PollSettings,
}

impl GitHubStoreFactory {
    /// Create a factory for the given API base.
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        api_base: impl Into<String>,
        poll: PollSettings,
    ) -> Self {
        Self {
            credentials,
            api_base: api_base.into(),
            poll,
        }
    }
}

impl StoreFactory for GitHubStoreFactory {
    fn open(&self, owner: &str, repo: &str) -> Arc<dyn ObjectStore> {
        Arc::new(
            GitHubStore::with_api_base(
                Arc::clone(&self.credentials),
                owner,
                repo,
                self.api_base.clone(),
            )
            .with_poll_settings(self.poll),
        )
    }
}
