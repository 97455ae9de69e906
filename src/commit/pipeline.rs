//! commit::pipeline
//!
//! The commit orchestration pipeline.
//!
//! # Design
//!
//! One invocation drives a full attempt: resolve the target branch and
//! fetch the document content concurrently (join semantics - whichever
//! finishes first waits), run the fast-forward guard, then either apply
//! the fast path or build a dangling commit and surface the divergence.
//! The flow is written as structured sequential async; `tokio::join!`
//! provides the only fan-out.
//!
//! The pipeline is a pure function of `(session, request)`: it returns the
//! session to carry forward together with the outcome, and the session
//! only advances when a ref move was confirmed.
//!
//! At most one attempt may be in flight per pipeline instance. A second
//! invocation while one is pending is a no-op that reports
//! [`CommitOutcome::InFlight`] immediately.
//!
//! # Ref safety
//!
//! Object creation failures abort the attempt with no side effects - no
//! partial state ever moves a ref. The conflict path never moves a ref at
//! all; it hands the dangling commit to the resolver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::github::{ObjectStore, StoreError};
use crate::host::{CommitStatus, DocumentHost};

use super::context::{
    CommitContext, CommitFailure, CommitOutcome, CommitReceipt, CommitRequest, DanglingCommit,
    Divergence,
};
use super::guard::{self, Advice};
use super::session::CommitSession;

/// How branch resolution concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchResolution {
    /// The target is the document's current branch; assumed to exist.
    DocumentBranch,
    /// The target branch was created from the document branch's tip.
    Created,
    /// The target branch already existed and is reused.
    AlreadyExists,
}

/// The commit pipeline for one open document.
pub struct CommitPipeline {
    store: Arc<dyn ObjectStore>,
    host: Arc<dyn DocumentHost>,
    in_flight: AtomicBool,
}

impl CommitPipeline {
    /// Create a pipeline over a store and an editor host.
    pub fn new(store: Arc<dyn ObjectStore>, host: Arc<dyn DocumentHost>) -> Self {
        Self {
            store,
            host,
            in_flight: AtomicBool::new(false),
        }
    }

    /// The store this pipeline commits through.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Run one commit attempt.
    ///
    /// Returns the session to carry forward (advanced only on a confirmed
    /// ref move) and the terminal outcome.
    pub async fn commit(
        &self,
        session: &CommitSession,
        request: CommitRequest,
    ) -> (CommitSession, CommitOutcome) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return (session.clone(), CommitOutcome::InFlight);
        }
        let _reset = InFlightReset(&self.in_flight);

        self.host.set_status(CommitStatus::Loading);
        let outcome = self.attempt(session, request).await;

        let next = match &outcome {
            CommitOutcome::Committed(receipt) => {
                self.host.set_status(CommitStatus::Success);
                session.relocated(
                    &receipt.owner,
                    &receipt.repo,
                    &receipt.branch,
                    &receipt.blob_sha,
                )
            }
            _ => {
                self.host.set_status(CommitStatus::Idle);
                session.clone()
            }
        };
        (next, outcome)
    }

    async fn attempt(&self, session: &CommitSession, request: CommitRequest) -> CommitOutcome {
        let (content, resolution) = tokio::join!(
            self.host.content(),
            ensure_branch(self.store.as_ref(), &session.branch, &request.branch)
        );

        let content = match content {
            Ok(content) => content,
            Err(e) => return CommitOutcome::Failed(CommitFailure::Content(e)),
        };

        let resolution = match resolution {
            Ok(resolution) => resolution,
            Err(e) => {
                let context = CommitContext {
                    branch: request.branch,
                    message: request.message,
                    content,
                    branch_already_exists: false,
                };
                return denied_or_failed(context, e);
            }
        };

        let context = CommitContext {
            branch: request.branch,
            message: request.message,
            content,
            branch_already_exists: resolution == BranchResolution::AlreadyExists,
        };

        attempt_on(self.store.as_ref(), session, &context).await
    }
}

/// Clears the in-flight flag when the attempt ends, however it ends.
struct InFlightReset<'a>(&'a AtomicBool);

impl Drop for InFlightReset<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Make sure the target branch exists, creating it from the document
/// branch's tip when needed.
///
/// A `RefConflict` means the branch already exists and is reused. When the
/// document "branch" is not a ref at all, it may be a bare commit sha
/// (detached document); branching from it directly is attempted before
/// giving up.
pub(crate) async fn ensure_branch(
    store: &dyn ObjectStore,
    current_branch: &str,
    target_branch: &str,
) -> Result<BranchResolution, StoreError> {
    if target_branch == current_branch {
        return Ok(BranchResolution::DocumentBranch);
    }

    let base = match store.read_ref(current_branch).await {
        Ok(tip) => tip,
        // Not a branch; treat the name as a commit sha.
        Err(StoreError::NotFound(_)) => current_branch.to_string(),
        Err(e) => return Err(e),
    };

    match store.create_ref(target_branch, &base).await {
        Ok(()) => Ok(BranchResolution::Created),
        Err(StoreError::RefConflict(_)) => Ok(BranchResolution::AlreadyExists),
        Err(e) => Err(e),
    }
}

/// Run the guard and either fast-path or conflict-path one attempt against
/// `store`.
///
/// Shared between the pipeline and the resolver's fork retry: the resolver
/// calls this with the fork's store and the original context.
pub(crate) async fn attempt_on(
    store: &dyn ObjectStore,
    session: &CommitSession,
    context: &CommitContext,
) -> CommitOutcome {
    // A pre-existing target branch is never auto-committed onto: its
    // relation to the session is unverified, so it always takes the
    // conflict path even if hashes would technically line up.
    if context.branch_already_exists {
        let tip = match store.read_ref(&context.branch).await {
            Ok(tip) => tip,
            Err(e) => return denied_or_failed(context.clone(), e),
        };
        return conflict_path(store, session, context, &tip).await;
    }

    let advice =
        match guard::check(store, &context.branch, &session.file_path, &session.synced_blob).await
        {
            Ok(advice) => advice,
            Err(e) => return denied_or_failed(context.clone(), e),
        };

    match advice {
        Advice::FastForward { tip } => {
            let dangling = match build_commit(store, session, context, &tip).await {
                Ok(dangling) => dangling,
                Err(e) => return denied_or_failed(context.clone(), e),
            };
            match store.move_ref(&context.branch, &dangling.commit_sha).await {
                Ok(()) => CommitOutcome::Committed(CommitReceipt {
                    owner: store.owner().to_string(),
                    repo: store.repo().to_string(),
                    branch: context.branch.clone(),
                    commit_sha: dangling.commit_sha,
                    blob_sha: dangling.blob_sha,
                }),
                Err(e) => denied_or_failed(context.clone(), e),
            }
        }
        Advice::Diverged { tip, .. } => conflict_path(store, session, context, &tip).await,
    }
}

/// Build the dangling commit and the comparison, moving no ref.
async fn conflict_path(
    store: &dyn ObjectStore,
    session: &CommitSession,
    context: &CommitContext,
    tip: &str,
) -> CommitOutcome {
    let dangling = match build_commit(store, session, context, tip).await {
        Ok(dangling) => dangling,
        Err(e) => return denied_or_failed(context.clone(), e),
    };

    let comparison = match store.compare(tip, &dangling.commit_sha).await {
        Ok(comparison) => comparison,
        Err(e) => return denied_or_failed(context.clone(), e),
    };

    CommitOutcome::NeedsResolution {
        context: context.clone(),
        divergence: Divergence {
            branch: context.branch.clone(),
            original_tip: tip.to_string(),
            dangling,
            compare_url: comparison.permalink_url,
        },
    }
}

/// Build blob → tree → commit on top of `tip`. Creates objects only.
async fn build_commit(
    store: &dyn ObjectStore,
    session: &CommitSession,
    context: &CommitContext,
    tip: &str,
) -> Result<DanglingCommit, StoreError> {
    let base_tree = store.read_commit(tip).await?.tree_sha;
    let blob_sha = store.create_blob(&context.content).await?;
    let tree_sha = store
        .create_tree(&base_tree, &session.file_path, &blob_sha)
        .await?;
    let commit_sha = store.create_commit(tip, &tree_sha, &context.message).await?;
    Ok(DanglingCommit {
        blob_sha,
        commit_sha,
    })
}

/// Classify a store error raised on the write path.
fn denied_or_failed(context: CommitContext, error: StoreError) -> CommitOutcome {
    if error.denies_write_access() {
        CommitOutcome::AccessDenied { context, error }
    } else {
        CommitOutcome::Failed(CommitFailure::Store(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::mock::MockStore;

    #[tokio::test]
    async fn same_branch_is_document_branch() {
        let store = MockStore::new("o", "r").with_document("main", "f.md", "v1");
        let resolution = ensure_branch(&store, "main", "main").await.unwrap();
        assert_eq!(resolution, BranchResolution::DocumentBranch);
    }

    #[tokio::test]
    async fn new_branch_is_created_from_tip() {
        let store = MockStore::new("o", "r").with_document("main", "f.md", "v1");
        let tip = store.read_ref("main").await.unwrap();

        let resolution = ensure_branch(&store, "main", "draft").await.unwrap();
        assert_eq!(resolution, BranchResolution::Created);
        assert_eq!(store.ref_target("draft"), Some(tip));
    }

    #[tokio::test]
    async fn existing_branch_is_reused() {
        let store = MockStore::new("o", "r")
            .with_document("main", "f.md", "v1")
            .with_document("draft", "f.md", "v0");

        let resolution = ensure_branch(&store, "main", "draft").await.unwrap();
        assert_eq!(resolution, BranchResolution::AlreadyExists);
    }

    #[tokio::test]
    async fn detached_sha_is_branched_directly() {
        let store = MockStore::new("o", "r").with_document("main", "f.md", "v1");
        let tip = store.read_ref("main").await.unwrap();

        // The "current branch" is a bare commit sha, not a ref.
        let resolution = ensure_branch(&store, &tip, "draft").await.unwrap();
        assert_eq!(resolution, BranchResolution::Created);
        assert_eq!(store.ref_target("draft"), Some(tip));
    }

    #[tokio::test]
    async fn branch_creation_errors_propagate() {
        let store = MockStore::new("o", "r").with_document("main", "f.md", "v1");
        // Branching from a sha that exists nowhere fails loudly, not with
        // a conflict.
        let err = ensure_branch(&store, "ghost-sha", "draft").await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }
}
