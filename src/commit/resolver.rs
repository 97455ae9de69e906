//! commit::resolver
//!
//! The conflict and access resolver.
//!
//! # Design
//!
//! The resolver consumes a terminal pipeline outcome and drives whatever
//! human decision it calls for:
//!
//! - divergence (or a pre-existing target branch): fresh branch /
//!   overwrite / cancel, reusing the already-built dangling commit
//! - access denial: offer to fork and retry the same context there
//! - 401: clear stored credentials, require re-authentication
//! - malformed request: surface the server's message verbatim
//!
//! Every branch that actually moves a ref updates the session exactly
//! once, at the point the move is confirmed successful.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::CredentialProvider;
use crate::github::{ObjectStore, StoreError, StoreFactory};
use crate::host::{CommitStatus, DocumentHost, ResolutionChoice, Workspace};

use super::context::{CommitContext, CommitFailure, CommitOutcome, CommitReceipt, Divergence};
use super::pipeline::{attempt_on, ensure_branch, BranchResolution};
use super::session::CommitSession;

/// Dialog title for commit progress reports.
const COMMIT_STATUS_TITLE: &str = "Commit status";

/// Dialog title for commit errors.
const COMMIT_ERROR_TITLE: &str = "Commit Error";

/// How a resolver pass ended.
#[derive(Debug)]
pub enum Resolution {
    /// A ref moved; the receipt describes where the commit landed.
    Committed(CommitReceipt),
    /// The user declined every remediation; nothing moved.
    Cancelled,
    /// Credentials were rejected and have been cleared; the caller must
    /// re-authenticate before any further attempt.
    Reauthenticate,
    /// A terminal failure was reported to the user; nothing moved.
    Failed,
}

/// Resolver for terminal pipeline outcomes.
pub struct ConflictResolver {
    factory: Arc<dyn StoreFactory>,
    workspace: Arc<dyn Workspace>,
    host: Arc<dyn DocumentHost>,
    credentials: Arc<dyn CredentialProvider>,
    branch_prefix: String,
}

impl ConflictResolver {
    /// Create a resolver.
    ///
    /// `branch_prefix` names the fresh branches created by the
    /// fresh-branch remediation.
    pub fn new(
        factory: Arc<dyn StoreFactory>,
        workspace: Arc<dyn Workspace>,
        host: Arc<dyn DocumentHost>,
        credentials: Arc<dyn CredentialProvider>,
        branch_prefix: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            workspace,
            host,
            credentials,
            branch_prefix: branch_prefix.into(),
        }
    }

    /// Resolve one pipeline outcome.
    ///
    /// `store` must be the store the outcome was produced against;
    /// `session` the session the pipeline returned.
    pub async fn resolve(
        &self,
        store: &dyn ObjectStore,
        session: &CommitSession,
        outcome: CommitOutcome,
    ) -> (CommitSession, Resolution) {
        match outcome {
            CommitOutcome::Committed(receipt) => {
                // The pipeline already advanced the session.
                self.announce_success(&receipt).await;
                (session.clone(), Resolution::Committed(receipt))
            }
            CommitOutcome::InFlight => (session.clone(), Resolution::Cancelled),
            CommitOutcome::NeedsResolution { context, divergence } => {
                self.resolve_divergence(store, session, &context, &divergence)
                    .await
            }
            CommitOutcome::AccessDenied { context, .. } => {
                self.offer_fork(store, session, &context).await
            }
            CommitOutcome::Failed(failure) => {
                (session.clone(), self.report_failure(failure).await)
            }
        }
    }

    /// Present the three-way choice for a divergence and apply it.
    async fn resolve_divergence(
        &self,
        store: &dyn ObjectStore,
        session: &CommitSession,
        _context: &CommitContext,
        divergence: &Divergence,
    ) -> (CommitSession, Resolution) {
        match self.workspace.choose_resolution(&divergence.compare_url).await {
            ResolutionChoice::FreshBranch => {
                self.host.set_status(CommitStatus::Loading);
                let branch = fresh_branch_name(&self.branch_prefix);

                if store
                    .create_ref(&branch, &divergence.original_tip)
                    .await
                    .is_err()
                {
                    self.host.set_status(CommitStatus::Idle);
                    self.workspace
                        .notify(COMMIT_STATUS_TITLE, "Could not create a new branch.")
                        .await;
                    return (session.clone(), Resolution::Failed);
                }

                // The dangling commit is reused as-is; only the new
                // branch's ref moves.
                self.apply_move(store, session, &branch, divergence).await
            }
            ResolutionChoice::Overwrite => {
                self.host.set_status(CommitStatus::Loading);
                self.apply_move(store, session, &divergence.branch, divergence)
                    .await
            }
            ResolutionChoice::Cancel => {
                // The dangling commit stays unreferenced; the server
                // garbage-collects it eventually.
                (session.clone(), Resolution::Cancelled)
            }
        }
    }

    /// Force-move `branch` to the dangling commit and settle the session.
    async fn apply_move(
        &self,
        store: &dyn ObjectStore,
        session: &CommitSession,
        branch: &str,
        divergence: &Divergence,
    ) -> (CommitSession, Resolution) {
        match store
            .move_ref(branch, &divergence.dangling.commit_sha)
            .await
        {
            Ok(()) => {
                let receipt = CommitReceipt {
                    owner: store.owner().to_string(),
                    repo: store.repo().to_string(),
                    branch: branch.to_string(),
                    commit_sha: divergence.dangling.commit_sha.clone(),
                    blob_sha: divergence.dangling.blob_sha.clone(),
                };
                self.host.set_status(CommitStatus::Success);
                self.announce_success(&receipt).await;
                let next = session.relocated(
                    &receipt.owner,
                    &receipt.repo,
                    &receipt.branch,
                    &receipt.blob_sha,
                );
                (next, Resolution::Committed(receipt))
            }
            Err(e) => {
                self.host.set_status(CommitStatus::Idle);
                self.workspace
                    .notify(COMMIT_STATUS_TITLE, &format!("Commit failed: {}", e))
                    .await;
                (session.clone(), Resolution::Failed)
            }
        }
    }

    /// Offer to fork the repository and retry the same context there.
    async fn offer_fork(
        &self,
        store: &dyn ObjectStore,
        session: &CommitSession,
        context: &CommitContext,
    ) -> (CommitSession, Resolution) {
        let confirmed = self
            .workspace
            .confirm(
                COMMIT_ERROR_TITLE,
                "You do not have rights to commit in the current repository. \
                 Do you want to commit on your own copy of this repository?",
            )
            .await;
        if !confirmed {
            return (session.clone(), Resolution::Cancelled);
        }

        self.host.set_status(CommitStatus::Loading);

        let fork = match store.fork().await {
            Ok(fork) => fork,
            Err(e) => {
                self.host.set_status(CommitStatus::Idle);
                self.workspace
                    .notify(
                        COMMIT_STATUS_TITLE,
                        &format!("Could not fork the repository: {}", e),
                    )
                    .await;
                return (session.clone(), Resolution::Failed);
            }
        };

        let fork_store = self.factory.open(&fork.owner, &fork.name);

        // Recompute the target branch against the fork, with the same
        // branch-already-exists handling as the primary attempt.
        let resolution =
            match ensure_branch(fork_store.as_ref(), &session.branch, &context.branch).await {
                Ok(resolution) => resolution,
                Err(StoreError::Malformed(_)) => {
                    self.host.set_status(CommitStatus::Idle);
                    self.workspace
                        .notify(COMMIT_STATUS_TITLE, "Invalid branch name.")
                        .await;
                    return (session.clone(), Resolution::Failed);
                }
                Err(_) => {
                    self.host.set_status(CommitStatus::Idle);
                    self.workspace
                        .notify(COMMIT_STATUS_TITLE, "Could not commit to fork!")
                        .await;
                    return (session.clone(), Resolution::Failed);
                }
            };

        let fork_context = CommitContext {
            branch_already_exists: resolution == BranchResolution::AlreadyExists,
            ..context.clone()
        };

        match attempt_on(fork_store.as_ref(), session, &fork_context).await {
            CommitOutcome::Committed(receipt) => {
                self.host.set_status(CommitStatus::Success);
                self.announce_success(&receipt).await;
                // Owner/repo/branch switch to the fork only now, after the
                // retry itself succeeded.
                let next = session.relocated(
                    &receipt.owner,
                    &receipt.repo,
                    &receipt.branch,
                    &receipt.blob_sha,
                );
                (next, Resolution::Committed(receipt))
            }
            CommitOutcome::NeedsResolution { context, divergence } => {
                self.host.set_status(CommitStatus::Idle);
                self.resolve_divergence(fork_store.as_ref(), session, &context, &divergence)
                    .await
            }
            CommitOutcome::AccessDenied { .. } => {
                self.host.set_status(CommitStatus::Idle);
                self.workspace
                    .notify(COMMIT_STATUS_TITLE, "Could not commit to fork!")
                    .await;
                (session.clone(), Resolution::Failed)
            }
            CommitOutcome::InFlight => (session.clone(), Resolution::Cancelled),
            CommitOutcome::Failed(failure) => {
                self.host.set_status(CommitStatus::Idle);
                (session.clone(), self.report_failure(failure).await)
            }
        }
    }

    /// Report a terminal failure; only 401 gets special handling.
    async fn report_failure(&self, failure: CommitFailure) -> Resolution {
        match failure {
            CommitFailure::Store(StoreError::Unauthenticated) => {
                // Make sure the next attempt starts from the login flow.
                self.credentials.invalidate();
                self.workspace
                    .notify(
                        COMMIT_ERROR_TITLE,
                        "Not authorized. Stored credentials were cleared; \
                         run 'scriv auth login' and commit again.",
                    )
                    .await;
                Resolution::Reauthenticate
            }
            CommitFailure::Store(StoreError::Malformed(message)) => {
                // The server's own words, verbatim.
                self.workspace.notify(COMMIT_ERROR_TITLE, &message).await;
                Resolution::Failed
            }
            other => {
                self.workspace
                    .notify(COMMIT_STATUS_TITLE, &format!("Commit failed: {}", other))
                    .await;
                Resolution::Failed
            }
        }
    }

    async fn announce_success(&self, receipt: &CommitReceipt) {
        self.workspace
            .notify(
                "Commit result",
                &format!("Commit successful on branch {}.", receipt.branch),
            )
            .await;
    }
}

/// A unique branch name for the fresh-branch remediation.
///
/// The date keeps names scannable in a branch list; the uuid fragment
/// keeps them collision-free.
pub fn fresh_branch_name(prefix: &str) -> String {
    let date = Utc::now().format("%Y%m%d");
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, date, &uuid[..8])
}
