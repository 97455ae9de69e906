//! commit::context
//!
//! Per-attempt values exchanged between pipeline and resolver.

use thiserror::Error;

use crate::github::{BlobContent, StoreError};
use crate::host::HostError;

/// What the user asked for: the target branch and commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Branch to commit on. May differ from the document's branch, in
    /// which case it is created from the document branch's tip.
    pub branch: String,
    /// Commit message.
    pub message: String,
}

/// Everything one commit attempt carries once its prerequisites (content
/// read, branch ensured) have joined.
///
/// Created per attempt and discarded after resolution. The resolver reuses
/// it verbatim when retrying against a fork.
#[derive(Debug, Clone)]
pub struct CommitContext {
    /// Target branch.
    pub branch: String,
    /// Commit message.
    pub message: String,
    /// Document content to commit.
    pub content: BlobContent,
    /// True when the target branch existed before this attempt tried to
    /// create it. A pre-existing branch always goes through explicit user
    /// confirmation before any ref move.
    pub branch_already_exists: bool,
}

/// A commit object that exists in the object database but is not pointed
/// to by any ref yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingCommit {
    /// Sha of the blob holding the committed file content.
    pub blob_sha: String,
    /// Sha of the commit object.
    pub commit_sha: String,
}

/// A detected divergence: the dangling commit that was built and the state
/// it diverged from.
#[derive(Debug, Clone)]
pub struct Divergence {
    /// Branch the commit was aimed at.
    pub branch: String,
    /// The branch's tip at the time the attempt ran.
    pub original_tip: String,
    /// The commit built for the user's content, reachable from no ref.
    pub dangling: DanglingCommit,
    /// GitHub comparison view between the old tip and the dangling commit.
    pub compare_url: String,
}

/// A confirmed, ref-moving commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Owner of the repository the commit landed in.
    pub owner: String,
    /// Repository the commit landed in.
    pub repo: String,
    /// Branch whose ref now points at the commit.
    pub branch: String,
    /// The commit sha.
    pub commit_sha: String,
    /// Blob sha of the committed file content; becomes the session's
    /// synced blob.
    pub blob_sha: String,
}

/// Why a commit attempt stopped short of moving a ref.
#[derive(Debug, Error)]
pub enum CommitFailure {
    /// The editor host could not provide the document content.
    #[error("could not read document content: {0}")]
    Content(#[from] HostError),

    /// The object store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Terminal outcome of one pipeline invocation.
#[derive(Debug)]
pub enum CommitOutcome {
    /// The fast path applied: a ref moved, the session may advance.
    Committed(CommitReceipt),

    /// A divergence (or pre-existing target branch) needs a human
    /// decision. No ref was moved; the dangling commit is ready for
    /// whichever remediation the user picks.
    NeedsResolution {
        /// The attempt, reusable against a fork.
        context: CommitContext,
        /// What diverged and the comparison to show.
        divergence: Divergence,
    },

    /// A write was denied (403, or 404 on a write path). The resolver may
    /// offer to fork and retry with the same context.
    AccessDenied {
        /// The attempt, reusable against a fork.
        context: CommitContext,
        /// The triggering error.
        error: StoreError,
    },

    /// Another attempt is already in flight for this document; nothing was
    /// done.
    InFlight,

    /// The attempt aborted without side effects.
    Failed(CommitFailure),
}

impl CommitOutcome {
    /// The receipt, if the outcome is a confirmed commit.
    pub fn receipt(&self) -> Option<&CommitReceipt> {
        match self {
            CommitOutcome::Committed(receipt) => Some(receipt),
            _ => None,
        }
    }
}
