//! commit::guard
//!
//! The fast-forward guard.
//!
//! # Design
//!
//! Before any ref moves, the guard decides whether the local edit is still
//! based on the repository's current state. It reads, fresh for every
//! attempt, the branch's tip and the file's current blob sha, and compares
//! the blob sha against the session's synced blob. Nothing is cached
//! across attempts; the tip is returned with the verdict so the caller
//! parents the new commit on exactly the state the guard observed.
//!
//! The guard is best-effort: the window between its read and the eventual
//! ref move cannot be closed from the client side and is bounded by the
//! server's atomic ref update.

use crate::github::{ObjectStore, StoreError};

/// Verdict of a fast-forward check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advice {
    /// The file has not changed since this process last synchronized;
    /// moving the ref to a commit parented on `tip` discards nothing the
    /// session does not already know about.
    FastForward {
        /// Branch tip at the time of the check.
        tip: String,
    },
    /// Another writer changed the file since the session's last sync. No
    /// ref may move without an explicit user decision.
    Diverged {
        /// Branch tip at the time of the check.
        tip: String,
        /// The file's current blob sha on the server.
        current_blob: String,
    },
}

impl Advice {
    /// The observed branch tip, whichever the verdict.
    pub fn tip(&self) -> &str {
        match self {
            Advice::FastForward { tip } => tip,
            Advice::Diverged { tip, .. } => tip,
        }
    }
}

/// Check whether committing onto `branch` is fast-forward safe for the
/// file at `path`, given the blob sha the session last synchronized with.
pub async fn check(
    store: &dyn ObjectStore,
    branch: &str,
    path: &str,
    synced_blob: &str,
) -> Result<Advice, StoreError> {
    let tip = store.read_ref(branch).await?;
    let current_blob = store.file_blob_sha(branch, path).await?;

    if current_blob == synced_blob {
        Ok(Advice::FastForward { tip })
    } else {
        Ok(Advice::Diverged { tip, current_blob })
    }
}
