//! commit::session
//!
//! The per-document commit session.
//!
//! # Design
//!
//! `CommitSession` is an explicit value passed into and returned from every
//! pipeline invocation; there is no ambient module state. It records which
//! repository/branch the open document came from and the blob sha the
//! process last saw the file at. The synced blob sha is what the
//! fast-forward guard compares against, so it may only advance once a ref
//! move has been confirmed successful - never speculatively.

/// State of one open document, threaded through the commit layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSession {
    /// Repository owner the document lives in.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch the document is currently on.
    pub branch: String,
    /// Path of the document within the repository.
    pub file_path: String,
    /// Blob sha of the file content this process last synchronized with.
    ///
    /// May go stale if another actor commits concurrently; detecting that
    /// is exactly the fast-forward guard's job.
    pub synced_blob: String,
}

impl CommitSession {
    /// Start a session for a freshly opened document.
    ///
    /// `synced_blob` is the blob sha of the file as loaded.
    pub fn opened(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        file_path: impl Into<String>,
        synced_blob: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            file_path: file_path.into(),
            synced_blob: synced_blob.into(),
        }
    }

    /// The session after a confirmed ref move.
    ///
    /// The document may have landed on a different owner (fork), repo, or
    /// branch than it was opened from.
    pub fn relocated(
        &self,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        synced_blob: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            file_path: self.file_path.clone(),
            synced_blob: synced_blob.into(),
        }
    }

    /// Whether a commit receipt landed somewhere other than where the
    /// document was opened.
    pub fn moved_from(&self, other: &CommitSession) -> bool {
        self.owner != other.owner || self.repo != other.repo || self.branch != other.branch
    }

    /// Web URL of the document at this session's location.
    pub fn document_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/blob/{}/{}",
            self.owner, self.repo, self.branch, self.file_path
        )
    }
}
