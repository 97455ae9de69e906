//! github::traits
//!
//! Object store trait definition for the Git Data API.
//!
//! # Design
//!
//! The `ObjectStore` trait is async because every operation involves network
//! I/O. All methods return `Result` so that API failures can be mapped onto
//! the closed [`StoreError`] taxonomy exactly once, at the transport
//! boundary; callers dispatch on error kind, never on status codes.
//!
//! Object creation (`create_blob`, `create_tree`, `create_commit`) is pure:
//! the same inputs may be posted any number of times without mutating a
//! previously returned object. Ref mutation (`create_ref`, `move_ref`) is
//! not idempotent and must be issued at most once per logical commit
//! attempt.
//!
//! # Example
//!
//! ```ignore
//! use scrivener::github::{BlobContent, ObjectStore, StoreError};
//!
//! async fn replace_file(
//!     store: &dyn ObjectStore,
//!     branch: &str,
//!     path: &str,
//!     text: String,
//! ) -> Result<String, StoreError> {
//!     let tip = store.read_ref(branch).await?;
//!     let base_tree = store.read_commit(&tip).await?.tree_sha;
//!     let blob = store.create_blob(&BlobContent::Text(text)).await?;
//!     let tree = store.create_tree(&base_tree, path, &blob).await?;
//!     store.create_commit(&tip, &tree, "update").await
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

/// Errors from object store operations.
///
/// Constructed once at the transport boundary (see `rest.rs`); no status
/// code is inspected anywhere else in the crate.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Credentials missing, invalid, or expired (401).
    #[error("not authenticated")]
    Unauthenticated,

    /// The caller lacks permission for the operation (403).
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The requested resource was not found (404).
    ///
    /// On write paths this may equally mean "no permission"; callers treat
    /// it conservatively as an access denial there.
    #[error("not found: {0}")]
    NotFound(String),

    /// A ref with the requested name already exists (422 ref-exists).
    #[error("reference already exists: {0}")]
    RefConflict(String),

    /// The request was rejected as invalid (422 other than ref-exists).
    #[error("{0}")]
    Malformed(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// A server-side computation is still pending after the retry budget
    /// was exhausted (202).
    #[error("server-side computation still pending")]
    Pending,

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// Any other API error.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },
}

impl StoreError {
    /// Whether this error, raised on a write path, should be treated as an
    /// access denial (and therefore as a candidate for the fork offer).
    ///
    /// A 404 on a write can mean either "repository gone" or "no write
    /// permission"; GitHub deliberately does not distinguish the two.
    pub fn denies_write_access(&self) -> bool {
        matches!(self, StoreError::AccessDenied(_) | StoreError::NotFound(_))
    }
}

/// Content for a new blob object.
///
/// Text is posted UTF-8 verbatim; binary content is base64-encoded on the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobContent {
    /// UTF-8 text content.
    Text(String),
    /// Raw binary content.
    Binary(Vec<u8>),
}

impl BlobContent {
    /// Byte length of the content.
    pub fn len(&self) -> usize {
        match self {
            BlobContent::Text(s) => s.len(),
            BlobContent::Binary(b) => b.len(),
        }
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for BlobContent {
    fn from(s: String) -> Self {
        BlobContent::Text(s)
    }
}

impl From<Vec<u8>> for BlobContent {
    fn from(b: Vec<u8>) -> Self {
        BlobContent::Binary(b)
    }
}

/// A file as read from the repository: its blob sha and decoded bytes.
///
/// The blob sha seeds the session's synced hash when a document is opened.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    /// Blob sha of the file at the requested ref.
    pub blob_sha: String,
    /// Decoded file content.
    pub content: Vec<u8>,
}

impl FileSnapshot {
    /// The content as UTF-8 text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// A commit object as stored in the object database.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// Commit sha.
    pub sha: String,
    /// Sha of the tree the commit points to.
    pub tree_sha: String,
    /// Commit message.
    pub message: String,
    /// Parent commit shas.
    pub parents: Vec<String>,
    /// Web URL for viewing the commit, when the API provides one.
    pub html_url: Option<String>,
}

/// Result of comparing two commits.
///
/// Scrivener never diffs locally; divergences are presented through
/// GitHub's own comparison view via `permalink_url`.
#[derive(Debug, Clone)]
pub struct Comparison {
    /// Stable URL of the comparison view.
    pub permalink_url: String,
    /// Relationship of head to base (`ahead`, `behind`, `diverged`, ...).
    pub status: String,
    /// Commits head is ahead of base by.
    pub ahead_by: u64,
    /// Commits head is behind base by.
    pub behind_by: u64,
}

/// Repository metadata.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Owner login (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Default branch name.
    pub default_branch: String,
    /// Web URL of the repository.
    pub html_url: String,
}

/// Per-contributor commit statistics.
///
/// Served by an asynchronously computed endpoint; see
/// [`ObjectStore::contributor_stats`].
#[derive(Debug, Clone)]
pub struct ContributorStats {
    /// Contributor login.
    pub login: String,
    /// Total number of commits.
    pub total: u64,
}

/// The object store trait for one repository's Git Data endpoints.
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, StoreError>`. Callers should handle:
/// - `Unauthenticated`: reset credentials, abandon the attempt
/// - `AccessDenied` / `NotFound` on writes: offer a fork
/// - `RefConflict`: reuse the existing branch
/// - `Malformed`: surface the message verbatim
/// - `RateLimited` / `Network` / `Api`: display to the user
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name (e.g., "github", "mock").
    fn name(&self) -> &'static str;

    /// Repository owner this store is bound to.
    fn owner(&self) -> &str;

    /// Repository name this store is bound to.
    fn repo(&self) -> &str;

    /// Create a blob object and return its sha.
    ///
    /// Safe to retry; the server may or may not deduplicate identical
    /// content, and callers must not assume either way.
    async fn create_blob(&self, content: &BlobContent) -> Result<String, StoreError>;

    /// Create a tree that is `base_tree` with the entry at `path` replaced
    /// (or added) to point at `blob_sha`. Returns the new tree's sha; the
    /// base tree is not mutated.
    async fn create_tree(
        &self,
        base_tree: &str,
        path: &str,
        blob_sha: &str,
    ) -> Result<String, StoreError>;

    /// Create a commit object with a single parent. Moves no ref.
    async fn create_commit(
        &self,
        parent: &str,
        tree_sha: &str,
        message: &str,
    ) -> Result<String, StoreError>;

    /// Read a commit object.
    async fn read_commit(&self, sha: &str) -> Result<CommitInfo, StoreError>;

    /// Read the raw bytes of a blob.
    async fn blob_bytes(&self, sha: &str) -> Result<Vec<u8>, StoreError>;

    /// Read the commit sha a branch currently points to.
    ///
    /// Fails with `NotFound` if the branch does not exist.
    async fn read_ref(&self, branch: &str) -> Result<String, StoreError>;

    /// Create a new branch ref pointing at `sha`.
    ///
    /// Fails with `RefConflict` if the branch already exists. Not
    /// idempotent; call at most once per logical commit attempt.
    async fn create_ref(&self, branch: &str, sha: &str) -> Result<(), StoreError>;

    /// Forcibly repoint an existing branch ref at `sha`.
    ///
    /// This is an unconditional move: the caller must have already
    /// established fast-forward safety, or obtained the user's consent to
    /// discard history. Not idempotent.
    async fn move_ref(&self, branch: &str, sha: &str) -> Result<(), StoreError>;

    /// Blob sha of the file at `path` as of `reference`.
    async fn file_blob_sha(&self, reference: &str, path: &str) -> Result<String, StoreError>;

    /// Read the file at `path` as of `reference`: blob sha plus decoded
    /// content.
    async fn file_snapshot(&self, reference: &str, path: &str)
        -> Result<FileSnapshot, StoreError>;

    /// Compare two commits (`base...head`) through the server.
    ///
    /// `head` may be a dangling commit; the comparison does not require it
    /// to be reachable from any ref.
    async fn compare(&self, base: &str, head: &str) -> Result<Comparison, StoreError>;

    /// List all branch names, following pagination.
    async fn branches(&self) -> Result<Vec<String>, StoreError>;

    /// Fork the repository into the authenticated user's account.
    ///
    /// The server schedules the fork asynchronously but returns the new
    /// repository's metadata immediately.
    async fn fork(&self) -> Result<RepoInfo, StoreError>;

    /// Repository metadata.
    async fn show(&self) -> Result<RepoInfo, StoreError>;

    /// Per-contributor commit statistics.
    ///
    /// The server computes these lazily and answers 202 until ready;
    /// implementations retry on a fixed interval, bounded by a maximum
    /// retry count, and fail with `Pending` when the budget runs out.
    async fn contributor_stats(&self) -> Result<Vec<ContributorStats>, StoreError>;
}
