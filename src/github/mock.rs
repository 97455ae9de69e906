//! github::mock
//!
//! Mock object store for deterministic testing.
//!
//! # Design
//!
//! The mock keeps a full in-memory Git object graph (blobs, trees, commits,
//! refs) per repository, shared across clones and across forks through an
//! `Arc<Mutex<...>>` cluster. Every trait call is recorded, which lets
//! tests assert ordering properties such as "no ref moved before the user
//! confirmed".
//!
//! Shas are sequential and prefixed by object kind (`blob0000001`,
//! `commit0000003`), which keeps test failures readable.
//!
//! # Example
//!
//! ```
//! use scrivener::github::mock::MockStore;
//! use scrivener::github::{BlobContent, ObjectStore};
//!
//! # tokio_test::block_on(async {
//! let store = MockStore::new("octocat", "notes")
//!     .with_document("main", "intro.md", "hello");
//!
//! let tip = store.read_ref("main").await.unwrap();
//! let commit = store.read_commit(&tip).await.unwrap();
//! assert_eq!(commit.message, "seed");
//!
//! let sha = store
//!     .create_blob(&BlobContent::Text("edited".into()))
//!     .await
//!     .unwrap();
//! assert!(sha.starts_with("blob"));
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::factory::StoreFactory;
use super::traits::{
    BlobContent, CommitInfo, Comparison, ContributorStats, FileSnapshot, ObjectStore, RepoInfo,
    StoreError,
};

/// Owner login the mock assigns to forks.
const DEFAULT_FORK_OWNER: &str = "forker";

/// Mock object store bound to one repository of a shared cluster.
#[derive(Debug, Clone)]
pub struct MockStore {
    cluster: Arc<Mutex<Cluster>>,
    owner: String,
    repo: String,
}

/// Shared state: every repository plus the operation log.
#[derive(Debug)]
struct Cluster {
    repos: HashMap<String, RepoState>,
    /// Monotonic counter backing sha generation.
    counter: u64,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
    /// Operation to fail, scoped to one repository (so a fork is not
    /// affected by failures configured for its parent).
    fail_on: Option<FailTarget>,
    /// Owner login assigned to forks.
    fork_owner: String,
    /// Canned contributor statistics.
    contributors: Vec<ContributorStats>,
}

/// One repository's object graph.
#[derive(Debug, Default, Clone)]
struct RepoState {
    blobs: HashMap<String, BlobContent>,
    /// Tree sha -> (path -> blob sha). Flat paths are enough here.
    trees: HashMap<String, BTreeMap<String, String>>,
    commits: HashMap<String, StoredCommit>,
    /// Branch name -> commit sha.
    refs: HashMap<String, String>,
    default_branch: String,
}

#[derive(Debug, Clone)]
struct StoredCommit {
    tree: String,
    parents: Vec<String>,
    message: String,
}

/// A failure configuration bound to the repository it was set through.
#[derive(Debug)]
struct FailTarget {
    key: String,
    fail_on: FailOn,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail create_blob with the given error.
    CreateBlob(StoreError),
    /// Fail create_tree with the given error.
    CreateTree(StoreError),
    /// Fail create_commit with the given error.
    CreateCommit(StoreError),
    /// Fail read_ref with the given error.
    ReadRef(StoreError),
    /// Fail create_ref with the given error.
    CreateRef(StoreError),
    /// Fail move_ref with the given error.
    MoveRef(StoreError),
    /// Fail file_blob_sha with the given error.
    FileBlobSha(StoreError),
    /// Fail file_snapshot with the given error.
    FileSnapshot(StoreError),
    /// Fail compare with the given error.
    Compare(StoreError),
    /// Fail fork with the given error.
    Fork(StoreError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CreateBlob {
        repo: String,
    },
    CreateTree {
        repo: String,
        base_tree: String,
        path: String,
        blob_sha: String,
    },
    CreateCommit {
        repo: String,
        parent: String,
        tree: String,
        message: String,
    },
    ReadCommit {
        repo: String,
        sha: String,
    },
    BlobBytes {
        repo: String,
        sha: String,
    },
    ReadRef {
        repo: String,
        branch: String,
    },
    CreateRef {
        repo: String,
        branch: String,
        sha: String,
    },
    MoveRef {
        repo: String,
        branch: String,
        sha: String,
    },
    FileBlobSha {
        repo: String,
        reference: String,
        path: String,
    },
    FileSnapshot {
        repo: String,
        reference: String,
        path: String,
    },
    Compare {
        repo: String,
        base: String,
        head: String,
    },
    Branches {
        repo: String,
    },
    Fork {
        repo: String,
    },
    Show {
        repo: String,
    },
    ContributorStats {
        repo: String,
    },
}

impl MockOperation {
    /// Whether this operation mutates a ref (the externally observable
    /// writes the no-move-on-divergence property is about).
    pub fn is_ref_write(&self) -> bool {
        matches!(
            self,
            MockOperation::CreateRef { .. } | MockOperation::MoveRef { .. }
        )
    }
}

impl MockStore {
    /// Create a new empty mock repository.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        let owner = owner.into();
        let repo = repo.into();
        let mut repos = HashMap::new();
        repos.insert(
            format!("{}/{}", owner, repo),
            RepoState {
                default_branch: "main".to_string(),
                ..Default::default()
            },
        );
        Self {
            cluster: Arc::new(Mutex::new(Cluster {
                repos,
                counter: 0,
                operations: Vec::new(),
                fail_on: None,
                fork_owner: DEFAULT_FORK_OWNER.to_string(),
                contributors: Vec::new(),
            })),
            owner,
            repo,
        }
    }

    /// Seed a single-file document on `branch` with a `seed` commit.
    ///
    /// Returns the store for builder-style construction.
    pub fn with_document(self, branch: &str, path: &str, text: &str) -> Self {
        self.push_change(branch, path, BlobContent::Text(text.into()), "seed");
        self
    }

    /// Configure the mock to fail on a specific operation. The failure
    /// applies only to this store's repository.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut cluster = self.cluster.lock().unwrap();
            cluster.fail_on = Some(FailTarget {
                key: self.key(),
                fail_on,
            });
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut cluster = self.cluster.lock().unwrap();
        cluster.fail_on = None;
    }

    /// Set the owner login assigned to forks.
    pub fn with_fork_owner(self, owner: &str) -> Self {
        {
            let mut cluster = self.cluster.lock().unwrap();
            cluster.fork_owner = owner.to_string();
        }
        self
    }

    /// Set canned contributor statistics.
    pub fn with_contributors(self, stats: Vec<ContributorStats>) -> Self {
        {
            let mut cluster = self.cluster.lock().unwrap();
            cluster.contributors = stats;
        }
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let cluster = self.cluster.lock().unwrap();
        cluster.operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut cluster = self.cluster.lock().unwrap();
        cluster.operations.clear();
    }

    /// Current target of a branch (for test verification; unrecorded).
    pub fn ref_target(&self, branch: &str) -> Option<String> {
        let cluster = self.cluster.lock().unwrap();
        cluster.repos[&self.key()].refs.get(branch).cloned()
    }

    /// Current target of a branch in another repository of the cluster.
    pub fn ref_target_in(&self, owner: &str, repo: &str, branch: &str) -> Option<String> {
        let cluster = self.cluster.lock().unwrap();
        cluster
            .repos
            .get(&format!("{}/{}", owner, repo))?
            .refs
            .get(branch)
            .cloned()
    }

    /// Simulate an external writer: commit `content` at `path` on top of
    /// `branch` and advance the ref. Unrecorded, so ordering assertions in
    /// tests see only the code under test.
    ///
    /// Returns `(blob_sha, commit_sha)`.
    pub fn push_change(
        &self,
        branch: &str,
        path: &str,
        content: BlobContent,
        message: &str,
    ) -> (String, String) {
        let mut cluster = self.cluster.lock().unwrap();
        let key = self.key();

        let blob_sha = cluster.next_sha("blob");
        let tree_sha = cluster.next_sha("tree");
        let commit_sha = cluster.next_sha("commit");

        let state = cluster.repos.get_mut(&key).unwrap();
        let parent = state.refs.get(branch).cloned();

        let mut entries = parent
            .as_ref()
            .and_then(|p| state.commits.get(p))
            .and_then(|c| state.trees.get(&c.tree))
            .cloned()
            .unwrap_or_default();
        entries.insert(path.to_string(), blob_sha.clone());

        state.blobs.insert(blob_sha.clone(), content);
        state.trees.insert(tree_sha.clone(), entries);
        state.commits.insert(
            commit_sha.clone(),
            StoredCommit {
                tree: tree_sha,
                parents: parent.clone().into_iter().collect(),
                message: message.to_string(),
            },
        );
        state.refs.insert(branch.to_string(), commit_sha.clone());

        (blob_sha, commit_sha)
    }

    fn key(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn record(&self, op: MockOperation) {
        let mut cluster = self.cluster.lock().unwrap();
        cluster.operations.push(op);
    }

    /// Return the configured failure for `op`, if any applies to this
    /// repository.
    fn check_fail(&self, op: &str) -> Option<StoreError> {
        let cluster = self.cluster.lock().unwrap();
        let target = cluster.fail_on.as_ref()?;
        if target.key != self.key() {
            return None;
        }
        match &target.fail_on {
            FailOn::CreateBlob(e) if op == "create_blob" => Some(e.clone()),
            FailOn::CreateTree(e) if op == "create_tree" => Some(e.clone()),
            FailOn::CreateCommit(e) if op == "create_commit" => Some(e.clone()),
            FailOn::ReadRef(e) if op == "read_ref" => Some(e.clone()),
            FailOn::CreateRef(e) if op == "create_ref" => Some(e.clone()),
            FailOn::MoveRef(e) if op == "move_ref" => Some(e.clone()),
            FailOn::FileBlobSha(e) if op == "file_blob_sha" => Some(e.clone()),
            FailOn::FileSnapshot(e) if op == "file_snapshot" => Some(e.clone()),
            FailOn::Compare(e) if op == "compare" => Some(e.clone()),
            FailOn::Fork(e) if op == "fork" => Some(e.clone()),
            _ => None,
        }
    }

    /// Resolve a reference (branch name or commit sha) to a commit sha.
    fn resolve(state: &RepoState, reference: &str) -> Option<String> {
        if let Some(sha) = state.refs.get(reference) {
            return Some(sha.clone());
        }
        if state.commits.contains_key(reference) {
            return Some(reference.to_string());
        }
        None
    }

    /// Blob sha of `path` as of `reference`, if both exist.
    fn lookup_blob(state: &RepoState, reference: &str, path: &str) -> Option<String> {
        let commit_sha = Self::resolve(state, reference)?;
        let commit = state.commits.get(&commit_sha)?;
        state.trees.get(&commit.tree)?.get(path).cloned()
    }
}

impl Cluster {
    fn next_sha(&mut self, kind: &str) -> String {
        self.counter += 1;
        format!("{}{:07}", kind, self.counter)
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn repo(&self) -> &str {
        &self.repo
    }

    async fn create_blob(&self, content: &BlobContent) -> Result<String, StoreError> {
        self.record(MockOperation::CreateBlob { repo: self.key() });
        if let Some(e) = self.check_fail("create_blob") {
            return Err(e);
        }

        let mut cluster = self.cluster.lock().unwrap();
        let key = self.key();
        let sha = cluster.next_sha("blob");
        cluster
            .repos
            .get_mut(&key)
            .unwrap()
            .blobs
            .insert(sha.clone(), content.clone());
        Ok(sha)
    }

    async fn create_tree(
        &self,
        base_tree: &str,
        path: &str,
        blob_sha: &str,
    ) -> Result<String, StoreError> {
        self.record(MockOperation::CreateTree {
            repo: self.key(),
            base_tree: base_tree.to_string(),
            path: path.to_string(),
            blob_sha: blob_sha.to_string(),
        });
        if let Some(e) = self.check_fail("create_tree") {
            return Err(e);
        }

        let mut cluster = self.cluster.lock().unwrap();
        let key = self.key();
        let sha = cluster.next_sha("tree");
        let state = cluster.repos.get_mut(&key).unwrap();

        let mut entries = match state.trees.get(base_tree) {
            Some(entries) => entries.clone(),
            None => return Err(StoreError::NotFound(format!("tree {}", base_tree))),
        };
        entries.insert(path.to_string(), blob_sha.to_string());
        state.trees.insert(sha.clone(), entries);
        Ok(sha)
    }

    async fn create_commit(
        &self,
        parent: &str,
        tree_sha: &str,
        message: &str,
    ) -> Result<String, StoreError> {
        self.record(MockOperation::CreateCommit {
            repo: self.key(),
            parent: parent.to_string(),
            tree: tree_sha.to_string(),
            message: message.to_string(),
        });
        if let Some(e) = self.check_fail("create_commit") {
            return Err(e);
        }

        let mut cluster = self.cluster.lock().unwrap();
        let key = self.key();
        let sha = cluster.next_sha("commit");
        let state = cluster.repos.get_mut(&key).unwrap();

        if !state.trees.contains_key(tree_sha) {
            return Err(StoreError::NotFound(format!("tree {}", tree_sha)));
        }
        state.commits.insert(
            sha.clone(),
            StoredCommit {
                tree: tree_sha.to_string(),
                parents: vec![parent.to_string()],
                message: message.to_string(),
            },
        );
        Ok(sha)
    }

    async fn read_commit(&self, sha: &str) -> Result<CommitInfo, StoreError> {
        self.record(MockOperation::ReadCommit {
            repo: self.key(),
            sha: sha.to_string(),
        });

        let cluster = self.cluster.lock().unwrap();
        let state = &cluster.repos[&self.key()];
        let commit = state
            .commits
            .get(sha)
            .ok_or_else(|| StoreError::NotFound(format!("commit {}", sha)))?;
        Ok(CommitInfo {
            sha: sha.to_string(),
            tree_sha: commit.tree.clone(),
            message: commit.message.clone(),
            parents: commit.parents.clone(),
            html_url: Some(format!(
                "https://github.com/{}/commit/{}",
                self.key(),
                sha
            )),
        })
    }

    async fn blob_bytes(&self, sha: &str) -> Result<Vec<u8>, StoreError> {
        self.record(MockOperation::BlobBytes {
            repo: self.key(),
            sha: sha.to_string(),
        });

        let cluster = self.cluster.lock().unwrap();
        let state = &cluster.repos[&self.key()];
        match state.blobs.get(sha) {
            Some(BlobContent::Text(text)) => Ok(text.clone().into_bytes()),
            Some(BlobContent::Binary(bytes)) => Ok(bytes.clone()),
            None => Err(StoreError::NotFound(format!("blob {}", sha))),
        }
    }

    async fn read_ref(&self, branch: &str) -> Result<String, StoreError> {
        self.record(MockOperation::ReadRef {
            repo: self.key(),
            branch: branch.to_string(),
        });
        if let Some(e) = self.check_fail("read_ref") {
            return Err(e);
        }

        let cluster = self.cluster.lock().unwrap();
        cluster.repos[&self.key()]
            .refs
            .get(branch)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("ref heads/{}", branch)))
    }

    async fn create_ref(&self, branch: &str, sha: &str) -> Result<(), StoreError> {
        self.record(MockOperation::CreateRef {
            repo: self.key(),
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        if let Some(e) = self.check_fail("create_ref") {
            return Err(e);
        }

        let mut cluster = self.cluster.lock().unwrap();
        let key = self.key();
        let state = cluster.repos.get_mut(&key).unwrap();

        if state.refs.contains_key(branch) {
            return Err(StoreError::RefConflict(format!(
                "Reference already exists: heads/{}",
                branch
            )));
        }
        if !state.commits.contains_key(sha) {
            return Err(StoreError::Malformed(format!("Object does not exist: {}", sha)));
        }
        state.refs.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn move_ref(&self, branch: &str, sha: &str) -> Result<(), StoreError> {
        self.record(MockOperation::MoveRef {
            repo: self.key(),
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        if let Some(e) = self.check_fail("move_ref") {
            return Err(e);
        }

        let mut cluster = self.cluster.lock().unwrap();
        let key = self.key();
        let state = cluster.repos.get_mut(&key).unwrap();

        if !state.refs.contains_key(branch) {
            return Err(StoreError::Malformed(format!(
                "Reference does not exist: heads/{}",
                branch
            )));
        }
        if !state.commits.contains_key(sha) {
            return Err(StoreError::Malformed(format!("Object does not exist: {}", sha)));
        }
        state.refs.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn file_blob_sha(&self, reference: &str, path: &str) -> Result<String, StoreError> {
        self.record(MockOperation::FileBlobSha {
            repo: self.key(),
            reference: reference.to_string(),
            path: path.to_string(),
        });
        if let Some(e) = self.check_fail("file_blob_sha") {
            return Err(e);
        }

        let cluster = self.cluster.lock().unwrap();
        let state = &cluster.repos[&self.key()];
        Self::lookup_blob(state, reference, path)
            .ok_or_else(|| StoreError::NotFound(format!("{} at {}", path, reference)))
    }

    async fn file_snapshot(
        &self,
        reference: &str,
        path: &str,
    ) -> Result<FileSnapshot, StoreError> {
        self.record(MockOperation::FileSnapshot {
            repo: self.key(),
            reference: reference.to_string(),
            path: path.to_string(),
        });
        if let Some(e) = self.check_fail("file_snapshot") {
            return Err(e);
        }

        let cluster = self.cluster.lock().unwrap();
        let state = &cluster.repos[&self.key()];
        let blob_sha = Self::lookup_blob(state, reference, path)
            .ok_or_else(|| StoreError::NotFound(format!("{} at {}", path, reference)))?;
        let content = match &state.blobs[&blob_sha] {
            BlobContent::Text(text) => text.clone().into_bytes(),
            BlobContent::Binary(bytes) => bytes.clone(),
        };
        Ok(FileSnapshot { blob_sha, content })
    }

    async fn compare(&self, base: &str, head: &str) -> Result<Comparison, StoreError> {
        self.record(MockOperation::Compare {
            repo: self.key(),
            base: base.to_string(),
            head: head.to_string(),
        });
        if let Some(e) = self.check_fail("compare") {
            return Err(e);
        }

        let cluster = self.cluster.lock().unwrap();
        let state = &cluster.repos[&self.key()];
        for sha in [base, head] {
            if !state.commits.contains_key(sha) {
                return Err(StoreError::NotFound(format!("commit {}", sha)));
            }
        }

        let identical = base == head;
        Ok(Comparison {
            permalink_url: format!(
                "https://github.com/{}/compare/{}...{}",
                self.key(),
                base,
                head
            ),
            status: if identical { "identical" } else { "diverged" }.to_string(),
            ahead_by: u64::from(!identical),
            behind_by: 0,
        })
    }

    async fn branches(&self) -> Result<Vec<String>, StoreError> {
        self.record(MockOperation::Branches { repo: self.key() });

        let cluster = self.cluster.lock().unwrap();
        let mut names: Vec<String> = cluster.repos[&self.key()].refs.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn fork(&self) -> Result<RepoInfo, StoreError> {
        self.record(MockOperation::Fork { repo: self.key() });
        if let Some(e) = self.check_fail("fork") {
            return Err(e);
        }

        let mut cluster = self.cluster.lock().unwrap();
        let key = self.key();
        let fork_owner = cluster.fork_owner.clone();
        let state = cluster.repos[&key].clone();
        let fork_key = format!("{}/{}", fork_owner, self.repo);
        let default_branch = state.default_branch.clone();
        cluster.repos.entry(fork_key).or_insert(state);

        Ok(RepoInfo {
            owner: fork_owner,
            name: self.repo.clone(),
            default_branch,
            html_url: format!("https://github.com/{}/{}", self.owner, self.repo),
        })
    }

    async fn show(&self) -> Result<RepoInfo, StoreError> {
        self.record(MockOperation::Show { repo: self.key() });

        let cluster = self.cluster.lock().unwrap();
        let state = &cluster.repos[&self.key()];
        Ok(RepoInfo {
            owner: self.owner.clone(),
            name: self.repo.clone(),
            default_branch: state.default_branch.clone(),
            html_url: format!("https://github.com/{}/{}", self.owner, self.repo),
        })
    }

    async fn contributor_stats(&self) -> Result<Vec<ContributorStats>, StoreError> {
        self.record(MockOperation::ContributorStats { repo: self.key() });

        let cluster = self.cluster.lock().unwrap();
        Ok(cluster.contributors.clone())
    }
}

/// Factory handing out stores that share one mock cluster.
///
/// The resolver uses this to open a store for a fork; with the mock, the
/// fork created by [`MockStore::fork`] is visible through the factory.
#[derive(Debug, Clone)]
pub struct MockStoreFactory {
    cluster: Arc<Mutex<Cluster>>,
}

impl MockStoreFactory {
    /// Create a factory over an existing store's cluster.
    pub fn for_store(store: &MockStore) -> Self {
        Self {
            cluster: Arc::clone(&store.cluster),
        }
    }
}

impl StoreFactory for MockStoreFactory {
    fn open(&self, owner: &str, repo: &str) -> Arc<dyn ObjectStore> {
        Arc::new(MockStore {
            cluster: Arc::clone(&self.cluster),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}
