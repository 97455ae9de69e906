//! Integration tests for the commit pipeline and resolver.
//!
//! These exercise the full commit flow against `MockStore`, including the
//! fast path, divergence handling, branch reuse, fork-and-retry, and the
//! at-most-one-in-flight rule.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use scrivener::auth::{CredentialStore, Credentials};
use scrivener::commit::{
    CommitOutcome, CommitPipeline, CommitRequest, CommitSession, ConflictResolver, Resolution,
};
use scrivener::github::mock::{FailOn, MockStore, MockStoreFactory};
use scrivener::github::{BlobContent, ObjectStore, StoreError};
use scrivener::host::{CommitStatus, DocumentHost, HostError, ResolutionChoice, Workspace};
use scrivener::secrets::MemorySecretStore;

// =============================================================================
// Test doubles
// =============================================================================

/// Document host serving fixed content, optionally gated on a semaphore so
/// tests can hold an attempt open.
struct TestHost {
    content: String,
    gate: Option<Arc<Semaphore>>,
    fail: bool,
    statuses: Mutex<Vec<CommitStatus>>,
}

impl TestHost {
    fn new(content: &str) -> Arc<Self> {
        Arc::new(Self {
            content: content.to_string(),
            gate: None,
            fail: false,
            statuses: Mutex::new(Vec::new()),
        })
    }

    fn gated(content: &str, gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self {
            content: content.to_string(),
            gate: Some(gate),
            fail: false,
            statuses: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            content: String::new(),
            gate: None,
            fail: true,
            statuses: Mutex::new(Vec::new()),
        })
    }

    fn statuses(&self) -> Vec<CommitStatus> {
        self.statuses.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentHost for TestHost {
    async fn content(&self) -> Result<BlobContent, HostError> {
        if self.fail {
            return Err(HostError::ContentUnavailable("editor went away".into()));
        }
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        Ok(BlobContent::Text(self.content.clone()))
    }

    fn set_dirty(&self, _dirty: bool) {}

    fn set_status(&self, status: CommitStatus) {
        self.statuses.lock().unwrap().push(status);
    }
}

/// Workspace answering every dialog from a script.
struct ScriptedWorkspace {
    choice: ResolutionChoice,
    confirm_answer: bool,
    notifications: Mutex<Vec<(String, String)>>,
    compare_urls: Mutex<Vec<String>>,
}

impl ScriptedWorkspace {
    fn choosing(choice: ResolutionChoice) -> Arc<Self> {
        Arc::new(Self {
            choice,
            confirm_answer: true,
            notifications: Mutex::new(Vec::new()),
            compare_urls: Mutex::new(Vec::new()),
        })
    }

    fn confirming(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            choice: ResolutionChoice::Cancel,
            confirm_answer: answer,
            notifications: Mutex::new(Vec::new()),
            compare_urls: Mutex::new(Vec::new()),
        })
    }

    fn notifications(&self) -> Vec<(String, String)> {
        self.notifications.lock().unwrap().clone()
    }

    fn compare_urls(&self) -> Vec<String> {
        self.compare_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Workspace for ScriptedWorkspace {
    async fn notify(&self, title: &str, body: &str) {
        self.notifications
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }

    async fn confirm(&self, _title: &str, _body: &str) -> bool {
        self.confirm_answer
    }

    async fn choose_resolution(&self, compare_url: &str) -> ResolutionChoice {
        self.compare_urls
            .lock()
            .unwrap()
            .push(compare_url.to_string());
        self.choice
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn seeded_store() -> MockStore {
    MockStore::new("octocat", "notes").with_document("main", "intro.md", "v1")
}

async fn opened_session(store: &MockStore) -> CommitSession {
    let snapshot = store.file_snapshot("main", "intro.md").await.unwrap();
    CommitSession::opened("octocat", "notes", "main", "intro.md", &snapshot.blob_sha)
}

fn request(branch: &str) -> CommitRequest {
    CommitRequest {
        branch: branch.to_string(),
        message: "update intro".to_string(),
    }
}

fn pipeline_for(store: &MockStore, host: Arc<TestHost>) -> CommitPipeline {
    CommitPipeline::new(Arc::new(store.clone()), host)
}

/// Resolver wired to the store's cluster, with stored token credentials.
/// Returns the credential store so tests can observe invalidation.
fn resolver_for(
    store: &MockStore,
    workspace: Arc<ScriptedWorkspace>,
    host: Arc<TestHost>,
) -> (ConflictResolver, CredentialStore) {
    let credentials = CredentialStore::new(Arc::new(MemorySecretStore::new()));
    credentials
        .save(&Credentials::Token {
            token: "t0ken".into(),
        })
        .unwrap();
    let resolver = ConflictResolver::new(
        Arc::new(MockStoreFactory::for_store(store)),
        workspace,
        host,
        Arc::new(credentials.clone()),
        "scriv",
    );
    (resolver, credentials)
}

// =============================================================================
// Scenario A: fast path
// =============================================================================

#[tokio::test]
async fn fast_path_moves_branch_and_advances_session() {
    let store = seeded_store();
    let session = opened_session(&store).await;
    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());

    let (next, outcome) = pipeline.commit(&session, request("main")).await;

    let receipt = outcome.receipt().expect("fast path should commit").clone();
    assert_eq!(receipt.branch, "main");
    assert_eq!(store.ref_target("main"), Some(receipt.commit_sha.clone()));

    // The new tip's tree holds the edited blob, and the session synced
    // hash becomes that blob's sha.
    assert_eq!(
        store.file_blob_sha("main", "intro.md").await.unwrap(),
        receipt.blob_sha
    );
    assert_eq!(next.synced_blob, receipt.blob_sha);
    assert_eq!(next.branch, "main");

    assert_eq!(
        host.statuses(),
        vec![CommitStatus::Loading, CommitStatus::Success]
    );
}

#[tokio::test]
async fn fast_path_commit_parents_on_observed_tip() {
    let store = seeded_store();
    let session = opened_session(&store).await;
    let old_tip = store.read_ref("main").await.unwrap();
    let pipeline = pipeline_for(&store, TestHost::new("v2"));

    let (_, outcome) = pipeline.commit(&session, request("main")).await;

    let receipt = outcome.receipt().unwrap();
    let commit = store.read_commit(&receipt.commit_sha).await.unwrap();
    assert_eq!(commit.parents, vec![old_tip]);
    assert_eq!(commit.message, "update intro");
}

#[tokio::test]
async fn new_branch_fast_path_commits_on_created_branch_only() {
    let store = seeded_store();
    let session = opened_session(&store).await;
    let main_tip = store.read_ref("main").await.unwrap();
    let pipeline = pipeline_for(&store, TestHost::new("v2"));

    let (next, outcome) = pipeline.commit(&session, request("feature")).await;

    let receipt = outcome.receipt().expect("new branch should fast-path").clone();
    assert_eq!(receipt.branch, "feature");
    assert_eq!(store.ref_target("feature"), Some(receipt.commit_sha));
    // The document branch is untouched.
    assert_eq!(store.ref_target("main"), Some(main_tip));
    assert_eq!(next.branch, "feature");
}

// =============================================================================
// Scenario B: divergence (P1: no move before confirmation)
// =============================================================================

#[tokio::test]
async fn divergence_builds_dangling_commit_and_moves_nothing() {
    let store = seeded_store();
    let session = opened_session(&store).await;

    // Another writer commits after our snapshot.
    let (_, external_tip) =
        store.push_change("main", "intro.md", BlobContent::Text("theirs".into()), "them");

    store.clear_operations();
    let pipeline = pipeline_for(&store, TestHost::new("v2"));
    let (next, outcome) = pipeline.commit(&session, request("main")).await;

    let (context, divergence) = match outcome {
        CommitOutcome::NeedsResolution {
            context,
            divergence,
        } => (context, divergence),
        other => panic!("expected NeedsResolution, got {:?}", other),
    };

    assert!(!context.branch_already_exists);
    assert_eq!(divergence.branch, "main");
    assert_eq!(divergence.original_tip, external_tip);

    // The dangling commit exists and is parented on the stolen tip...
    let commit = store.read_commit(&divergence.dangling.commit_sha).await.unwrap();
    assert_eq!(commit.parents, vec![external_tip.clone()]);

    // ...but no ref moved, and none was even attempted.
    assert_eq!(store.ref_target("main"), Some(external_tip));
    assert!(store.operations().iter().all(|op| !op.is_ref_write()));

    // The session did not advance.
    assert_eq!(next, session);

    // The comparison spans old tip and dangling commit.
    assert!(divergence.compare_url.contains(&divergence.original_tip));
    assert!(divergence.compare_url.contains(&divergence.dangling.commit_sha));
}

#[tokio::test]
async fn cancel_leaves_the_dangling_commit_unreferenced() {
    let store = seeded_store();
    let session = opened_session(&store).await;
    store.push_change("main", "intro.md", BlobContent::Text("theirs".into()), "them");

    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());
    let (session, outcome) = pipeline.commit(&session, request("main")).await;

    let main_before = store.ref_target("main");
    store.clear_operations();

    let workspace = ScriptedWorkspace::choosing(ResolutionChoice::Cancel);
    let (resolver, _) = resolver_for(&store, workspace.clone(), host);
    let (next, resolution) = resolver.resolve(&store, &session, outcome).await;

    assert!(matches!(resolution, Resolution::Cancelled));
    assert_eq!(store.ref_target("main"), main_before);
    assert!(store.operations().iter().all(|op| !op.is_ref_write()));
    assert_eq!(next, session);
    // The user was shown the comparison before deciding.
    assert_eq!(workspace.compare_urls().len(), 1);
}

// =============================================================================
// Scenario C: fresh branch remediation
// =============================================================================

#[tokio::test]
async fn fresh_branch_choice_moves_only_the_new_branch() {
    let store = seeded_store();
    let session = opened_session(&store).await;
    let (_, external_tip) =
        store.push_change("main", "intro.md", BlobContent::Text("theirs".into()), "them");

    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());
    let (session, outcome) = pipeline.commit(&session, request("main")).await;

    let dangling = match &outcome {
        CommitOutcome::NeedsResolution { divergence, .. } => divergence.dangling.clone(),
        other => panic!("expected NeedsResolution, got {:?}", other),
    };

    let workspace = ScriptedWorkspace::choosing(ResolutionChoice::FreshBranch);
    let (resolver, _) = resolver_for(&store, workspace, host);
    let (next, resolution) = resolver.resolve(&store, &session, outcome).await;

    let receipt = match resolution {
        Resolution::Committed(receipt) => receipt,
        other => panic!("expected Committed, got {:?}", other),
    };

    // A uniquely named branch now points at the already-built dangling
    // commit; main is untouched.
    assert!(receipt.branch.starts_with("scriv-"));
    assert_eq!(receipt.commit_sha, dangling.commit_sha);
    assert_eq!(store.ref_target(&receipt.branch), Some(dangling.commit_sha));
    assert_eq!(store.ref_target("main"), Some(external_tip));

    // The session follows the new branch.
    assert_eq!(next.branch, receipt.branch);
    assert_eq!(next.synced_blob, dangling.blob_sha);
}

#[tokio::test]
async fn overwrite_choice_force_moves_the_original_branch() {
    let store = seeded_store();
    let session = opened_session(&store).await;
    store.push_change("main", "intro.md", BlobContent::Text("theirs".into()), "them");

    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());
    let (session, outcome) = pipeline.commit(&session, request("main")).await;

    let dangling = match &outcome {
        CommitOutcome::NeedsResolution { divergence, .. } => divergence.dangling.clone(),
        other => panic!("expected NeedsResolution, got {:?}", other),
    };

    let workspace = ScriptedWorkspace::choosing(ResolutionChoice::Overwrite);
    let (resolver, _) = resolver_for(&store, workspace, host);
    let (next, resolution) = resolver.resolve(&store, &session, outcome).await;

    assert!(matches!(resolution, Resolution::Committed(_)));
    assert_eq!(store.ref_target("main"), Some(dangling.commit_sha));
    assert_eq!(next.branch, "main");
    assert_eq!(next.synced_blob, dangling.blob_sha);
}

// =============================================================================
// P3: pre-existing branch is reused, never an error
// =============================================================================

#[tokio::test]
async fn existing_target_branch_is_reused_and_needs_confirmation() {
    let store = MockStore::new("octocat", "notes")
        .with_document("main", "intro.md", "v1")
        .with_document("draft", "intro.md", "v0");
    let session = opened_session(&store).await;
    let draft_tip = store.read_ref("draft").await.unwrap();

    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());
    let (session, outcome) = pipeline.commit(&session, request("draft")).await;

    // The conflicting create_ref is absorbed; the attempt proceeds on the
    // existing branch but demands confirmation before any move.
    let (context, divergence) = match outcome {
        CommitOutcome::NeedsResolution {
            context,
            divergence,
        } => (context, divergence),
        other => panic!("expected NeedsResolution, got {:?}", other),
    };
    assert!(context.branch_already_exists);
    assert_eq!(divergence.branch, "draft");
    assert_eq!(divergence.original_tip, draft_tip);
    assert_eq!(store.ref_target("draft"), Some(draft_tip.clone()));

    // Overwrite commits onto the pre-existing branch.
    let workspace = ScriptedWorkspace::choosing(ResolutionChoice::Overwrite);
    let (resolver, _) = resolver_for(&store, workspace, host);
    let outcome = CommitOutcome::NeedsResolution {
        context,
        divergence: divergence.clone(),
    };
    let (next, resolution) = resolver.resolve(&store, &session, outcome).await;

    assert!(matches!(resolution, Resolution::Committed(_)));
    assert_eq!(
        store.ref_target("draft"),
        Some(divergence.dangling.commit_sha)
    );
    assert_eq!(next.branch, "draft");
}

// =============================================================================
// Scenario D: access denial and fork
// =============================================================================

#[tokio::test]
async fn access_denied_offers_fork_and_commits_there() {
    // Blob creation answers 404, which on a write path conservatively
    // means "no write access".
    let store = MockStore::new("upstream", "notes")
        .with_document("main", "intro.md", "v1")
        .with_fork_owner("me")
        .fail_on(FailOn::CreateBlob(StoreError::NotFound("Not Found".into())));
    let snapshot = store.file_snapshot("main", "intro.md").await.unwrap();
    let session = CommitSession::opened("upstream", "notes", "main", "intro.md", &snapshot.blob_sha);
    let upstream_tip = store.read_ref("main").await.unwrap();

    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());
    let (session, outcome) = pipeline.commit(&session, request("main")).await;
    assert!(matches!(outcome, CommitOutcome::AccessDenied { .. }));

    let workspace = ScriptedWorkspace::confirming(true);
    let (resolver, _) = resolver_for(&store, workspace, host);
    let (next, resolution) = resolver.resolve(&store, &session, outcome).await;

    let receipt = match resolution {
        Resolution::Committed(receipt) => receipt,
        other => panic!("expected Committed, got {:?}", other),
    };

    // The commit landed in the fork; the upstream branch never moved.
    assert_eq!(receipt.owner, "me");
    assert_eq!(
        store.ref_target_in("me", "notes", "main"),
        Some(receipt.commit_sha.clone())
    );
    assert_eq!(store.ref_target("main"), Some(upstream_tip));

    // The session follows the fork only now that the retry succeeded.
    assert_eq!(next.owner, "me");
    assert_eq!(next.repo, "notes");
    assert_eq!(next.synced_blob, receipt.blob_sha);
}

#[tokio::test]
async fn fork_retry_creates_the_target_branch_in_the_fork() {
    // Branch creation 404s upstream (no write access), so the whole
    // attempt is retried against a fork, where the branch is created.
    let store = MockStore::new("upstream", "notes")
        .with_document("main", "intro.md", "v1")
        .with_fork_owner("me")
        .fail_on(FailOn::CreateRef(StoreError::NotFound("Not Found".into())));
    let session = opened_session_for(&store).await;

    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());
    let (session, outcome) = pipeline.commit(&session, request("review")).await;
    assert!(matches!(outcome, CommitOutcome::AccessDenied { .. }));

    let workspace = ScriptedWorkspace::confirming(true);
    let (resolver, _) = resolver_for(&store, workspace, host);
    let (next, resolution) = resolver.resolve(&store, &session, outcome).await;

    let receipt = match resolution {
        Resolution::Committed(receipt) => receipt,
        other => panic!("expected Committed, got {:?}", other),
    };
    assert_eq!(receipt.owner, "me");
    assert_eq!(receipt.branch, "review");
    assert_eq!(
        store.ref_target_in("me", "notes", "review"),
        Some(receipt.commit_sha)
    );
    assert_eq!(next.owner, "me");
    assert_eq!(next.branch, "review");
    // Upstream never grew the branch.
    assert_eq!(store.ref_target("review"), None);
}

#[tokio::test]
async fn declined_fork_changes_nothing() {
    let store = MockStore::new("upstream", "notes")
        .with_document("main", "intro.md", "v1")
        .fail_on(FailOn::CreateBlob(StoreError::AccessDenied(
            "read-only".into(),
        )));
    let session = opened_session_for(&store).await;

    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());
    let (session, outcome) = pipeline.commit(&session, request("main")).await;

    store.clear_operations();
    let workspace = ScriptedWorkspace::confirming(false);
    let (resolver, _) = resolver_for(&store, workspace, host);
    let (next, resolution) = resolver.resolve(&store, &session, outcome).await;

    assert!(matches!(resolution, Resolution::Cancelled));
    assert_eq!(next, session);
    // No fork, no ref writes.
    assert!(store.operations().is_empty());
}

async fn opened_session_for(store: &MockStore) -> CommitSession {
    let snapshot = store.file_snapshot("main", "intro.md").await.unwrap();
    CommitSession::opened(
        store.owner(),
        store.repo(),
        "main",
        "intro.md",
        &snapshot.blob_sha,
    )
}

// =============================================================================
// P4: at most one attempt in flight
// =============================================================================

#[tokio::test]
async fn second_invocation_while_pending_is_a_noop() {
    let store = seeded_store();
    let session = opened_session(&store).await;

    let gate = Arc::new(Semaphore::new(0));
    let host = TestHost::gated("v2", gate.clone());
    let pipeline = Arc::new(pipeline_for(&store, host.clone()));

    let first = {
        let pipeline = pipeline.clone();
        let session = session.clone();
        tokio::spawn(async move { pipeline.commit(&session, request("main")).await })
    };

    // Wait until the first attempt is inside the pipeline (it reports
    // Loading before suspending on content).
    while host.statuses().is_empty() {
        tokio::task::yield_now().await;
    }

    let (unchanged, outcome) = pipeline.commit(&session, request("main")).await;
    assert!(matches!(outcome, CommitOutcome::InFlight));
    assert_eq!(unchanged, session);

    // Release the first attempt; it completes normally.
    gate.add_permits(1);
    let (_, outcome) = first.await.unwrap();
    assert!(outcome.receipt().is_some());
}

// =============================================================================
// P2: object immutability across repeated attempts
// =============================================================================

#[tokio::test]
async fn repeated_commits_never_mutate_prior_objects() {
    let store = seeded_store();
    let session = opened_session(&store).await;
    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());

    let (session, outcome) = pipeline.commit(&session, request("main")).await;
    let first = outcome.receipt().unwrap().clone();

    // Committing identical content again creates new objects; the first
    // blob is unchanged.
    let (_, outcome) = pipeline.commit(&session, request("main")).await;
    let second = outcome.receipt().unwrap().clone();

    assert_ne!(first.blob_sha, second.blob_sha);
    assert_ne!(first.commit_sha, second.commit_sha);
    assert_eq!(store.blob_bytes(&first.blob_sha).await.unwrap(), b"v2");
    assert_eq!(store.blob_bytes(&second.blob_sha).await.unwrap(), b"v2");
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn unauthenticated_clears_credentials_and_requires_login() {
    let store = seeded_store().fail_on(FailOn::CreateBlob(StoreError::Unauthenticated));
    let session = opened_session(&store).await;

    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());
    let (session, outcome) = pipeline.commit(&session, request("main")).await;
    assert!(matches!(
        outcome,
        CommitOutcome::Failed(ref f) if f.to_string() == "not authenticated"
    ));

    let workspace = ScriptedWorkspace::confirming(true);
    let (resolver, credentials) = resolver_for(&store, workspace, host);
    assert!(credentials.is_configured());

    let (next, resolution) = resolver.resolve(&store, &session, outcome).await;

    assert!(matches!(resolution, Resolution::Reauthenticate));
    assert!(!credentials.is_configured());
    assert_eq!(next, session);
}

#[tokio::test]
async fn malformed_request_is_surfaced_verbatim() {
    let message = "Validation Failed: message is too long";
    let store =
        seeded_store().fail_on(FailOn::CreateCommit(StoreError::Malformed(message.into())));
    let session = opened_session(&store).await;

    let host = TestHost::new("v2");
    let pipeline = pipeline_for(&store, host.clone());
    let (session, outcome) = pipeline.commit(&session, request("main")).await;

    let workspace = ScriptedWorkspace::confirming(true);
    let (resolver, _) = resolver_for(&store, workspace.clone(), host);
    let (_, resolution) = resolver.resolve(&store, &session, outcome).await;

    assert!(matches!(resolution, Resolution::Failed));
    let notifications = workspace.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].1, message);
}

#[tokio::test]
async fn content_failure_aborts_without_store_writes() {
    let store = seeded_store();
    let session = opened_session(&store).await;
    store.clear_operations();

    let pipeline = pipeline_for(&store, TestHost::failing());
    let (next, outcome) = pipeline.commit(&session, request("main")).await;

    assert!(matches!(
        outcome,
        CommitOutcome::Failed(scrivener::commit::CommitFailure::Content(_))
    ));
    assert_eq!(next, session);
    assert!(store.operations().iter().all(|op| !op.is_ref_write()));
}

#[tokio::test]
async fn branch_creation_failure_on_write_path_offers_access_denial() {
    let store = seeded_store().fail_on(FailOn::CreateRef(StoreError::NotFound(
        "Not Found".into(),
    )));
    let session = opened_session(&store).await;

    let pipeline = pipeline_for(&store, TestHost::new("v2"));
    let (_, outcome) = pipeline.commit(&session, request("feature")).await;

    match outcome {
        CommitOutcome::AccessDenied { context, error } => {
            assert_eq!(context.branch, "feature");
            assert!(error.denies_write_access());
        }
        other => panic!("expected AccessDenied, got {:?}", other),
    }
}
