//! github::rest
//!
//! GitHub object store implementation using the Git Data REST API.
//!
//! # Design
//!
//! This module implements the [`ObjectStore`] trait against GitHub. It is
//! the only place in the crate that sees HTTP status codes: every error
//! response is mapped onto [`StoreError`] here, and the commit layer
//! dispatches on error kind alone.
//!
//! # Authentication
//!
//! Authorization header values come from a [`CredentialProvider`]; the
//! store itself never holds a token. A 401 maps to
//! `StoreError::Unauthenticated` and is the resolver's cue to clear stored
//! credentials; there is no in-place retry because credentials are static.
//!
//! # Pagination
//!
//! List endpoints follow the `Link` response header's `rel="next"` URL
//! until it is absent.
//!
//! [`CredentialProvider`]: crate::auth::CredentialProvider

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{
    BlobContent, CommitInfo, Comparison, ContributorStats, FileSnapshot, ObjectStore, RepoInfo,
    StoreError,
};
use crate::auth::CredentialProvider;

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "scrivener-cli";

/// Accept header for JSON responses.
const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Accept header for raw blob content.
const ACCEPT_RAW: &str = "application/vnd.github.v3.raw";

/// Marker GitHub puts in the 422 body when a ref already exists.
const REF_EXISTS_MARKER: &str = "Reference already exists";

/// Settings for the bounded 202 long-poll on asynchronously computed
/// endpoints.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Fixed interval between retries.
    pub interval: Duration,
    /// Maximum number of retries before giving up with `Pending`.
    pub max_retries: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_retries: 10,
        }
    }
}

/// GitHub object store bound to one repository.
pub struct GitHubStore {
    /// HTTP client for making requests
    client: Client,
    /// Source of Authorization header values
    credentials: Arc<dyn CredentialProvider>,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
    /// Long-poll settings for async server-side computations
    poll: PollSettings,
}

// Custom Debug so no credential material can leak through the provider.
impl std::fmt::Debug for GitHubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubStore")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubStore {
    /// Create a store for `owner/repo` against the public GitHub API.
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self::with_api_base(credentials, owner, repo, DEFAULT_API_BASE)
    }

    /// Create a store with a custom API base URL (GitHub Enterprise, test
    /// servers).
    pub fn with_api_base(
        credentials: Arc<dyn CredentialProvider>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            credentials,
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.into(),
            poll: PollSettings::default(),
        }
    }

    /// Override the long-poll settings.
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Build common headers for API requests.
    async fn headers(&self, accept: &'static str) -> Result<HeaderMap, StoreError> {
        let authorization = self
            .credentials
            .authorization()
            .await
            .map_err(|_| StoreError::Unauthenticated)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&authorization).map_err(|_| StoreError::Unauthenticated)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Parse a successful response body, or map the error.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, StoreError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| StoreError::Api {
                status: status.as_u16(),
                message: format!("failed to parse response: {}", e),
            })
        } else {
            Err(map_error_response(response, status).await)
        }
    }

    /// Send a GET and parse the JSON body.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, StoreError> {
        let response = self
            .client
            .get(url)
            .headers(self.headers(ACCEPT_JSON).await?)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        self.handle_response(response).await
    }

    /// Send a POST with a JSON body and parse the JSON response.
    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let response = self
            .client
            .post(url)
            .headers(self.headers(ACCEPT_JSON).await?)
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        self.handle_response(response).await
    }
}

/// Map a non-success response onto the error taxonomy.
///
/// This is the single point where status codes become error kinds.
async fn map_error_response(response: Response, status: StatusCode) -> StoreError {
    let message = match response.json::<GitHubErrorResponse>().await {
        Ok(err) => err.message,
        Err(_) => "unknown error".to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED => StoreError::Unauthenticated,
        StatusCode::FORBIDDEN => {
            if message.to_lowercase().contains("rate limit") {
                StoreError::RateLimited
            } else {
                StoreError::AccessDenied(message)
            }
        }
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::UNPROCESSABLE_ENTITY => {
            if message.contains(REF_EXISTS_MARKER) {
                StoreError::RefConflict(message)
            } else {
                StoreError::Malformed(message)
            }
        }
        StatusCode::TOO_MANY_REQUESTS => StoreError::RateLimited,
        _ if status.is_server_error() => StoreError::Api {
            status: status.as_u16(),
            message: format!("GitHub server error: {}", message),
        },
        _ => StoreError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Extract the `rel="next"` URL from a `Link` response header.
///
/// Header form: `<https://...&page=2>; rel="next", <...>; rel="last"`.
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get("link")?.to_str().ok()?;
    for part in link.split(',') {
        if part.contains("rel=\"next\"") {
            let start = part.find('<')?;
            let end = part.find('>')?;
            return Some(part[start + 1..end].to_string());
        }
    }
    None
}

/// Escape characters GitHub accepts in file names but URLs do not.
///
/// `#` is valid in a GitHub file name and must be sent percent-encoded.
fn escape_path(path: &str) -> String {
    path.replace('#', "%23")
}

#[async_trait]
impl ObjectStore for GitHubStore {
    fn name(&self) -> &'static str {
        "github"
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn repo(&self) -> &str {
        &self.repo
    }

    async fn create_blob(&self, content: &BlobContent) -> Result<String, StoreError> {
        let url = self.repo_url("git/blobs");
        let body = match content {
            BlobContent::Text(text) => CreateBlobBody {
                content: text.clone(),
                encoding: "utf-8",
            },
            BlobContent::Binary(bytes) => CreateBlobBody {
                content: BASE64.encode(bytes),
                encoding: "base64",
            },
        };
        let created: ShaResponse = self.post_json(&url, &body).await?;
        Ok(created.sha)
    }

    async fn create_tree(
        &self,
        base_tree: &str,
        path: &str,
        blob_sha: &str,
    ) -> Result<String, StoreError> {
        let url = self.repo_url("git/trees");
        let body = CreateTreeBody {
            base_tree,
            tree: vec![TreeEntryBody {
                path,
                mode: "100644",
                entry_type: "blob",
                sha: blob_sha,
            }],
        };
        let created: ShaResponse = self.post_json(&url, &body).await?;
        Ok(created.sha)
    }

    async fn create_commit(
        &self,
        parent: &str,
        tree_sha: &str,
        message: &str,
    ) -> Result<String, StoreError> {
        let url = self.repo_url("git/commits");
        let body = CreateCommitBody {
            message,
            tree: tree_sha,
            parents: vec![parent],
        };
        let created: ShaResponse = self.post_json(&url, &body).await?;
        Ok(created.sha)
    }

    async fn read_commit(&self, sha: &str) -> Result<CommitInfo, StoreError> {
        let url = self.repo_url(&format!("git/commits/{}", sha));
        let commit: GitHubCommit = self.get_json(&url).await?;
        Ok(commit.into())
    }

    async fn blob_bytes(&self, sha: &str) -> Result<Vec<u8>, StoreError> {
        let url = self.repo_url(&format!("git/blobs/{}", sha));
        let response = self
            .client
            .get(&url)
            .headers(self.headers(ACCEPT_RAW).await?)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| StoreError::Network(e.to_string()))?;
            Ok(bytes.to_vec())
        } else {
            Err(map_error_response(response, status).await)
        }
    }

    async fn read_ref(&self, branch: &str) -> Result<String, StoreError> {
        let url = self.repo_url(&format!("git/ref/heads/{}", branch));
        let reference: GitHubRefResponse = self.get_json(&url).await?;
        Ok(reference.object.sha)
    }

    async fn create_ref(&self, branch: &str, sha: &str) -> Result<(), StoreError> {
        let url = self.repo_url("git/refs");
        let body = CreateRefBody {
            reference: format!("refs/heads/{}", branch),
            sha,
        };
        let _: GitHubRefResponse = self.post_json(&url, &body).await?;
        Ok(())
    }

    async fn move_ref(&self, branch: &str, sha: &str) -> Result<(), StoreError> {
        let url = self.repo_url(&format!("git/refs/heads/{}", branch));
        // Forced move: fast-forward safety is the caller's responsibility.
        let body = MoveRefBody { sha, force: true };
        let response = self
            .client
            .patch(&url)
            .headers(self.headers(ACCEPT_JSON).await?)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let _: GitHubRefResponse = self.handle_response(response).await?;
        Ok(())
    }

    async fn file_blob_sha(&self, reference: &str, path: &str) -> Result<String, StoreError> {
        let url = format!(
            "{}?ref={}",
            self.repo_url(&format!("contents/{}", escape_path(path))),
            reference
        );
        let contents: GitHubContents = self.get_json(&url).await?;
        Ok(contents.sha)
    }

    async fn file_snapshot(
        &self,
        reference: &str,
        path: &str,
    ) -> Result<FileSnapshot, StoreError> {
        let url = format!(
            "{}?ref={}",
            self.repo_url(&format!("contents/{}", escape_path(path))),
            reference
        );
        let contents: GitHubContents = self.get_json(&url).await?;

        let content = match contents.encoding.as_deref() {
            Some("base64") => {
                // The API wraps base64 payloads in newlines.
                let compact: String = contents
                    .content
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                BASE64.decode(compact.as_bytes()).map_err(|e| StoreError::Api {
                    status: 200,
                    message: format!("invalid base64 content: {}", e),
                })?
            }
            _ => contents.content.unwrap_or_default().into_bytes(),
        };

        Ok(FileSnapshot {
            blob_sha: contents.sha,
            content,
        })
    }

    async fn compare(&self, base: &str, head: &str) -> Result<Comparison, StoreError> {
        let url = self.repo_url(&format!("compare/{}...{}", base, head));
        let comparison: GitHubComparison = self.get_json(&url).await?;
        Ok(Comparison {
            permalink_url: comparison.permalink_url,
            status: comparison.status,
            ahead_by: comparison.ahead_by,
            behind_by: comparison.behind_by,
        })
    }

    async fn branches(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut url = format!("{}?per_page=100", self.repo_url("branches"));

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.headers(ACCEPT_JSON).await?)
                .send()
                .await
                .map_err(|e| StoreError::Network(e.to_string()))?;

            let next = next_page_url(response.headers());
            let page: Vec<GitHubBranch> = self.handle_response(response).await?;
            names.extend(page.into_iter().map(|b| b.name));

            match next {
                Some(n) => url = n,
                None => break,
            }
        }

        Ok(names)
    }

    async fn fork(&self) -> Result<RepoInfo, StoreError> {
        let url = self.repo_url("forks");
        // 202 Accepted still carries the new repository's body.
        let repo: GitHubRepo = self.post_json(&url, &serde_json::json!({})).await?;
        Ok(repo.into())
    }

    async fn show(&self) -> Result<RepoInfo, StoreError> {
        let url = format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo);
        let repo: GitHubRepo = self.get_json(&url).await?;
        Ok(repo.into())
    }

    async fn contributor_stats(&self) -> Result<Vec<ContributorStats>, StoreError> {
        let url = self.repo_url("stats/contributors");

        let mut attempts = 0u32;
        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.headers(ACCEPT_JSON).await?)
                .send()
                .await
                .map_err(|e| StoreError::Network(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::ACCEPTED {
                // The server is still computing; fixed-interval retry with
                // a hard cap so polling can never run unbounded.
                if attempts >= self.poll.max_retries {
                    return Err(StoreError::Pending);
                }
                attempts += 1;
                tokio::time::sleep(self.poll.interval).await;
                continue;
            }

            let stats: Vec<GitHubContributorStats> = if status.is_success() {
                self.handle_response(response).await?
            } else {
                return Err(map_error_response(response, status).await);
            };

            return Ok(stats
                .into_iter()
                .map(|s| ContributorStats {
                    login: s.author.map(|a| a.login).unwrap_or_default(),
                    total: s.total,
                })
                .collect());
        }
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a blob.
#[derive(Serialize)]
struct CreateBlobBody {
    content: String,
    encoding: &'static str,
}

/// One entry of a tree creation request.
#[derive(Serialize)]
struct TreeEntryBody<'a> {
    path: &'a str,
    mode: &'static str,
    #[serde(rename = "type")]
    entry_type: &'static str,
    sha: &'a str,
}

/// Request body for creating a tree on top of a base tree.
#[derive(Serialize)]
struct CreateTreeBody<'a> {
    base_tree: &'a str,
    tree: Vec<TreeEntryBody<'a>>,
}

/// Request body for creating a commit.
#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

/// Request body for creating a ref.
#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    reference: String,
    sha: &'a str,
}

/// Request body for a forced ref move.
#[derive(Serialize)]
struct MoveRefBody<'a> {
    sha: &'a str,
    force: bool,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Minimal `{sha}` response shared by object creation endpoints.
#[derive(Deserialize)]
struct ShaResponse {
    sha: String,
}

/// Ref response format (`{ref, object: {sha, ...}}`).
#[derive(Deserialize)]
struct GitHubRefResponse {
    object: GitHubRefObject,
}

#[derive(Deserialize)]
struct GitHubRefObject {
    sha: String,
}

/// Commit object response format.
#[derive(Deserialize)]
struct GitHubCommit {
    sha: String,
    message: String,
    tree: GitHubTreeRef,
    #[serde(default)]
    parents: Vec<GitHubParentRef>,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct GitHubTreeRef {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubParentRef {
    sha: String,
}

impl From<GitHubCommit> for CommitInfo {
    fn from(c: GitHubCommit) -> Self {
        CommitInfo {
            sha: c.sha,
            tree_sha: c.tree.sha,
            message: c.message,
            parents: c.parents.into_iter().map(|p| p.sha).collect(),
            html_url: c.html_url,
        }
    }
}

/// Contents endpoint response (file variant).
#[derive(Deserialize)]
struct GitHubContents {
    sha: String,
    content: Option<String>,
    encoding: Option<String>,
}

/// Comparison response format.
#[derive(Deserialize)]
struct GitHubComparison {
    permalink_url: String,
    status: String,
    ahead_by: u64,
    behind_by: u64,
}

/// Branch list item.
#[derive(Deserialize)]
struct GitHubBranch {
    name: String,
}

/// Repository response format.
#[derive(Deserialize)]
struct GitHubRepo {
    name: String,
    owner: GitHubOwner,
    default_branch: String,
    html_url: String,
}

#[derive(Deserialize)]
struct GitHubOwner {
    login: String,
}

impl From<GitHubRepo> for RepoInfo {
    fn from(r: GitHubRepo) -> Self {
        RepoInfo {
            owner: r.owner.login,
            name: r.name,
            default_branch: r.default_branch,
            html_url: r.html_url,
        }
    }
}

/// Contributor statistics item.
#[derive(Deserialize)]
struct GitHubContributorStats {
    author: Option<GitHubOwner>,
    total: u64,
}

// --------------------------------------------------------------------------
// URL Parsing
// --------------------------------------------------------------------------

/// Location of a file inside a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch the file was opened from.
    pub branch: String,
    /// Path of the file within the repository.
    pub path: String,
}

impl FileLocation {
    /// Web URL of this file (`blob` view).
    pub fn html_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/blob/{}/{}",
            self.owner, self.repo, self.branch, self.path
        )
    }
}

/// Parse a GitHub blob/tree URL into a file location.
///
/// Supports:
/// - `https://github.com/owner/repo/blob/branch/path/to/file`
/// - `https://github.com/owner/repo/tree/branch/path/to/file`
///
/// Branch and path segments are percent-decoded.
///
/// # Example
///
/// ```
/// use scrivener::github::parse_file_url;
///
/// let loc = parse_file_url("https://github.com/octocat/notes/blob/main/docs/intro.md").unwrap();
/// assert_eq!(loc.owner, "octocat");
/// assert_eq!(loc.repo, "notes");
/// assert_eq!(loc.branch, "main");
/// assert_eq!(loc.path, "docs/intro.md");
/// ```
pub fn parse_file_url(url: &str) -> Option<FileLocation> {
    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
        .or_else(|| url.strip_prefix("https://www.github.com/"))?;

    let mut parts = rest.split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let repo = parts.next().filter(|s| !s.is_empty())?;
    let view = parts.next()?;
    if view != "blob" && view != "tree" {
        return None;
    }
    let branch = parts.next().filter(|s| !s.is_empty())?;
    let path: Vec<&str> = parts.collect();
    if path.is_empty() || path.iter().all(|s| s.is_empty()) {
        return None;
    }

    Some(FileLocation {
        owner: owner.to_string(),
        repo: repo.to_string(),
        branch: percent_decode(branch),
        path: path
            .iter()
            .map(|s| percent_decode(s))
            .collect::<Vec<_>>()
            .join("/"),
    })
}

/// Decode percent-encoded bytes in a URL segment.
///
/// Invalid escapes are passed through untouched.
fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(hex) = bytes.get(i + 1..i + 3) {
                if let Ok(byte) = u8::from_str_radix(std::str::from_utf8(hex).unwrap_or(""), 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_file_url {
        use super::*;

        #[test]
        fn blob_url() {
            let loc =
                parse_file_url("https://github.com/octocat/notes/blob/main/docs/intro.md").unwrap();
            assert_eq!(loc.owner, "octocat");
            assert_eq!(loc.repo, "notes");
            assert_eq!(loc.branch, "main");
            assert_eq!(loc.path, "docs/intro.md");
        }

        #[test]
        fn tree_url() {
            let loc =
                parse_file_url("https://github.com/owner/repo/tree/dev/a/b.xml").unwrap();
            assert_eq!(loc.branch, "dev");
            assert_eq!(loc.path, "a/b.xml");
        }

        #[test]
        fn www_prefix() {
            assert!(parse_file_url("https://www.github.com/o/r/blob/b/f.txt").is_some());
        }

        #[test]
        fn percent_encoded_segments() {
            let loc =
                parse_file_url("https://github.com/o/r/blob/release%2F1.0/my%20file.md").unwrap();
            assert_eq!(loc.branch, "release/1.0");
            assert_eq!(loc.path, "my file.md");
        }

        #[test]
        fn missing_path_rejected() {
            assert!(parse_file_url("https://github.com/o/r/blob/main").is_none());
            assert!(parse_file_url("https://github.com/o/r/blob/main/").is_none());
        }

        #[test]
        fn non_blob_view_rejected() {
            assert!(parse_file_url("https://github.com/o/r/pull/1").is_none());
            assert!(parse_file_url("https://github.com/o/r").is_none());
        }

        #[test]
        fn non_github_rejected() {
            assert!(parse_file_url("https://gitlab.com/o/r/blob/main/f").is_none());
            assert!(parse_file_url("not a url").is_none());
        }

        #[test]
        fn html_url_round_trip() {
            let loc = FileLocation {
                owner: "o".into(),
                repo: "r".into(),
                branch: "main".into(),
                path: "d/f.md".into(),
            };
            assert_eq!(loc.html_url(), "https://github.com/o/r/blob/main/d/f.md");
        }
    }

    mod helpers {
        use super::*;

        #[test]
        fn percent_decode_passthrough() {
            assert_eq!(percent_decode("plain"), "plain");
            assert_eq!(percent_decode("a%20b"), "a b");
            assert_eq!(percent_decode("bad%zz"), "bad%zz");
            assert_eq!(percent_decode("trail%2"), "trail%2");
        }

        #[test]
        fn escape_path_hash() {
            assert_eq!(escape_path("notes/#1.md"), "notes/%231.md");
            assert_eq!(escape_path("plain.md"), "plain.md");
        }

        #[test]
        fn next_page_url_extraction() {
            let mut headers = HeaderMap::new();
            headers.insert(
                "link",
                HeaderValue::from_static(
                    "<https://api.github.com/x?page=2>; rel=\"next\", \
                     <https://api.github.com/x?page=9>; rel=\"last\"",
                ),
            );
            assert_eq!(
                next_page_url(&headers),
                Some("https://api.github.com/x?page=2".to_string())
            );
        }

        #[test]
        fn next_page_url_absent() {
            let mut headers = HeaderMap::new();
            assert_eq!(next_page_url(&headers), None);

            headers.insert(
                "link",
                HeaderValue::from_static("<https://api.github.com/x?page=9>; rel=\"last\""),
            );
            assert_eq!(next_page_url(&headers), None);
        }
    }

    mod github_store {
        use super::*;
        use crate::auth::{CredentialError, CredentialProvider};

        struct StaticCreds;

        #[async_trait]
        impl CredentialProvider for StaticCreds {
            async fn authorization(&self) -> Result<String, CredentialError> {
                Ok("token t0".to_string())
            }

            fn invalidate(&self) {}
        }

        fn store() -> GitHubStore {
            GitHubStore::new(Arc::new(StaticCreds), "octocat", "hello-world")
        }

        #[test]
        fn repo_url_format() {
            let s = store();
            assert_eq!(
                s.repo_url("git/blobs"),
                "https://api.github.com/repos/octocat/hello-world/git/blobs"
            );
            assert_eq!(
                s.repo_url("git/refs/heads/main"),
                "https://api.github.com/repos/octocat/hello-world/git/refs/heads/main"
            );
        }

        #[test]
        fn custom_api_base() {
            let s = GitHubStore::with_api_base(
                Arc::new(StaticCreds),
                "o",
                "r",
                "https://github.example.com/api/v3",
            );
            assert_eq!(
                s.repo_url("branches"),
                "https://github.example.com/api/v3/repos/o/r/branches"
            );
        }

        #[test]
        fn debug_has_no_credentials() {
            let s = store();
            let debug = format!("{:?}", s);
            assert!(debug.contains("octocat"));
            assert!(!debug.contains("token"));
        }

        #[tokio::test]
        async fn headers_carry_authorization() {
            let s = store();
            let headers = s.headers(ACCEPT_JSON).await.unwrap();
            assert_eq!(headers.get(AUTHORIZATION).unwrap(), "token t0");
            assert_eq!(headers.get(ACCEPT).unwrap(), ACCEPT_JSON);
            assert_eq!(headers.get(USER_AGENT).unwrap(), USER_AGENT_VALUE);
        }
    }
}
