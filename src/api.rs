// API client module: a small blocking gateway over the GitHub REST API.
// Each operation builds one or two requests, hands them to the injected
// `Transport` and decodes the result into plain Rust values. Write
// operations check before they write so repeating a run is harmless.

use crate::config::Credentials;
use crate::error::{ApiError, ApiErrorReason, GatewayError, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

/// A file to write: repository path, plain-text content, commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub content: String,
    pub message: String,
}

/// Fields of a pull request to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCreation {
    Created,
    AlreadyExists,
    Failed,
}

impl BranchCreation {
    /// True when the branch is there to be written to.
    pub fn is_ready(self) -> bool {
        !matches!(self, BranchCreation::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCreation {
    Created,
    AlreadyExists,
    Failed,
}

#[derive(Deserialize)]
struct RepoSummary {
    name: String,
}

#[derive(Deserialize)]
struct RepoDetails {
    default_branch: Option<String>,
}

/// Shared by the commit and contents endpoints; both carry a `sha`.
#[derive(Deserialize)]
struct ShaOnly {
    sha: Option<String>,
}

/// Authenticated GitHub client. Holds the transport and the pre-built
/// authorization header; the account is passed to every call.
pub struct ApiClient<T> {
    transport: T,
    authorization: HeaderValue,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, credentials: &Credentials) -> std::result::Result<Self, InvalidHeaderValue> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", credentials.token()))?;
        authorization.set_sensitive(true);
        Ok(ApiClient {
            transport,
            authorization,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.authorization.clone());
        headers
    }

    fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        request.headers.extend(self.auth_headers());
        tracing::debug!(method = %request.method, path = %request.path, "GitHub request");
        let response = self.transport.execute(&request)?;
        tracing::debug!(status = response.status, path = %request.path, "GitHub response");
        Ok(response)
    }

    /// Send and require a 2xx, returning the body.
    fn send_ok(&self, request: ApiRequest) -> Result<String> {
        let response = self.send(request)?;
        if !response.is_success() {
            return Err(ApiError::new(response.status, response.body).into());
        }
        Ok(response.body)
    }

    fn get_json<D: DeserializeOwned>(&self, request: ApiRequest) -> Result<D> {
        let endpoint = request.path.clone();
        let body = self.send_ok(request)?;
        serde_json::from_str(&body).map_err(|source| GatewayError::Decode { endpoint, source })
    }

    /// Names of the repositories owned by `account`.
    pub fn list_repositories(&self, account: &str) -> Result<Vec<String>> {
        let request = ApiRequest::new(Method::GET, format!("users/{}/repos", account));
        let repos: Vec<RepoSummary> = self.get_json(request)?;
        Ok(repos.into_iter().map(|r| r.name).collect())
    }

    /// `None` when the repository payload has no default branch.
    pub fn get_default_branch(&self, account: &str, repo: &str) -> Result<Option<String>> {
        let request = ApiRequest::new(Method::GET, format!("repos/{}/{}", account, repo));
        let details: RepoDetails = self.get_json(request)?;
        Ok(details.default_branch.filter(|b| !b.is_empty()))
    }

    pub fn get_latest_commit_sha(&self, account: &str, repo: &str, branch: &str) -> Result<Option<String>> {
        let request = ApiRequest::new(
            Method::GET,
            format!("repos/{}/{}/commits/{}", account, repo, branch),
        );
        let commit: ShaOnly = self.get_json(request)?;
        Ok(commit.sha.filter(|s| !s.is_empty()))
    }

    /// Create `refs/heads/<name>` at `base_sha`. An existing ref with that
    /// name counts as success; every other failure is logged and reported
    /// as `Failed` rather than returned as an error.
    pub fn create_branch(&self, account: &str, repo: &str, name: &str, base_sha: &str) -> BranchCreation {
        let request = ApiRequest::new(Method::POST, format!("repos/{}/{}/git/refs", account, repo))
            .json(json!({
                "ref": format!("refs/heads/{}", name),
                "sha": base_sha,
            }));

        match self.send_ok(request) {
            Ok(_) => {
                tracing::info!(repo, branch = name, sha = base_sha, "branch created");
                BranchCreation::Created
            }
            Err(GatewayError::Api(err)) if err.reason() == ApiErrorReason::ReferenceExists => {
                tracing::warn!(repo, branch = name, "branch already exists, reusing it");
                BranchCreation::AlreadyExists
            }
            Err(err) => {
                tracing::warn!(repo, branch = name, error = %err, "error creating branch");
                BranchCreation::Failed
            }
        }
    }

    fn contents_request(&self, account: &str, repo: &str, branch: &str, path: &str) -> ApiRequest {
        ApiRequest::new(
            Method::GET,
            format!("repos/{}/{}/contents/{}", account, repo, path),
        )
        .query("ref", branch)
    }

    /// A 404 means the file is not there; other failures are errors.
    pub fn file_exists(&self, account: &str, repo: &str, branch: &str, path: &str) -> Result<bool> {
        match self.send_ok(self.contents_request(account, repo, branch, path)) {
            Ok(_) => Ok(true),
            Err(GatewayError::Api(err)) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Blob SHA of the file on `branch`, or `None` if it does not exist.
    pub fn get_file_sha(&self, account: &str, repo: &str, branch: &str, path: &str) -> Result<Option<String>> {
        match self.get_json::<ShaOnly>(self.contents_request(account, repo, branch, path)) {
            Ok(file) => Ok(file.sha.filter(|s| !s.is_empty())),
            Err(GatewayError::Api(err)) if err.is_not_found() => Ok(None),
            Err(err) => {
                tracing::warn!(repo, path, error = %err, "failed to retrieve file SHA");
                Err(err)
            }
        }
    }

    fn put_contents(&self, account: &str, repo: &str, branch: &str, change: &FileChange, sha: Option<&str>) -> Result<String> {
        let mut body = json!({
            "message": change.message,
            "content": STANDARD.encode(change.content.as_bytes()),
            "branch": branch,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }
        let request = ApiRequest::new(
            Method::PUT,
            format!("repos/{}/{}/contents/{}", account, repo, change.path),
        )
        .json(body);
        self.send_ok(request)
    }

    /// Create the file unless it is already on the branch. A failed
    /// existence check is returned as an error; a failed write is `Failed`.
    pub fn create_file(&self, account: &str, repo: &str, branch: &str, change: &FileChange) -> Result<FileCreation> {
        if self.file_exists(account, repo, branch, &change.path)? {
            return Ok(FileCreation::AlreadyExists);
        }
        match self.put_contents(account, repo, branch, change, None) {
            Ok(_) => {
                tracing::info!(repo, branch, path = %change.path, "file created");
                Ok(FileCreation::Created)
            }
            Err(err) => {
                tracing::warn!(repo, path = %change.path, error = %err, "error creating file");
                Ok(FileCreation::Failed)
            }
        }
    }

    /// Overwrite an existing file. The current blob SHA is resolved first
    /// and sent along so GitHub rejects the write if the file moved under
    /// us; a file with no SHA cannot be updated and no write is attempted.
    pub fn update_file(&self, account: &str, repo: &str, branch: &str, change: &FileChange) -> Result<bool> {
        let Some(sha) = self.get_file_sha(account, repo, branch, &change.path)? else {
            tracing::warn!(repo, path = %change.path, "file not found or unable to retrieve SHA");
            return Ok(false);
        };
        match self.put_contents(account, repo, branch, change, Some(&sha)) {
            Ok(_) => {
                tracing::info!(repo, branch, path = %change.path, "file updated");
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(repo, path = %change.path, error = %err, "failed to update file");
                Ok(false)
            }
        }
    }

    /// Open a pull request. Failures are logged and reported as `false`.
    pub fn create_pull_request(&self, account: &str, repo: &str, draft: &PullRequestDraft) -> bool {
        let request = ApiRequest::new(Method::POST, format!("repos/{}/{}/pulls", account, repo))
            .json(json!({
                "title": draft.title,
                "head": draft.head,
                "base": draft.base,
                "body": draft.body,
            }));
        match self.send_ok(request) {
            Ok(_) => {
                tracing::info!(repo, head = %draft.head, base = %draft.base, "pull request created");
                true
            }
            Err(err) => {
                tracing::warn!(repo, head = %draft.head, error = %err, "error creating pull request");
                false
            }
        }
    }

    /// Whether an open pull request has head `account:head_branch`.
    pub fn pull_request_exists(&self, account: &str, repo: &str, head_branch: &str) -> Result<bool> {
        let request = ApiRequest::new(Method::GET, format!("repos/{}/{}/pulls", account, repo))
            .query("state", "open")
            .query("head", format!("{}:{}", account, head_branch));
        let pulls: Vec<serde_json::Value> = self.get_json(request)?;
        Ok(!pulls.is_empty())
    }
}
