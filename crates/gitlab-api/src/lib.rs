//! GitLab repository API client for Rust
//!
//! A small async wrapper around the GitLab v4 REST API covering repository
//! tree listings and repository file retrieval.
//!
//! # Example
//!
//! ```no_run
//! use gitlab_api::{Gitlab, TreeOptions};
//!
//! # async fn run() -> gitlab_api::Result<()> {
//! let gitlab = Gitlab::new("https://gitlab.com", "glpat-xxxx")?;
//!
//! // List the top level of the default branch
//! let tree = gitlab
//!     .repositories()
//!     .all_repository_trees("group/project", &TreeOptions::default())
//!     .await?;
//!
//! // Fetch a single file at a given ref
//! let file = gitlab
//!     .repository_files()
//!     .show("group/project", "src/main.rs", "main")
//!     .await?;
//! # let _ = (tree, file);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size requested from paginated endpoints (GitLab's maximum)
const PER_PAGE: u32 = 100;

/// Ref sent to the files endpoint when the caller leaves it blank.
/// GitLab resolves `HEAD` to the project's default branch.
const DEFAULT_REF: &str = "HEAD";

const DEFAULT_USER_AGENT: &str = concat!("gitlab-api/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when talking to GitLab
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid GitLab host: {0}")]
    InvalidHost(String),

    #[error("Access token must not be empty")]
    MissingToken,

    #[error("GitLab API error: HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status code, when GitLab answered with a non-success status
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The message GitLab attached to an error response, if any
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Error::Status { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Result type for GitLab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Options for the repository tree listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeOptions {
    /// Path inside the repository; empty means the root
    #[serde(default)]
    pub path: String,

    /// Branch, tag or commit; empty means the default branch
    #[serde(default, rename = "ref")]
    pub git_ref: String,

    /// List subdirectories recursively
    #[serde(default)]
    pub recursive: bool,
}

impl TreeOptions {
    pub fn new(path: impl Into<String>, git_ref: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            git_ref: git_ref.into(),
            recursive: false,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// The repository calls a consumer can make against a GitLab handle.
///
/// [`Gitlab`] is the network-backed implementation.
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    /// List a repository tree, all pages concatenated into one JSON array
    async fn repository_tree(&self, project_id: &str, options: &TreeOptions) -> Result<Value>;

    /// Fetch a repository file with its metadata and base64 content
    async fn repository_file(&self, project_id: &str, file_path: &str, git_ref: &str)
        -> Result<Value>;
}

/// Builder for a [`Gitlab`] handle
#[derive(Debug, Clone)]
pub struct GitlabBuilder {
    host: String,
    token: String,
    timeout: Duration,
    user_agent: String,
}

impl GitlabBuilder {
    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the handle
    pub fn build(self) -> Result<Gitlab> {
        if self.token.trim().is_empty() {
            return Err(Error::MissingToken);
        }
        let base_url = normalize_host(&self.host)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let user_agent = header::HeaderValue::from_str(&self.user_agent)
            .unwrap_or_else(|_| header::HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(header::USER_AGENT, user_agent);

        let client = Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Gitlab {
            client,
            api_url: format!("{}/api/v4", base_url),
            token: self.token,
        })
    }
}

/// Connected GitLab API handle
#[derive(Clone)]
pub struct Gitlab {
    client: Client,
    api_url: String,
    token: String,
}

impl std::fmt::Debug for Gitlab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gitlab")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Gitlab {
    /// Create a handle with default settings
    pub fn new(host: &str, token: impl Into<String>) -> Result<Self> {
        Self::builder(host, token).build()
    }

    /// Start building a handle
    pub fn builder(host: &str, token: impl Into<String>) -> GitlabBuilder {
        GitlabBuilder {
            host: host.to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Base URL of the v4 API, e.g. `https://gitlab.com/api/v4`
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Repository endpoints
    pub fn repositories(&self) -> Repositories<'_> {
        Repositories { gitlab: self }
    }

    /// Repository file endpoints
    pub fn repository_files(&self) -> RepositoryFiles<'_> {
        RepositoryFiles { gitlab: self }
    }

    fn project_url(&self, project_id: &str) -> String {
        format!("{}/projects/{}", self.api_url, urlencoding::encode(project_id))
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(query)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Status {
                    status: status.as_u16(),
                    message: error_message(status, &body),
                })
            }
        }
    }
}

#[async_trait]
impl RepositoryApi for Gitlab {
    async fn repository_tree(&self, project_id: &str, options: &TreeOptions) -> Result<Value> {
        let entries = self
            .repositories()
            .all_repository_trees(project_id, options)
            .await?;
        Ok(Value::Array(entries))
    }

    async fn repository_file(
        &self,
        project_id: &str,
        file_path: &str,
        git_ref: &str,
    ) -> Result<Value> {
        self.repository_files()
            .show(project_id, file_path, git_ref)
            .await
    }
}

/// `/projects/:id/repository/*`
pub struct Repositories<'a> {
    gitlab: &'a Gitlab,
}

impl Repositories<'_> {
    /// List every entry of a repository tree, following `X-Next-Page`
    pub async fn all_repository_trees(
        &self,
        project_id: &str,
        options: &TreeOptions,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/repository/tree", self.gitlab.project_url(project_id));
        let mut entries = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut query = vec![
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
                ("recursive", options.recursive.to_string()),
            ];
            if !options.path.is_empty() {
                query.push(("path", options.path.clone()));
            }
            if !options.git_ref.is_empty() {
                query.push(("ref", options.git_ref.clone()));
            }

            debug!(project_id = %project_id, path = %options.path, page, "Fetching repository tree page");

            let response = self.gitlab.get(&url, &query).await?;
            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok());

            let batch: Vec<Value> = response.json().await?;
            entries.extend(batch);

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        debug!(project_id = %project_id, count = entries.len(), "Repository tree complete");
        Ok(entries)
    }
}

/// `/projects/:id/repository/files/*`
pub struct RepositoryFiles<'a> {
    gitlab: &'a Gitlab,
}

impl RepositoryFiles<'_> {
    /// Fetch a file's metadata and base64-encoded content
    pub async fn show(&self, project_id: &str, file_path: &str, git_ref: &str) -> Result<Value> {
        let url = format!(
            "{}/repository/files/{}",
            self.gitlab.project_url(project_id),
            urlencoding::encode(file_path)
        );
        let git_ref = if git_ref.trim().is_empty() {
            DEFAULT_REF
        } else {
            git_ref
        };

        debug!(project_id = %project_id, file_path = %file_path, git_ref = %git_ref, "Fetching repository file");

        let response = self
            .gitlab
            .get(&url, &[("ref", git_ref.to_string())])
            .await?;
        Ok(response.json().await?)
    }
}

/// Normalize a user-supplied host into a base URL without trailing slash.
///
/// Accepts bare hostnames (`gitlab.example.com`), full URLs, and URLs that
/// already end in `/api/v4`.
pub fn normalize_host(host: &str) -> Result<String> {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidHost("host is empty".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let base = with_scheme
        .strip_suffix("/api/v4")
        .unwrap_or(&with_scheme)
        .to_string();

    let url = reqwest::Url::parse(&base).map_err(|e| Error::InvalidHost(format!("{}: {}", host, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::InvalidHost(format!(
                "{}: unsupported scheme '{}'",
                host, other
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidHost(format!("{}: missing hostname", host)));
    }

    Ok(base)
}

/// Pull a human-readable message out of a GitLab error body.
///
/// GitLab answers with `{"message": ...}` or `{"error": ...}`; validation
/// failures put an object under `message`.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            match json.get(key) {
                Some(Value::String(s)) => return s.clone(),
                Some(Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    let text = body.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode as AxumStatus},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral port and return its base URL
    async fn spawn_server(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("https://gitlab.com").unwrap(),
            "https://gitlab.com"
        );
        assert_eq!(
            normalize_host("https://gitlab.com/").unwrap(),
            "https://gitlab.com"
        );
        assert_eq!(
            normalize_host("gitlab.example.com").unwrap(),
            "https://gitlab.example.com"
        );
        assert_eq!(
            normalize_host("https://gitlab.example.com/api/v4/").unwrap(),
            "https://gitlab.example.com"
        );
        assert_eq!(
            normalize_host("http://localhost:8080").unwrap(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_normalize_host_rejects_garbage() {
        assert!(matches!(normalize_host(""), Err(Error::InvalidHost(_))));
        assert!(matches!(normalize_host("   "), Err(Error::InvalidHost(_))));
        assert!(matches!(
            normalize_host("ftp://gitlab.com"),
            Err(Error::InvalidHost(_))
        ));
    }

    #[test]
    fn test_builder_requires_token() {
        let result = Gitlab::new("https://gitlab.com", "  ");
        assert!(matches!(result, Err(Error::MissingToken)));
    }

    #[test]
    fn test_api_url() {
        let gitlab = Gitlab::new("gitlab.example.com/", "token").unwrap();
        assert_eq!(gitlab.api_url(), "https://gitlab.example.com/api/v4");
    }

    #[test]
    fn test_debug_redacts_token() {
        let gitlab = Gitlab::new("https://gitlab.com", "glpat-secret").unwrap();
        let debug = format!("{:?}", gitlab);
        assert!(!debug.contains("glpat-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, r#"{"message":"404 File Not Found"}"#),
            "404 File Not Found"
        );
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"error":"invalid_token"}"#),
            "invalid_token"
        );
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"message":{"ref":["is missing"]}}"#
            ),
            r#"{"ref":["is missing"]}"#
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            "boom"
        );
    }

    #[test]
    fn test_error_status() {
        let err = Error::Status {
            status: 404,
            message: "404 Project Not Found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.api_message(), Some("404 Project Not Found"));
        assert_eq!(Error::MissingToken.status(), None);
    }

    #[test]
    fn test_tree_options_builder() {
        let options = TreeOptions::new("src", "main").recursive(true);
        assert_eq!(options.path, "src");
        assert_eq!(options.git_ref, "main");
        assert!(options.recursive);

        let default = TreeOptions::default();
        assert!(default.path.is_empty());
        assert!(!default.recursive);
    }

    #[tokio::test]
    async fn test_tree_follows_pagination() {
        async fn tree(
            Path(id): Path<String>,
            Query(query): Query<HashMap<String, String>>,
            headers: HeaderMap,
        ) -> impl IntoResponse {
            assert_eq!(id, "group/project");
            assert_eq!(headers.get("private-token").unwrap(), "secret");
            assert_eq!(query.get("path").map(String::as_str), Some("src"));
            assert_eq!(query.get("ref").map(String::as_str), Some("main"));
            assert_eq!(query.get("recursive").map(String::as_str), Some("true"));
            assert_eq!(query.get("per_page").map(String::as_str), Some("100"));

            match query.get("page").map(String::as_str) {
                Some("1") => (
                    [("x-next-page", "2")],
                    Json(json!([{"name": "a.rs"}, {"name": "b.rs"}])),
                ),
                _ => ([("x-next-page", "")], Json(json!([{"name": "c.rs"}]))),
            }
        }

        let router = Router::new().route("/api/v4/projects/{id}/repository/tree", get(tree));
        let base = spawn_server(router).await;
        let gitlab = Gitlab::new(&base, "secret").unwrap();

        let entries = gitlab
            .repositories()
            .all_repository_trees(
                "group/project",
                &TreeOptions::new("src", "main").recursive(true),
            )
            .await
            .unwrap();

        let names: Vec<&str> = entries
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.rs", "b.rs", "c.rs"]);
    }

    #[tokio::test]
    async fn test_tree_omits_empty_path_and_ref() {
        async fn tree(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
            assert!(!query.contains_key("path"));
            assert!(!query.contains_key("ref"));
            assert_eq!(query.get("recursive").map(String::as_str), Some("false"));
            Json(json!([]))
        }

        let router = Router::new().route("/api/v4/projects/{id}/repository/tree", get(tree));
        let base = spawn_server(router).await;
        let gitlab = Gitlab::new(&base, "secret").unwrap();

        let value = gitlab
            .repository_tree("42", &TreeOptions::default())
            .await
            .unwrap();
        assert_eq!(value, json!([]));
    }

    #[tokio::test]
    async fn test_show_file_encodes_path() {
        async fn file(
            Path((id, file_path)): Path<(String, String)>,
            Query(query): Query<HashMap<String, String>>,
        ) -> Json<Value> {
            Json(json!({
                "project": id,
                "file_path": file_path,
                "ref": query.get("ref"),
                "content": "aGVsbG8=",
                "encoding": "base64",
            }))
        }

        let router = Router::new().route(
            "/api/v4/projects/{id}/repository/files/{file_path}",
            get(file),
        );
        let base = spawn_server(router).await;
        let gitlab = Gitlab::new(&base, "secret").unwrap();

        let value = gitlab
            .repository_files()
            .show("group/project", "src/lib.rs", "v1.0")
            .await
            .unwrap();
        assert_eq!(value["project"], "group/project");
        assert_eq!(value["file_path"], "src/lib.rs");
        assert_eq!(value["ref"], "v1.0");

        let value = gitlab
            .repository_file("group/project", "README.md", "")
            .await
            .unwrap();
        assert_eq!(value["ref"], "HEAD");
    }

    #[tokio::test]
    async fn test_status_error_carries_gitlab_message() {
        async fn missing() -> impl IntoResponse {
            (
                AxumStatus::NOT_FOUND,
                Json(json!({"message": "404 File Not Found"})),
            )
        }

        let router = Router::new().route(
            "/api/v4/projects/{id}/repository/files/{file_path}",
            get(missing),
        );
        let base = spawn_server(router).await;
        let gitlab = Gitlab::new(&base, "secret").unwrap();

        let err = gitlab
            .repository_file("1", "nope.txt", "main")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.api_message(), Some("404 File Not Found"));
        assert_eq!(
            err.to_string(),
            "GitLab API error: HTTP 404: 404 File Not Found"
        );
    }
}
