//! GitHub contents API backend.
//!
//! Objects live in a git repository and are read and written one file at a
//! time through `repos/{owner}/{repo}/contents/{path}`. Every response carries
//! the blob `sha`, which doubles as the concurrency token: a `PUT` that names
//! a stale `sha` is rejected by GitHub with `409 Conflict`.
//!
//! # Credentials
//!
//! The bearer token is supplied per call and never stored on the backend, so
//! a single backend can be shared between operators.

use crate::error::{ErrorKind, Result};
use crate::models::{Committed, Credential, Lookup, Repository, StoredObject, Token, WriteRequest};
use crate::{ContentStore, validate_path};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// GitHub (or GitHub Enterprise) content store.
///
/// # Examples
///
/// ```no_run
/// use gallery_store::backend::{DEFAULT_API_URL, GitHubBackend};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = GitHubBackend::new("github", DEFAULT_API_URL)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GitHubBackend {
    name: String,
    http: Client,
    api: Url,
}

impl GitHubBackend {
    /// Create a new backend against the given API root.
    ///
    /// # Arguments
    /// * `name` - A name for this backend (used in logging)
    /// * `api_url` - API root, e.g. `https://api.github.com` or
    ///   `https://github.example.com/api/v3`
    pub fn new(name: impl Into<String>, api_url: impl AsRef<str>) -> Result<Self> {
        let api_url = api_url.as_ref();
        let api = Url::parse(api_url).or_raise(|| ErrorKind::InvalidUrl(api_url.to_string()))?;
        if api.cannot_be_a_base() {
            exn::bail!(ErrorKind::InvalidUrl(api_url.to_string()));
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .or_raise(|| ErrorKind::Network("failed to initialise HTTP client".to_string()))?;
        Ok(Self { name: name.into(), http, api })
    }

    /// Build the contents URL for an object, percent-encoding each path
    /// segment on its own so that `/` keeps separating segments while `#`,
    /// `?`, spaces and non-ASCII characters inside a segment survive.
    fn contents_url(&self, repository: &Repository, path: &str) -> Result<Url> {
        let path = validate_path(path)?;
        let mut url = self.api.clone();
        {
            // Infallible: cannot_be_a_base() was rejected in the constructor.
            let Ok(mut segments) = url.path_segments_mut() else {
                exn::bail!(ErrorKind::InvalidUrl(self.api.to_string()));
            };
            segments
                .pop_if_empty()
                .extend(["repos", repository.owner(), repository.name(), "contents"])
                .extend(path.split('/'));
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, credential: &Credential) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(credential.expose())
            .header(ACCEPT, MEDIA_TYPE)
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

#[async_trait]
impl ContentStore for GitHubBackend {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, credential, repository), fields(store = %self.name, repository = %repository))]
    async fn read(
        &self,
        credential: &Credential,
        repository: &Repository,
        path: &str,
        reference: &str,
    ) -> Result<Lookup> {
        let mut url = self.contents_url(repository, path)?;
        url.query_pairs_mut().append_pair("ref", reference);

        let response = self
            .request(Method::GET, url, credential)
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("GET {path}")))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("Object does not exist");
            return Ok(Lookup::NotFound);
        }
        let body = response.text().await.or_raise(|| ErrorKind::Network(format!("GET {path}")))?;
        if !status.is_success() {
            exn::bail!(classify(status, &body, path));
        }

        let contents: ContentsResponse =
            serde_json::from_str(&body).or_raise(|| ErrorKind::InvalidResponse(format!("GET {path}")))?;
        let content = inline_content(&contents, path)?;
        tracing::debug!(sha = %contents.sha, size = content.len(), "Object read");
        Ok(Lookup::Found(StoredObject {
            path: contents.path,
            content,
            token: Token::from(contents.sha),
        }))
    }

    #[instrument(
        skip(self, credential, repository, request),
        fields(store = %self.name, repository = %repository, path = %request.path)
    )]
    async fn write(
        &self,
        credential: &Credential,
        repository: &Repository,
        request: WriteRequest,
    ) -> Result<Committed> {
        let url = self.contents_url(repository, &request.path)?;
        let body = PutRequest {
            message: &request.message,
            content: &request.content,
            branch: &request.branch,
            sha: request.expected.as_ref().map(Token::as_str),
        };

        let response = self
            .request(Method::PUT, url, credential)
            .json(&body)
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("PUT {}", request.path)))?;
        let status = response.status();
        let text = response.text().await.or_raise(|| ErrorKind::Network(format!("PUT {}", request.path)))?;
        if !status.is_success() {
            exn::bail!(classify(status, &text, &request.path));
        }

        let committed: PutResponse =
            serde_json::from_str(&text).or_raise(|| ErrorKind::InvalidResponse(format!("PUT {}", request.path)))?;
        tracing::debug!(sha = %committed.content.sha, "Object written");
        Ok(Committed {
            path: committed.content.path,
            token: Some(Token::from(committed.content.sha)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    path: String,
    sha: String,
    // Absent for directories, submodules and symlinks.
    #[serde(default)]
    content: Option<String>,
    // "none" when the file is too large to inline (over 1 MB).
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    path: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    documentation_url: Option<String>,
}

/// Turn a non-2xx response into an [`ErrorKind`].
///
/// 409 and 412 are stale tokens. GitHub answers 422 when a file is created
/// without a `sha` although it already exists, which is the same collision
/// seen from the other side.
fn classify(status: StatusCode, body: &str, path: &str) -> ErrorKind {
    let message = describe(status, body);
    match status {
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => ErrorKind::Conflict {
            path: path.to_string(),
            status: status.as_u16(),
            message,
        },
        StatusCode::UNPROCESSABLE_ENTITY if message.contains("\"sha\"") => ErrorKind::Conflict {
            path: path.to_string(),
            status: status.as_u16(),
            message,
        },
        _ => ErrorKind::Status { status: status.as_u16(), message },
    }
}

/// Only inline base64 content is usable. Anything else would read as an
/// empty object and get overwritten on the next write.
fn inline_content(contents: &ContentsResponse, path: &str) -> Result<String> {
    match (contents.encoding.as_deref(), &contents.content) {
        (Some("base64"), Some(content)) => Ok(content.clone()),
        (Some(encoding), _) if encoding != "base64" => {
            exn::bail!(ErrorKind::InvalidResponse(format!("GET {path}: content not inlined (encoding {encoding})")))
        },
        _ => exn::bail!(ErrorKind::InvalidResponse(format!("GET {path}: no inline content"))),
    }
}

/// Prefer the store's own error message; fall back to the status line.
fn describe(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError { message: Some(message), documentation_url: Some(url) }) => format!("{message} ({url})"),
        Ok(ApiError { message: Some(message), documentation_url: None }) => message,
        _ => format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or("Unknown Status")),
    }
}
