//! GitHub REST API transport.
//!
//! Talks to `api.github.com` (or an enterprise API root) using the
//! blocking reqwest client. Each call honours the deadline of the
//! [`RequestContext`] it is given, capped by the client's own request
//! timeout.

use std::time::Duration;

use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use url::Url;

use super::{
    ContentEntry, Contents, EntryKind, FileContent, Repo, RequestContext, Transport,
    TransportError,
};
use crate::registry::{DEFAULT_BRANCH, REGISTRY_MANIFEST_FILE};

/// Public GitHub API root.
pub const DEFAULT_API_ROOT: &str = "https://api.github.com/";

/// Default per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SHA_MEDIA_TYPE: &str = "application/vnd.github.v3.sha";
const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// GitHub transport over HTTP.
pub struct GitHubClient {
    client: Client,
    default_root: Url,
    api_root: Option<Url>,
    token: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<ApiEntry>),
    File(ApiEntry),
}

#[derive(Debug, Deserialize)]
struct ApiEntry {
    #[serde(rename = "type")]
    kind: EntryKind,
    path: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl GitHubClient {
    /// Create a client against the public API with the default timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("hubreg/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        let default_root =
            Url::parse(DEFAULT_API_ROOT).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client,
            default_root,
            api_root: None,
            token: None,
            timeout,
        })
    }

    /// Replace the root used when no enterprise root is set.
    pub fn with_default_root(mut self, root: Url) -> Self {
        self.default_root = root;
        self
    }

    /// Send `Authorization: token ...` with every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// The API root requests are currently sent to.
    pub fn api_root(&self) -> &Url {
        self.api_root.as_ref().unwrap_or(&self.default_root)
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint<'a>(
        &self,
        repo: &Repo,
        tail: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, TransportError> {
        let mut url = self.api_root().clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.api_root().to_string()))?
            .pop_if_empty()
            .push("repos")
            .push(&repo.org)
            .push(&repo.repo)
            .extend(tail.into_iter().filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn prepare(&self, ctx: &RequestContext, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining.min(self.timeout));
        }
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }
        request
    }

    fn send(
        &self,
        ctx: &RequestContext,
        url: &Url,
        media_type: &str,
    ) -> Result<reqwest::blocking::Response, TransportError> {
        ctx.check()?;
        let request = self
            .prepare(ctx, self.client.get(url.clone()))
            .header(ACCEPT, media_type);
        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

fn decode_content(url: &Url, entry: &ApiEntry) -> Result<Vec<u8>, TransportError> {
    let raw = entry.content.as_deref().unwrap_or_default();
    match entry.encoding.as_deref() {
        Some("base64") => {
            // The API wraps base64 payloads at 60 columns.
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| TransportError::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                })
        }
        None | Some("") => Ok(raw.as_bytes().to_vec()),
        Some(other) => Err(TransportError::Decode {
            url: url.to_string(),
            message: format!("unsupported content encoding: {}", other),
        }),
    }
}

impl Transport for GitHubClient {
    fn set_api_root(&mut self, root: Option<Url>) {
        match &root {
            Some(url) => tracing::debug!("using API root {}", url),
            None => tracing::debug!("using default API root {}", self.default_root),
        }
        self.api_root = root;
    }

    fn validate_url(&self, uri: &str) -> Result<(), TransportError> {
        let uri = uri.trim();
        let with_scheme = if uri.contains("://") {
            uri.to_string()
        } else {
            format!("https://{}", uri)
        };
        let mut url =
            Url::parse(&with_scheme).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        if !url.path().ends_with(REGISTRY_MANIFEST_FILE) {
            url.path_segments_mut()
                .map_err(|_| TransportError::InvalidUrl(with_scheme.clone()))?
                .pop_if_empty()
                .push(REGISTRY_MANIFEST_FILE);
        }

        tracing::debug!("verifying {}", url);
        let response = self
            .prepare(&RequestContext::background(), self.client.head(url.clone()))
            .send()?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }

    fn commit_sha(
        &self,
        ctx: &RequestContext,
        repo: &Repo,
        reference: &str,
    ) -> Result<String, TransportError> {
        let reference = if reference.is_empty() {
            DEFAULT_BRANCH
        } else {
            reference
        };
        tracing::debug!("fetching commit for {}@{}", repo, reference);

        let url = self.endpoint(repo, ["commits"].into_iter().chain(reference.split('/')))?;
        let body = self.send(ctx, &url, SHA_MEDIA_TYPE)?.text()?;
        Ok(body.trim().to_string())
    }

    fn contents(
        &self,
        ctx: &RequestContext,
        repo: &Repo,
        path: &str,
        revision: &str,
    ) -> Result<Contents, TransportError> {
        tracing::debug!("fetching contents for {}/{}@{}", repo, path, revision);

        let mut url = self.endpoint(repo, ["contents"].into_iter().chain(path.split('/')))?;
        if !revision.is_empty() {
            url.query_pairs_mut().append_pair("ref", revision);
        }

        let body = self.send(ctx, &url, JSON_MEDIA_TYPE)?.text()?;
        let parsed: ContentsResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        match parsed {
            ContentsResponse::Directory(entries) => Ok(Contents::Directory(
                entries
                    .into_iter()
                    .map(|e| ContentEntry {
                        path: e.path,
                        kind: e.kind,
                    })
                    .collect(),
            )),
            ContentsResponse::File(entry) => {
                let content = decode_content(&url, &entry)?;
                Ok(Contents::File(FileContent {
                    path: entry.path,
                    content,
                }))
            }
        }
    }
}
