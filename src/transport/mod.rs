//! Hosted-repository transport.
//!
//! The registry never talks to the network directly. It goes through the
//! [`Transport`] trait, which exposes the handful of repository operations
//! the cache manager and content resolver need:
//!
//! - resolve a reference (branch, tag, commit) to a commit id
//! - list a directory or read a file at a path and revision
//! - redirect the API root for enterprise deployments
//! - probe a registry URI for availability
//!
//! Two implementations ship with the crate: [`GitHubClient`] over the
//! GitHub REST API and [`MemoryTransport`], an in-memory repository used by
//! tests and offline tooling.

pub mod context;
pub mod github;
pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use context::{CancelToken, RequestContext};
pub use github::GitHubClient;
pub use memory::MemoryTransport;

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for URL: {url}")]
    Status { status: u16, url: String },

    /// Path or reference does not exist at the requested revision.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Response body could not be decoded.
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// A URL could not be built or parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The remote cannot be reached at all.
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    /// The request context was cancelled.
    #[error("Request cancelled")]
    Cancelled,

    /// The request context ran out of time.
    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

/// An organization/repository pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repo {
    pub org: String,
    pub repo: String,
}

impl Repo {
    pub fn new(org: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)
    }
}

/// Coordinates of content inside a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSpec {
    pub repo: Repo,
    /// Path within the repository.
    pub path: String,
    /// Branch, tag or commit id.
    pub revision: String,
}

impl fmt::Display for ContentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.repo, self.path, self.revision)
    }
}

/// Kind of a directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    /// Anything the API may add later.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::File => "file",
            Self::Dir => "dir",
            Self::Symlink => "symlink",
            Self::Submodule => "submodule",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One child of a directory listing. Carries no content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    /// Repository-root-relative path.
    pub path: String,
    pub kind: EntryKind,
}

/// A single file with decoded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    /// Repository-root-relative path.
    pub path: String,
    pub content: Vec<u8>,
}

/// Result of reading a path: either one file or a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    File(FileContent),
    Directory(Vec<ContentEntry>),
}

/// Capability set the registry requires from the hosting provider.
pub trait Transport {
    /// Point the transport at a custom API root. `None` restores the
    /// default (public) root.
    fn set_api_root(&mut self, root: Option<Url>);

    /// Probe a registry URI for availability.
    fn validate_url(&self, uri: &str) -> Result<(), TransportError>;

    /// Resolve a reference to a full commit id. An empty reference means
    /// the repository's default branch.
    fn commit_sha(
        &self,
        ctx: &RequestContext,
        repo: &Repo,
        reference: &str,
    ) -> Result<String, TransportError>;

    /// Read a file or list a directory at `path` and `revision`.
    fn contents(
        &self,
        ctx: &RequestContext,
        repo: &Repo,
        path: &str,
        revision: &str,
    ) -> Result<Contents, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_display() {
        assert_eq!(Repo::new("ksonnet", "parts").to_string(), "ksonnet/parts");
    }

    #[test]
    fn content_spec_display() {
        let spec = ContentSpec {
            repo: Repo::new("ksonnet", "parts"),
            path: "incubator/registry.yaml".to_string(),
            revision: "abc123".to_string(),
        };
        assert_eq!(spec.to_string(), "ksonnet/parts/incubator/registry.yaml@abc123");
    }

    #[test]
    fn entry_kind_deserializes_unknown_types() {
        let kind: EntryKind = serde_json::from_str("\"gitlink\"").unwrap();
        assert_eq!(kind, EntryKind::Unknown);

        let kind: EntryKind = serde_json::from_str("\"submodule\"").unwrap();
        assert_eq!(kind, EntryKind::Submodule);
    }

    #[test]
    fn status_error_mentions_code_and_url() {
        let err = TransportError::Status {
            status: 404,
            url: "https://api.github.com/repos/a/b".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("repos/a/b"));
    }
}
