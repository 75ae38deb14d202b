//! Registry location parsing.
//!
//! A registry lives somewhere inside a GitHub repository. Users point at it
//! with whatever URL they copied from the browser or from their enterprise
//! API, so several dialects are accepted:
//!
//! - repository root: `github.com/ksonnet/parts`
//! - directory: `github.com/ksonnet/parts/tree/master/incubator`
//! - manifest file: `github.com/ksonnet/parts/blob/master/incubator/registry.yaml`
//! - enterprise: `https://github.corp.com/api/v3/repos/org/parts/contents/incubator?ref=master`
//!
//! [`RegistryDescriptor::parse`] normalizes all of them into the same five
//! coordinates: organization, repository, reference and two
//! repository-relative paths.

use std::collections::BTreeMap;
use std::path::PathBuf;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::{DEFAULT_BRANCH, REGISTRY_MANIFEST_FILE};
use crate::transport::Repo;

/// Host suffix of public GitHub.
pub const PUBLIC_HOST: &str = "github.com";

/// Root for raw file downloads on public GitHub.
pub const RAW_GITHUB_ROOT: &str = "https://raw.githubusercontent.com";

const SCHEMED_PREFIXES: [&str; 4] = [
    "http://github.",
    "https://github.",
    "http://www.github.",
    "https://www.github.",
];
const BARE_PREFIXES: [&str; 2] = ["github.", "www.github."];

/// A registry URI that could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UriError {
    #[error(
        "Registries using protocol 'github' must provide URIs beginning with 'github' \
         (optionally prefaced with 'http', 'https', 'www', and so on): {uri}"
    )]
    UnsupportedHost { uri: String },

    #[error("Malformed registry URI {uri}: {message}")]
    Malformed { uri: String, message: String },

    #[error("Enterprise GitHub URI must point at a repository's V3 API 'repos' endpoint: {uri}")]
    MissingReposSegment { uri: String },

    #[error("Only a single 'ref' query parameter is allowed in enterprise registry URI: {uri}")]
    EnterpriseQuery { uri: String },

    #[error("No query strings allowed in registry URI: {uri}")]
    QueryNotAllowed { uri: String },

    #[error("GitHub URI must point at a repository: {uri}")]
    NotARepository { uri: String },

    #[error(
        "Invalid GitHub URI {uri}: navigate in GitHub to the folder containing \
         'registry.yaml' and use that URI instead. It should look like \
         'github.com/{{organization}}/{{repository}}/tree/{{branch}}/[path-to-directory]'"
    )]
    UnrecognizedPath { uri: String },
}

/// Canonical coordinates of a registry inside a repository.
///
/// Both paths are repository-root-relative with no leading or trailing
/// slash. The spec path is always the registry path plus
/// [`REGISTRY_MANIFEST_FILE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryDescriptor {
    base_url: Option<Url>,
    organization: String,
    repository: String,
    revision_ref: String,
    registry_relative_path: String,
    registry_spec_relative_path: String,
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Characters escaped when a path segment goes back into a URL.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn decode_segment(segment: &str, uri: &str) -> Result<String, UriError> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| UriError::Malformed {
            uri: uri.to_string(),
            message: format!("path segment '{}' is not valid UTF-8: {}", segment, e),
        })
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|s| utf8_percent_encode(s, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

impl RegistryDescriptor {
    /// Parse a registry URI.
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let trimmed = uri.trim();
        let err_uri = || trimmed.to_string();

        let normalized = if SCHEMED_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            trimmed.to_string()
        } else if BARE_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            format!("http://{}", trimmed)
        } else {
            return Err(UriError::UnsupportedHost { uri: err_uri() });
        };

        let parsed = Url::parse(&normalized).map_err(|e| UriError::Malformed {
            uri: err_uri(),
            message: e.to_string(),
        })?;
        let host = parsed.host_str().unwrap_or_default();
        // Encoded segments rebuild the enterprise API root; everything else
        // uses the decoded form the content API reports.
        let raw_segments: Vec<&str> = parsed.path().split('/').collect();
        let segments = raw_segments
            .iter()
            .map(|s| decode_segment(s, trimmed))
            .collect::<Result<Vec<_>, _>>()?;
        let enterprise = !host.ends_with(PUBLIC_HOST);

        let mut queries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in parsed.query_pairs() {
            queries
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }

        let (base_index, base_url, query_ref) = if enterprise {
            let base_index = segments
                .iter()
                .position(|s| s == "repos")
                .ok_or_else(|| UriError::MissingReposSegment { uri: err_uri() })?;

            let mut base = format!("{}://{}", parsed.scheme(), host);
            if let Some(port) = parsed.port() {
                base.push_str(&format!(":{}", port));
            }
            base.push_str(&raw_segments[..base_index].join("/"));
            base.push('/');
            let base_url = Url::parse(&base).map_err(|e| UriError::Malformed {
                uri: err_uri(),
                message: e.to_string(),
            })?;

            let query_ref = match queries.len() {
                0 => String::new(),
                1 => match queries.get("ref") {
                    Some(values) if values.len() == 1 => values[0].clone(),
                    _ => return Err(UriError::EnterpriseQuery { uri: err_uri() }),
                },
                _ => return Err(UriError::EnterpriseQuery { uri: err_uri() }),
            };
            (base_index, Some(base_url), query_ref)
        } else {
            if !queries.is_empty() {
                return Err(UriError::QueryNotAllowed { uri: err_uri() });
            }
            (0, None, String::new())
        };

        // The path starts with '/', so the segment at the anchor is blank.
        if segments.len() < base_index + 3
            || segments[base_index + 1].is_empty()
            || segments[base_index + 2].is_empty()
        {
            return Err(UriError::NotARepository { uri: err_uri() });
        }

        let mut descriptor = Self {
            base_url,
            organization: segments[base_index + 1].clone(),
            repository: segments[base_index + 2].clone(),
            revision_ref: DEFAULT_BRANCH.to_string(),
            registry_relative_path: String::new(),
            registry_spec_relative_path: REGISTRY_MANIFEST_FILE.to_string(),
        };

        // Doubled and trailing slashes carry no meaning past the repository.
        let tail: Vec<String> = segments[base_index + 3..]
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect();

        if enterprise {
            if !query_ref.is_empty() || tail.len() > 1 {
                descriptor.revision_ref = query_ref;
            }
            // `tail[0]` is the content API mount ("contents"); everything
            // after it addresses the registry directly.
            if tail.len() > 1 {
                descriptor.set_paths_from(&tail[1..]);
            }
            return Ok(descriptor);
        }

        if tail.is_empty() {
            return Ok(descriptor);
        }

        match tail[0].as_str() {
            "tree" if tail.len() >= 2 => {
                descriptor.revision_ref = tail[1].clone();
                let registry = tail[2..].join("/");
                descriptor.registry_spec_relative_path =
                    join_path(&registry, REGISTRY_MANIFEST_FILE);
                descriptor.registry_relative_path = registry;
                Ok(descriptor)
            }
            "blob" if tail.len() >= 3 && tail[tail.len() - 1] == REGISTRY_MANIFEST_FILE => {
                descriptor.revision_ref = tail[1].clone();
                descriptor.registry_relative_path = tail[2..tail.len() - 1].join("/");
                descriptor.registry_spec_relative_path = tail[2..].join("/");
                Ok(descriptor)
            }
            _ => Err(UriError::UnrecognizedPath { uri: err_uri() }),
        }
    }

    fn set_paths_from(&mut self, rest: &[String]) {
        match rest.split_last() {
            Some((last, dir)) if last == REGISTRY_MANIFEST_FILE => {
                self.registry_relative_path = dir.join("/");
                self.registry_spec_relative_path = rest.join("/");
            }
            _ => {
                let registry = rest.join("/");
                self.registry_spec_relative_path = join_path(&registry, REGISTRY_MANIFEST_FILE);
                self.registry_relative_path = registry;
            }
        }
    }

    /// API root for enterprise deployments; `None` on public GitHub.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Configured branch, tag or commit. Empty means the default branch.
    pub fn revision_ref(&self) -> &str {
        &self.revision_ref
    }

    /// Repository-relative directory holding the registry.
    pub fn registry_relative_path(&self) -> &str {
        &self.registry_relative_path
    }

    /// Repository-relative path of `registry.yaml`.
    pub fn registry_spec_relative_path(&self) -> &str {
        &self.registry_spec_relative_path
    }

    /// Whether this descriptor targets a GitHub Enterprise deployment.
    pub fn is_enterprise(&self) -> bool {
        self.base_url.is_some()
    }

    pub fn repo(&self) -> Repo {
        Repo::new(&self.organization, &self.repository)
    }

    /// Repository-relative directory of a library.
    pub fn library_path(&self, library: &str) -> String {
        join_path(&self.registry_relative_path, library)
    }

    /// Rebase a repository-root-relative path onto the registry root.
    ///
    /// ```
    /// use hubreg::registry::RegistryDescriptor;
    ///
    /// let hd = RegistryDescriptor::parse("github.com/ksonnet/parts/tree/master/long/path/incubator").unwrap();
    /// assert_eq!(hd.rebase_to_root("long/path/incubator/parts.yaml"), "parts.yaml");
    /// ```
    pub fn rebase_to_root(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        let root = self.registry_relative_path.as_str();
        if root.is_empty() {
            return path.to_string();
        }
        match path.strip_prefix(root) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                rest.trim_start_matches('/').to_string()
            }
            _ => path.to_string(),
        }
    }

    /// Location of a repository path inside a registry's cache directory.
    ///
    /// `long/path/incubator/parts.yaml` under registry `incubator` becomes
    /// `incubator/parts.yaml`.
    pub fn cache_path(&self, name: &str, path: &str) -> PathBuf {
        let rebased = self.rebase_to_root(path);
        if rebased.is_empty() {
            PathBuf::from(name)
        } else {
            PathBuf::from(name).join(rebased)
        }
    }

    /// Raw download URL of the registry manifest on public GitHub.
    pub fn raw_manifest_url(&self) -> String {
        [
            RAW_GITHUB_ROOT.to_string(),
            encode_path(&self.organization),
            encode_path(&self.repository),
            encode_path(&self.revision_ref),
            encode_path(&self.registry_spec_relative_path),
        ]
        .join("/")
    }
}
