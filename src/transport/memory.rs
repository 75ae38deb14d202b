//! In-memory repository transport.
//!
//! [`MemoryTransport`] models a single repository as a set of revisions,
//! each holding a tree of files, directories, symlinks and submodules.
//! It counts the calls it receives so callers can assert how much network
//! traffic an operation would have produced, and it can be switched
//! offline to simulate an unreachable remote.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

use url::Url;

use super::{
    ContentEntry, Contents, EntryKind, FileContent, Repo, RequestContext, Transport,
    TransportError,
};
use crate::registry::DEFAULT_BRANCH;

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
    Symlink,
    Submodule,
}

/// A scripted repository served from memory.
///
/// # Example
///
/// ```
/// use hubreg::transport::{Contents, MemoryTransport, Repo, RequestContext, Transport};
///
/// let transport = MemoryTransport::new()
///     .with_ref("master", "c0ffee")
///     .with_file("c0ffee", "incubator/registry.yaml", "libraries: {}\n");
///
/// let ctx = RequestContext::background();
/// let repo = Repo::new("ksonnet", "parts");
/// assert_eq!(transport.commit_sha(&ctx, &repo, "master").unwrap(), "c0ffee");
/// assert!(matches!(
///     transport.contents(&ctx, &repo, "incubator", "c0ffee").unwrap(),
///     Contents::Directory(_)
/// ));
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    refs: HashMap<String, String>,
    trees: HashMap<String, BTreeMap<String, Node>>,
    api_root: Option<Url>,
    offline: bool,
    commit_calls: Cell<usize>,
    content_calls: Cell<usize>,
    probe_calls: Cell<usize>,
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

impl MemoryTransport {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `reference` at `sha`.
    pub fn with_ref(mut self, reference: impl Into<String>, sha: impl Into<String>) -> Self {
        self.point_ref(reference, sha);
        self
    }

    /// Add a file at `revision`, creating parent directories.
    pub fn with_file(
        mut self,
        revision: &str,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        self.insert(revision, path, Node::File(content.into()));
        self
    }

    /// Add a symlink entry at `revision`.
    pub fn with_symlink(mut self, revision: &str, path: &str) -> Self {
        self.insert(revision, path, Node::Symlink);
        self
    }

    /// Add a submodule entry at `revision`.
    pub fn with_submodule(mut self, revision: &str, path: &str) -> Self {
        self.insert(revision, path, Node::Submodule);
        self
    }

    /// Move `reference` to a new commit.
    pub fn point_ref(&mut self, reference: impl Into<String>, sha: impl Into<String>) {
        self.refs.insert(reference.into(), sha.into());
    }

    /// Make every call fail as if the remote were unreachable.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// The API root last set by the registry.
    pub fn api_root(&self) -> Option<&Url> {
        self.api_root.as_ref()
    }

    /// Number of `commit_sha` calls received.
    pub fn commit_calls(&self) -> usize {
        self.commit_calls.get()
    }

    /// Number of `contents` calls received.
    pub fn content_calls(&self) -> usize {
        self.content_calls.get()
    }

    /// Number of `validate_url` calls received.
    pub fn probe_calls(&self) -> usize {
        self.probe_calls.get()
    }

    /// Reset all call counters.
    pub fn reset_counters(&self) {
        self.commit_calls.set(0);
        self.content_calls.set(0);
        self.probe_calls.set(0);
    }

    fn insert(&mut self, revision: &str, path: &str, node: Node) {
        let tree = self.trees.entry(revision.to_string()).or_default();
        let path = normalize(path);

        let mut parent = String::new();
        let segments: Vec<&str> = path.split('/').collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            if !parent.is_empty() {
                parent.push('/');
            }
            parent.push_str(segment);
            tree.entry(parent.clone()).or_insert(Node::Dir);
        }
        tree.insert(path, node);
    }

    fn ensure_online(&self) -> Result<(), TransportError> {
        if self.offline {
            return Err(TransportError::Unavailable("memory transport is offline".into()));
        }
        Ok(())
    }

    fn list(tree: &BTreeMap<String, Node>, dir: &str) -> Vec<ContentEntry> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        tree.iter()
            .filter_map(|(path, node)| {
                let rest = path.strip_prefix(&prefix)?;
                if rest.is_empty() || rest.contains('/') {
                    return None;
                }
                let kind = match node {
                    Node::File(_) => EntryKind::File,
                    Node::Dir => EntryKind::Dir,
                    Node::Symlink => EntryKind::Symlink,
                    Node::Submodule => EntryKind::Submodule,
                };
                Some(ContentEntry {
                    path: path.clone(),
                    kind,
                })
            })
            .collect()
    }
}

impl Transport for MemoryTransport {
    fn set_api_root(&mut self, root: Option<Url>) {
        self.api_root = root;
    }

    fn validate_url(&self, _uri: &str) -> Result<(), TransportError> {
        self.probe_calls.set(self.probe_calls.get() + 1);
        self.ensure_online()
    }

    fn commit_sha(
        &self,
        ctx: &RequestContext,
        repo: &Repo,
        reference: &str,
    ) -> Result<String, TransportError> {
        self.commit_calls.set(self.commit_calls.get() + 1);
        ctx.check()?;
        self.ensure_online()?;

        let reference = if reference.is_empty() {
            DEFAULT_BRANCH
        } else {
            reference
        };

        if let Some(sha) = self.refs.get(reference) {
            return Ok(sha.clone());
        }
        // A full commit id resolves to itself.
        if self.trees.contains_key(reference) {
            return Ok(reference.to_string());
        }
        Err(TransportError::NotFound {
            what: format!("{}@{}", repo, reference),
        })
    }

    fn contents(
        &self,
        ctx: &RequestContext,
        repo: &Repo,
        path: &str,
        revision: &str,
    ) -> Result<Contents, TransportError> {
        self.content_calls.set(self.content_calls.get() + 1);
        ctx.check()?;
        self.ensure_online()?;

        let not_found = || TransportError::NotFound {
            what: format!("{}/{}@{}", repo, path, revision),
        };
        let tree = self.trees.get(revision).ok_or_else(not_found)?;
        let path = normalize(path);

        if path.is_empty() {
            return Ok(Contents::Directory(Self::list(tree, "")));
        }

        match tree.get(&path).ok_or_else(not_found)? {
            Node::File(content) => Ok(Contents::File(FileContent {
                path,
                content: content.clone(),
            })),
            Node::Dir => Ok(Contents::Directory(Self::list(tree, &path))),
            // The contents API answers a symlink or submodule with a single
            // object, which callers see as a file.
            Node::Symlink | Node::Submodule => Ok(Contents::File(FileContent {
                path,
                content: Vec::new(),
            })),
        }
    }
}
