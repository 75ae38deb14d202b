//! Recursive content resolution.
//!
//! Walks a library's directory in the repository, depth first, handing
//! every file and directory to caller-supplied handlers. Handlers see paths
//! relative to the registry root, never the repository root, so a registry
//! at `nested/incubator` hands `redis/parts.yaml` rather than
//! `nested/incubator/redis/parts.yaml`.
//!
//! Any error aborts the walk. Nothing already handed to the handlers is
//! rolled back; callers that need atomicity should resolve into a staging
//! location.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::RegistryDescriptor;
use crate::error::{HubregError, Result};
use crate::transport::{Contents, EntryKind, RequestContext, Transport};

/// Default bound for each content request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do with symlinks found inside a library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymlinkPolicy {
    /// Leave them out of the resolved tree.
    #[default]
    Skip,
    /// Fail like a submodule.
    Reject,
}

/// Walks repository directories through a [`Transport`].
pub struct ContentResolver<'a, T: Transport + ?Sized> {
    transport: &'a T,
    descriptor: &'a RegistryDescriptor,
    registry: &'a str,
    symlinks: SymlinkPolicy,
    request_timeout: Duration,
}

impl<'a, T: Transport + ?Sized> ContentResolver<'a, T> {
    /// Create a resolver for the registry described by `descriptor`.
    pub fn new(transport: &'a T, descriptor: &'a RegistryDescriptor, registry: &'a str) -> Self {
        Self {
            transport,
            descriptor,
            registry,
            symlinks: SymlinkPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_symlink_policy(mut self, policy: SymlinkPolicy) -> Self {
        self.symlinks = policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn fetch(&self, ctx: &RequestContext, path: &str, revision: &str) -> Result<Contents> {
        let ctx = ctx.with_timeout(self.request_timeout);
        Ok(self
            .transport
            .contents(&ctx, &self.descriptor.repo(), path, revision)?)
    }

    /// Resolve the directory at repository path `path` and `revision`.
    ///
    /// `on_directory` runs before a directory's children are visited.
    pub fn resolve_directory<F, D>(
        &self,
        ctx: &RequestContext,
        library: &str,
        path: &str,
        revision: &str,
        on_file: &mut F,
        on_directory: &mut D,
    ) -> Result<()>
    where
        F: FnMut(&str, &[u8]) -> Result<()>,
        D: FnMut(&str) -> Result<()>,
    {
        let entries = match self.fetch(ctx, path, revision)? {
            Contents::Directory(entries) => entries,
            Contents::File(_) => {
                return Err(HubregError::ResolvesToFile {
                    library: library.to_string(),
                    registry: self.registry.to_string(),
                })
            }
        };

        for entry in entries {
            match entry.kind {
                EntryKind::File => {
                    // Listings carry no content.
                    let file = match self.fetch(ctx, &entry.path, revision)? {
                        Contents::File(file) => file,
                        Contents::Directory(_) => {
                            return Err(HubregError::UnexpectedDirectory { path: entry.path })
                        }
                    };
                    on_file(&self.descriptor.rebase_to_root(&entry.path), &file.content)?;
                }
                EntryKind::Dir => {
                    on_directory(&self.descriptor.rebase_to_root(&entry.path))?;
                    self.resolve_directory(
                        ctx,
                        library,
                        &entry.path,
                        revision,
                        on_file,
                        on_directory,
                    )?;
                }
                EntryKind::Symlink if self.symlinks == SymlinkPolicy::Skip => {
                    tracing::warn!("skipping symlink {} in library {}", entry.path, library);
                }
                kind => {
                    return Err(HubregError::UnsupportedEntry {
                        library: library.to_string(),
                        path: entry.path,
                        kind,
                    })
                }
            }
        }

        Ok(())
    }
}
