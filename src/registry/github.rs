//! Registry backed by a GitHub repository.
//!
//! [`GitHubRegistry`] owns the transport and the registry's cache directory.
//! Fetching the inventory costs one commit lookup when the cache is current
//! and one extra content request when it is not. If the commit lookup fails
//! the cached inventory is served with its library versions set to the
//! configured reference, so callers can tell a degraded answer apart.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{
    is_valid_name, ContentResolver, LibraryManifest, LibraryReference, LibraryResolution, Protocol,
    RegistryConfig, RegistryDescriptor, RegistryInventory, RegistryOptions, DEFAULT_BRANCH,
    LIBRARY_MANIFEST_FILE, REGISTRY_MANIFEST_FILE,
};
use crate::cache::CacheStore;
use crate::error::{HubregError, Result};
use crate::transport::{ContentSpec, Contents, RequestContext, Transport};

/// A registry hosted on GitHub or GitHub Enterprise.
pub struct GitHubRegistry<T: Transport> {
    config: RegistryConfig,
    descriptor: RegistryDescriptor,
    transport: T,
    cache: CacheStore,
    options: RegistryOptions,
}

impl<T: Transport> GitHubRegistry<T> {
    /// Create a registry, parsing its URI and pointing the transport at the
    /// right API root.
    pub fn new(config: RegistryConfig, mut transport: T, options: RegistryOptions) -> Result<Self> {
        if !is_valid_name(&config.name) {
            return Err(HubregError::InvalidName {
                what: "registry name",
                name: config.name,
            });
        }
        let descriptor = RegistryDescriptor::parse(&config.uri)?;
        transport.set_api_root(descriptor.base_url().cloned());

        let cache = CacheStore::new(&options.cache_root).with_permissions(options.permissions);

        Ok(Self {
            config,
            descriptor,
            transport,
            cache,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn uri(&self) -> &str {
        &self.config.uri
    }

    pub fn protocol(&self) -> Protocol {
        self.config.protocol
    }

    pub fn is_override(&self) -> bool {
        self.config.is_override
    }

    pub fn descriptor(&self) -> &RegistryDescriptor {
        &self.descriptor
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Cache directory of this registry, relative to the cache root.
    pub fn registry_spec_dir(&self) -> PathBuf {
        PathBuf::from(self.name())
    }

    /// Cached inventory path, relative to the cache root.
    pub fn registry_spec_file_path(&self) -> PathBuf {
        self.registry_spec_dir().join(REGISTRY_MANIFEST_FILE)
    }

    /// Absolute path of the cached inventory.
    pub fn cache_file(&self) -> Result<PathBuf> {
        Ok(self.cache.inventory_path(self.name())?)
    }

    /// The configuration entry this registry was built from.
    pub fn make_registry_config(&self) -> RegistryConfig {
        self.config.clone()
    }

    /// Rebase a repository path onto the registry root.
    pub fn rebase_to_root(&self, path: &str) -> String {
        self.descriptor.rebase_to_root(path)
    }

    /// Location of a repository path inside this registry's cache directory.
    pub fn cache_path(&self, path: &str) -> PathBuf {
        self.descriptor.cache_path(self.name(), path)
    }

    /// Probe a URI for availability, then check that it parses.
    pub fn validate_uri(&self, uri: &str) -> Result<()> {
        self.transport.validate_url(uri)?;
        RegistryDescriptor::parse(uri)?;
        Ok(())
    }

    /// Point the registry at a new URI.
    ///
    /// The descriptor, URI and API root are replaced together, and only once
    /// the new URI has parsed and answered the availability probe.
    pub fn set_uri(&mut self, uri: &str) -> Result<()> {
        let descriptor = RegistryDescriptor::parse(uri)?;
        self.transport.validate_url(uri)?;

        self.transport.set_api_root(descriptor.base_url().cloned());
        self.descriptor = descriptor;
        self.config.uri = uri.to_string();
        Ok(())
    }

    /// The configured reference, with the default branch filled in.
    fn configured_ref(&self) -> &str {
        match self.descriptor.revision_ref() {
            "" => DEFAULT_BRANCH,
            reference => reference,
        }
    }

    fn resolve_ref(&self, ctx: &RequestContext, reference: &str) -> Result<String> {
        let ctx = ctx.with_timeout(self.options.resolve_timeout);
        let unresolved = |reason: String| HubregError::RevisionUnresolved {
            reference: if reference.is_empty() {
                DEFAULT_BRANCH.to_string()
            } else {
                reference.to_string()
            },
            reason,
        };

        match self
            .transport
            .commit_sha(&ctx, &self.descriptor.repo(), reference)
        {
            Ok(sha) if !sha.is_empty() => Ok(sha),
            Ok(_) => Err(unresolved("remote returned an empty commit id".to_string())),
            Err(e) => Err(unresolved(e.to_string())),
        }
    }

    /// Resolve the configured reference to the commit it currently points at.
    pub fn resolve_latest_sha(&self, ctx: &RequestContext) -> Result<String> {
        debug!("resolving SHA for URI: {}", self.uri());
        self.resolve_ref(ctx, self.descriptor.revision_ref())
    }

    fn resolve_revision(&self, ctx: &RequestContext, revision: Option<&str>) -> Result<String> {
        match revision.filter(|r| !r.is_empty()) {
            Some(reference) => self.resolve_ref(ctx, reference),
            None => self.resolve_latest_sha(ctx),
        }
    }

    fn fetch(&self, ctx: &RequestContext, path: &str, revision: &str) -> Result<Contents> {
        let ctx = ctx.with_timeout(self.options.request_timeout);
        Ok(self
            .transport
            .contents(&ctx, &self.descriptor.repo(), path, revision)?)
    }

    /// Fetch the inventory, using the cache when it is current.
    pub fn fetch_inventory(&self, ctx: &RequestContext) -> Result<RegistryInventory> {
        let span = tracing::debug_span!("fetch_inventory", registry = %self.name());
        let _enter = span.enter();

        debug!(
            "checking for registry cache of {} under {}",
            self.name(),
            self.cache_root().display()
        );
        let cached = match self.cache.load(self.name()) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(
                    "error loading cache for {} ({:#}), trying to refresh instead",
                    self.name(),
                    e
                );
                None
            }
        };

        let sha = match self.resolve_latest_sha(ctx) {
            Ok(sha) => sha,
            Err(e) => {
                return match cached {
                    Some(mut inventory) if !inventory.resolved_revision().is_empty() => {
                        warn!("{}", e);
                        warn!(
                            "falling back to cached version ({})",
                            inventory.resolved_revision()
                        );
                        inventory.stamp_library_versions(self.configured_ref());
                        Ok(inventory)
                    }
                    _ => Err(e),
                };
            }
        };

        match cached {
            Some(mut inventory) if inventory.resolved_revision() == sha => {
                debug!("using cache @{}", sha);
                inventory.stamp_library_versions(&sha);
                return Ok(inventory);
            }
            Some(_) => debug!("cache is stale, updating to {}", sha),
            None => debug!("cache not found, fetching remote for {}", self.name()),
        }

        let mut inventory = self.fetch_remote_inventory(ctx, &sha)?;
        inventory.stamp_library_versions(&sha);

        let yaml = inventory.to_yaml()?;
        self.cache.store(self.name(), yaml.as_bytes())?;

        Ok(inventory)
    }

    /// Fetch `registry.yaml` at `revision`, bypassing the cache.
    ///
    /// The returned inventory's `version` is set to `revision`.
    pub fn fetch_remote_inventory(
        &self,
        ctx: &RequestContext,
        revision: &str,
    ) -> Result<RegistryInventory> {
        let spec = ContentSpec {
            repo: self.descriptor.repo(),
            path: self.descriptor.registry_spec_relative_path().to_string(),
            revision: revision.to_string(),
        };
        debug!("fetching {}", spec);

        let file = match self.fetch(ctx, &spec.path, &spec.revision)? {
            Contents::File(file) => file,
            Contents::Directory(_) => {
                return Err(HubregError::MissingManifest {
                    coordinates: spec.to_string(),
                })
            }
        };

        let mut inventory = RegistryInventory::from_slice(&file.content, &spec.to_string())?;
        inventory.version = spec.revision;
        Ok(inventory)
    }

    fn fetch_library_manifest(
        &self,
        ctx: &RequestContext,
        library_path: &str,
        sha: &str,
    ) -> Result<LibraryManifest> {
        let path = format!("{}/{}", library_path, LIBRARY_MANIFEST_FILE);

        let file = match self.fetch(ctx, &path, sha)? {
            Contents::File(file) => file,
            Contents::Directory(_) => return Err(HubregError::ResolvesToDirectory { path }),
        };

        let mut manifest = LibraryManifest::from_slice(&file.content, &path)?;
        // The commit is the version, whatever the manifest claims.
        manifest.version = sha.to_string();
        Ok(manifest)
    }

    /// Fetch a library's manifest at `revision` (the configured reference
    /// when absent or empty).
    pub fn resolve_library_spec(
        &self,
        ctx: &RequestContext,
        name: &str,
        revision: Option<&str>,
    ) -> Result<LibraryManifest> {
        let span = tracing::debug_span!("resolve_library_spec", registry = %self.name(), library = name);
        let _enter = span.enter();

        let sha = self.resolve_revision(ctx, revision)?;
        self.fetch_library_manifest(ctx, &self.descriptor.library_path(name), &sha)
    }

    /// Resolve a library at `revision` (the configured reference when absent
    /// or empty), streaming its files and directories to the handlers.
    ///
    /// Handler paths are relative to the registry root. `alias` names the
    /// local copy and defaults to `name`.
    pub fn resolve_library<F, D>(
        &self,
        ctx: &RequestContext,
        name: &str,
        alias: Option<&str>,
        revision: Option<&str>,
        on_file: &mut F,
        on_directory: &mut D,
    ) -> Result<LibraryResolution>
    where
        F: FnMut(&str, &[u8]) -> Result<()>,
        D: FnMut(&str) -> Result<()>,
    {
        let span = tracing::debug_span!("resolve_library", registry = %self.name(), library = name);
        let _enter = span.enter();

        let sha = self.resolve_revision(ctx, revision)?;
        debug!("resolving {} @{}", name, sha);

        let path = self.descriptor.library_path(name);
        ContentResolver::new(&self.transport, &self.descriptor, self.name())
            .with_symlink_policy(self.options.symlinks)
            .with_request_timeout(self.options.request_timeout)
            .resolve_directory(ctx, name, &path, &sha, on_file, on_directory)?;

        let manifest = self.fetch_library_manifest(ctx, &path, &sha)?;

        let alias = alias.filter(|a| !a.is_empty()).unwrap_or(name);
        Ok(LibraryResolution {
            manifest,
            reference: LibraryReference {
                name: alias.to_string(),
                registry: self.name().to_string(),
                version: sha,
            },
        })
    }

    /// Root of the cache this registry writes to.
    pub fn cache_root(&self) -> &Path {
        self.cache.root()
    }
}
