//! Cache storage implementation.
//!
//! Each registry gets a directory under the cache root holding its last
//! fetched `registry.yaml`:
//!
//! ```text
//! <root>/<registry-name>/registry.yaml
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::HubregError;
use crate::registry::{is_valid_name, RegistryInventory, REGISTRY_MANIFEST_FILE};

/// Modes applied to cache directories and files on unix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePermissions {
    /// Mode for created directories.
    pub folder: u32,
    /// Mode for written files.
    pub file: u32,
}

impl Default for CachePermissions {
    fn default() -> Self {
        Self {
            folder: 0o755,
            file: 0o644,
        }
    }
}

/// Summary of one cached registry.
#[derive(Debug, Clone, Serialize)]
pub struct CachedRegistry {
    /// Registry name (directory name).
    pub name: String,
    /// Path to the cached inventory.
    pub path: PathBuf,
    /// Commit the inventory was fetched at, if it could be read.
    pub revision: Option<String>,
    /// Number of libraries, if the inventory could be read.
    pub libraries: Option<usize>,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// Storage for cached registry inventories.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Root directory for cache.
    root: PathBuf,
    permissions: CachePermissions,
}

fn create_dir(path: &Path, mode: u32) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path)
}

fn write_file(path: &Path, contents: &[u8], mode: u32) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl CacheStore {
    /// Create a new cache store.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            permissions: CachePermissions::default(),
        }
    }

    /// Use custom directory and file modes.
    pub fn with_permissions(mut self, permissions: CachePermissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Get the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn permissions(&self) -> CachePermissions {
        self.permissions
    }

    /// Directory holding a registry's cached files.
    ///
    /// Fails unless `name` is a single path component, so no name can
    /// address anything outside the root.
    pub fn registry_dir(&self, name: &str) -> Result<PathBuf> {
        if !is_valid_name(name) {
            return Err(HubregError::InvalidName {
                what: "registry name",
                name: name.to_string(),
            }
            .into());
        }
        Ok(self.root.join(name))
    }

    /// Path of a registry's cached inventory.
    pub fn inventory_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.registry_dir(name)?.join(REGISTRY_MANIFEST_FILE))
    }

    /// Load a registry's cached inventory.
    ///
    /// Returns `Ok(None)` when nothing is cached; unreadable or undecodable
    /// files are errors.
    pub fn load(&self, name: &str) -> Result<Option<RegistryInventory>> {
        let path = self.inventory_path(name)?;

        if !path.exists() {
            return Ok(None);
        }

        let bytes =
            fs::read(&path).with_context(|| format!("Failed to read cache file {:?}", path))?;
        let inventory = RegistryInventory::from_slice(&bytes, &path.to_string_lossy())?;

        Ok(Some(inventory))
    }

    /// Write a registry's inventory bytes, replacing any previous file.
    ///
    /// The registry directory is created here, so callers that only store
    /// after a successful fetch never leave an empty directory behind. The
    /// bytes go to a temporary file that is renamed over the target.
    pub fn store(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        let dir = self.registry_dir(name)?;
        create_dir(&dir, self.permissions.folder)
            .with_context(|| format!("Failed to create cache directory {:?}", dir))?;

        let path = dir.join(REGISTRY_MANIFEST_FILE);
        let staging = dir.join(format!(
            ".{}.{}.tmp",
            REGISTRY_MANIFEST_FILE,
            std::process::id()
        ));

        if let Err(e) = write_file(&staging, contents, self.permissions.file) {
            let _ = fs::remove_file(&staging);
            return Err(e).with_context(|| format!("Failed to write cache file {:?}", staging));
        }
        if let Err(e) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(e).with_context(|| format!("Failed to replace cache file {:?}", path));
        }

        Ok(path)
    }

    /// Remove a registry's cache directory.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let dir = self.registry_dir(name)?;
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to remove cache directory {:?}", dir))?;
        Ok(true)
    }

    /// List all cached registries, sorted by name.
    pub fn list(&self) -> Result<Vec<CachedRegistry>> {
        let mut entries = Vec::new();

        if !self.root.exists() {
            return Ok(entries);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Ok(path) = self.inventory_path(&name) else {
                continue;
            };
            let Ok(metadata) = fs::metadata(&path) else {
                continue;
            };

            let inventory = self.load(&name).ok().flatten();
            entries.push(CachedRegistry {
                name,
                path,
                revision: inventory.as_ref().map(|i| i.resolved_revision().to_string()),
                libraries: inventory.as_ref().map(|i| i.libraries.len()),
                size_bytes: metadata.len(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Clear all cached registries.
    pub fn clear(&self) -> Result<usize> {
        let entries = self.list()?;
        let count = entries.len();

        for entry in entries {
            let _ = self.remove(&entry.name);
        }

        Ok(count)
    }

    /// Get total cache size in bytes.
    pub fn total_size(&self) -> Result<u64> {
        let entries = self.list()?;
        Ok(entries.iter().map(|e| e.size_bytes).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INVENTORY: &str = "version: abc123\nlibraries:\n  redis:\n    path: redis\n    version: abc123\n";

    #[test]
    fn cache_store_creation() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        assert_eq!(store.root(), temp.path());
        assert_eq!(store.permissions(), CachePermissions::default());
    }

    #[test]
    fn inventory_path_layout() {
        let store = CacheStore::new("/cache");
        assert_eq!(
            store.inventory_path("incubator").unwrap(),
            PathBuf::from("/cache/incubator/registry.yaml")
        );
    }

    #[test]
    fn store_and_load() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        let path = store.store("incubator", INVENTORY.as_bytes()).unwrap();
        assert_eq!(path, store.inventory_path("incubator").unwrap());

        let loaded = store.load("incubator").unwrap().unwrap();
        assert_eq!(loaded.resolved_revision(), "abc123");
        assert_eq!(loaded.library_names(), vec!["redis"]);
    }

    #[test]
    fn store_replaces_previous_file_without_leftovers() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.store("incubator", b"version: one\n").unwrap();
        store.store("incubator", b"version: two\n").unwrap();

        let loaded = store.load("incubator").unwrap().unwrap();
        assert_eq!(loaded.resolved_revision(), "two");

        let files: Vec<_> = fs::read_dir(store.registry_dir("incubator").unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn load_nonexistent_returns_none() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        assert!(store.load("missing").unwrap().is_none());
        assert!(!store.registry_dir("missing").unwrap().exists());
    }

    #[test]
    fn load_corrupt_file_is_error() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());
        let dir = store.registry_dir("broken").unwrap();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(REGISTRY_MANIFEST_FILE), "libraries: [[[").unwrap();

        assert!(store.load("broken").is_err());
    }

    #[test]
    fn names_outside_the_root_are_rejected() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("cache");
        let store = CacheStore::new(&root);

        let sibling = temp.path().join("precious");
        fs::create_dir_all(&sibling).unwrap();
        let outside = TempDir::new().unwrap();
        let absolute = outside.path().to_string_lossy().into_owned();

        for name in ["..", "../precious", ".", "", "a/b", absolute.as_str()] {
            assert!(store.registry_dir(name).is_err(), "{}", name);
            assert!(store.remove(name).is_err(), "{}", name);
            assert!(store.store(name, INVENTORY.as_bytes()).is_err(), "{}", name);
            assert!(store.load(name).is_err(), "{}", name);
        }

        assert!(sibling.exists());
        assert!(outside.path().exists());
        assert!(!outside.path().join(REGISTRY_MANIFEST_FILE).exists());
        assert!(!root.exists());
    }

    #[test]
    fn failed_replace_removes_staging_file() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        // A non-empty directory where the inventory belongs cannot be
        // replaced by a file.
        let blocker = store.inventory_path("incubator").unwrap();
        fs::create_dir_all(blocker.join("occupied")).unwrap();

        assert!(store.store("incubator", INVENTORY.as_bytes()).is_err());

        let files: Vec<_> = fs::read_dir(store.registry_dir("incubator").unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec![REGISTRY_MANIFEST_FILE.to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn applies_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path()).with_permissions(CachePermissions {
            folder: 0o700,
            file: 0o600,
        });
        let path = store.store("private", INVENTORY.as_bytes()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn remove_entry() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());
        store.store("incubator", INVENTORY.as_bytes()).unwrap();

        assert!(store.remove("incubator").unwrap());
        assert!(store.load("incubator").unwrap().is_none());
        assert!(!store.remove("incubator").unwrap());
    }

    #[test]
    fn list_entries() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.store("b-registry", INVENTORY.as_bytes()).unwrap();
        store.store("a-registry", b"libraries: [[[").unwrap();
        fs::create_dir_all(temp.path().join("empty-dir")).unwrap();

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a-registry");
        assert!(entries[0].revision.is_none());
        assert_eq!(entries[1].revision.as_deref(), Some("abc123"));
        assert_eq!(entries[1].libraries, Some(1));
    }

    #[test]
    fn list_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn clear_cache() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.store("one", INVENTORY.as_bytes()).unwrap();
        store.store("two", INVENTORY.as_bytes()).unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn total_size_calculation() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.store("one", b"version: a\n").unwrap(); // 11 bytes
        store.store("two", b"version: bb\n").unwrap(); // 12 bytes

        assert_eq!(store.total_size().unwrap(), 23);
    }
}
