//! Registry inventory caching.
//!
//! Each registry's last fetched `registry.yaml` is kept on disk so that
//! inventories stay available when the network is not.

pub mod store;

pub use store::{CachePermissions, CacheStore, CachedRegistry};

/// Get the default cache directory.
pub fn default_cache_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("hubreg")
        .join("registries")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cache_dir_valid() {
        let path = default_cache_dir();
        assert!(path.ends_with("hubreg/registries"));
    }
}
