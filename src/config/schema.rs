//! Configuration schema definitions for hubreg.
//!
//! This module contains the struct definitions that map to the YAML
//! configuration file format.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{default_cache_dir, CachePermissions};
use crate::registry::{RegistryConfig, RegistryOptions, SymlinkPolicy};

/// Root configuration structure for hubreg.yml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubregConfig {
    /// Cache root override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Global settings
    pub settings: Settings,

    /// Configured registries
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub registries: Vec<RegistryConfig>,
}

/// Settings shared by every registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds allowed for resolving a reference to a commit
    pub resolve_timeout: u64,

    /// Seconds allowed for each content request
    pub request_timeout: u64,

    /// What to do with symlinks inside libraries
    pub symlinks: SymlinkPolicy,

    /// Mode for cache directories
    pub folder_permissions: u32,

    /// Mode for cache files
    pub file_permissions: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let permissions = CachePermissions::default();
        Self {
            resolve_timeout: 10,
            request_timeout: 30,
            symlinks: SymlinkPolicy::default(),
            folder_permissions: permissions.folder,
            file_permissions: permissions.file,
        }
    }
}

impl HubregConfig {
    /// Look up a registry by name.
    pub fn registry(&self, name: &str) -> Option<&RegistryConfig> {
        self.registries.iter().find(|r| r.name == name)
    }

    /// Effective cache root.
    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Options for building registries from this configuration.
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            cache_root: self.cache_root(),
            resolve_timeout: Duration::from_secs(self.settings.resolve_timeout),
            request_timeout: Duration::from_secs(self.settings.request_timeout),
            symlinks: self.settings.symlinks,
            permissions: CachePermissions {
                folder: self.settings.folder_permissions,
                file: self.settings.file_permissions,
            },
        }
    }
}
