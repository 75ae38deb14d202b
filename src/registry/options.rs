//! Registry configuration and construction options.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::SymlinkPolicy;
use crate::cache::{default_cache_dir, CachePermissions};

/// Hosting protocol of a registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    GitHub,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::GitHub => write!(f, "github"),
        }
    }
}

/// A configured registry: name, protocol and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub name: String,

    #[serde(default)]
    pub protocol: Protocol,

    pub uri: String,

    /// Whether this entry overrides a registry of the same name.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_override: bool,
}

impl RegistryConfig {
    /// A GitHub registry entry.
    pub fn github(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocol: Protocol::GitHub,
            uri: uri.into(),
            is_override: false,
        }
    }
}

/// Whether `name` can be used as a directory name under a root: exactly one
/// normal path component, with no separators.
pub fn is_valid_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Options for [`GitHubRegistry`](super::GitHubRegistry).
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Directory holding one cache directory per registry.
    pub cache_root: PathBuf,
    /// Bound on resolving a reference to a commit.
    pub resolve_timeout: Duration,
    /// Bound on each content request.
    pub request_timeout: Duration,
    /// Handling of symlinks inside libraries.
    pub symlinks: SymlinkPolicy,
    /// Modes for cache directories and files.
    pub permissions: CachePermissions,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            cache_root: default_cache_dir(),
            resolve_timeout: Duration::from_secs(10),
            request_timeout: super::content::DEFAULT_REQUEST_TIMEOUT,
            symlinks: SymlinkPolicy::default(),
            permissions: CachePermissions::default(),
        }
    }
}
