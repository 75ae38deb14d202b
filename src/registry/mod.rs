//! GitHub-hosted library registries.
//!
//! A registry is a directory in a GitHub (or GitHub Enterprise) repository
//! holding a `registry.yaml` inventory and one directory per library. This
//! module handles:
//! - Parsing registry URIs into a [`RegistryDescriptor`]
//! - Fetching the inventory with an on-disk cache keyed by commit
//! - Resolving a library's files and manifest at an immutable commit
//!
//! # Example
//!
//! ```
//! use hubreg::registry::{GitHubRegistry, RegistryConfig, RegistryOptions};
//! use hubreg::transport::{MemoryTransport, RequestContext};
//!
//! let transport = MemoryTransport::new()
//!     .with_ref("master", "abc123")
//!     .with_file("abc123", "incubator/registry.yaml", "libraries:\n  redis:\n    path: redis\n");
//! let options = RegistryOptions {
//!     cache_root: std::env::temp_dir().join("hubreg-doc-example"),
//!     ..Default::default()
//! };
//! let config = RegistryConfig::github("incubator", "github.com/ksonnet/parts/tree/master/incubator");
//!
//! let registry = GitHubRegistry::new(config, transport, options).unwrap();
//! let inventory = registry.fetch_inventory(&RequestContext::background()).unwrap();
//! assert_eq!(inventory.library("redis").unwrap().version, "abc123");
//! ```

pub mod content;
pub mod descriptor;
pub mod github;
pub mod inventory;
pub mod library;
pub mod options;

pub use content::{ContentResolver, SymlinkPolicy};
pub use descriptor::{RegistryDescriptor, UriError};
pub use github::GitHubRegistry;
pub use inventory::{LibraryRef, RegistryInventory};
pub use library::{LibraryDependency, LibraryManifest, LibraryReference, LibraryResolution};
pub use options::{is_valid_name, Protocol, RegistryConfig, RegistryOptions};

/// Branch used when a URI names no reference.
pub const DEFAULT_BRANCH: &str = "master";

/// File name of a registry inventory.
pub const REGISTRY_MANIFEST_FILE: &str = "registry.yaml";

/// File name of a library manifest.
pub const LIBRARY_MANIFEST_FILE: &str = "parts.yaml";
