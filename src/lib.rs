//! hubreg - Resolve libraries from GitHub-hosted registries.
//!
//! A registry is a directory in a GitHub or GitHub Enterprise repository
//! holding a `registry.yaml` inventory and one directory per library.
//! hubreg turns a registry URI into coordinates, fetches the inventory
//! through an on-disk cache keyed by commit, and resolves libraries at an
//! immutable commit.
//!
//! # Modules
//!
//! - [`cache`] - On-disk inventory cache
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`registry`] - URI parsing, inventory fetching and library resolution
//! - [`transport`] - GitHub API access behind the [`transport::Transport`] trait
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use hubreg::registry::RegistryDescriptor;
//!
//! let hd = RegistryDescriptor::parse("github.com/ksonnet/parts/tree/master/incubator").unwrap();
//! assert_eq!(hd.organization(), "ksonnet");
//! assert_eq!(hd.registry_spec_relative_path(), "incubator/registry.yaml");
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod registry;
pub mod transport;
pub mod ui;

pub use error::{HubregError, Result};
