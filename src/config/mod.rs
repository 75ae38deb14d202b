//! Configuration loading, parsing, and validation for hubreg.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use hubreg::config::{load_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(
//!     temp.path().join("hubreg.yml"),
//!     "registries:\n  - name: incubator\n    uri: github.com/ksonnet/parts/tree/master/incubator\n",
//! )
//! .unwrap();
//!
//! let config = load_config(None, temp.path()).unwrap();
//! validate(&config).unwrap();
//! assert!(config.registry("incubator").is_some());
//! ```
//!
//! # Configuration File Locations
//!
//! The first existing file wins:
//! 1. Path given with `--config`
//! 2. Project config (`./hubreg.yml`)
//! 3. User global config (`<config dir>/hubreg/config.yml`)
//!
//! With none of them present the built-in defaults apply.

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{load_config, load_config_file, parse_config, ConfigPaths, PROJECT_CONFIG_FILE};
pub use schema::{HubregConfig, Settings};
pub use validator::{validate, validate_config, ValidationError};
