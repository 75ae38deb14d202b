//! Registry inventory (`registry.yaml`).
//!
//! The inventory lists every library a registry offers. Its top-level
//! `version` records the commit it was fetched at and doubles as the cache
//! staleness key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{HubregError, Result};

fn default_api_version() -> String {
    "0.1.0".to_string()
}

fn default_kind() -> String {
    "ksonnet.io/registry".to_string()
}

/// Inventory of libraries in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryInventory {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    /// Commit the inventory was fetched at.
    #[serde(default)]
    pub version: String,

    /// Libraries keyed by name, in manifest order.
    #[serde(default)]
    pub libraries: IndexMap<String, LibraryRef>,
}

/// A library entry in the inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRef {
    /// Registry-relative directory of the library.
    #[serde(default)]
    pub path: String,

    /// Version presented to callers.
    #[serde(default)]
    pub version: String,
}

impl Default for RegistryInventory {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            version: String::new(),
            libraries: IndexMap::new(),
        }
    }
}

impl RegistryInventory {
    /// Decode an inventory. `origin` names the source in errors.
    pub fn from_slice(bytes: &[u8], origin: &str) -> Result<Self> {
        serde_yaml::from_slice(bytes).map_err(|e| HubregError::ManifestParse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Encode the inventory as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| HubregError::ManifestParse {
            path: "registry.yaml".to_string(),
            message: e.to_string(),
        })
    }

    /// Commit the inventory was fetched at. Empty if never stamped.
    pub fn resolved_revision(&self) -> &str {
        &self.version
    }

    /// Overwrite every library's version.
    pub fn stamp_library_versions(&mut self, version: &str) {
        for library in self.libraries.values_mut() {
            library.version = version.to_string();
        }
    }

    pub fn library(&self, name: &str) -> Option<&LibraryRef> {
        self.libraries.get(name)
    }

    /// Library names in manifest order.
    pub fn library_names(&self) -> Vec<&str> {
        self.libraries.keys().map(String::as_str).collect()
    }
}
