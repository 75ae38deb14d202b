//! Library manifests and resolution results.

use serde::{Deserialize, Serialize};

use crate::error::{HubregError, Result};

/// A library's own manifest (`parts.yaml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryManifest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<LibraryDependency>,
}

/// A dependency declared by a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDependency {
    pub name: String,

    /// Version constraint, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub constraint: String,
}

impl LibraryManifest {
    /// Decode a library manifest. `origin` names the source in errors.
    pub fn from_slice(bytes: &[u8], origin: &str) -> Result<Self> {
        serde_yaml::from_slice(bytes).map_err(|e| HubregError::ManifestParse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }
}

/// Binds a locally installed library to the registry commit it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryReference {
    /// Local alias.
    pub name: String,
    /// Owning registry.
    pub registry: String,
    /// Full commit id, never a branch or tag.
    pub version: String,
}

/// Result of resolving a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryResolution {
    pub manifest: LibraryManifest,
    pub reference: LibraryReference,
}
