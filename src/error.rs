//! Error types for hubreg operations.
//!
//! This module defines [`HubregError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Malformed input (URIs, config) is reported immediately and never retried
//! - Transport failures are recovered from the cache when fetching an
//!   inventory, and surfaced directly when resolving a library
//! - Structural mismatches (file where a directory was expected, submodules)
//!   are always fatal and name the offending path
//! - Use `anyhow::Error` (via `HubregError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

use crate::registry::UriError;
use crate::transport::{EntryKind, TransportError};

/// Core error type for hubreg operations.
#[derive(Debug, Error)]
pub enum HubregError {
    /// Configuration file not found at an explicitly requested location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// No registry with this name is configured.
    #[error("Unknown registry: {name}")]
    UnknownRegistry { name: String },

    /// A registry name or alias that cannot name a directory.
    #[error("Invalid {what} '{name}': must be a single path component")]
    InvalidName { what: &'static str, name: String },

    /// The registry URI is malformed.
    #[error(transparent)]
    InvalidUri(#[from] UriError),

    /// A network or API call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The configured reference could not be resolved to a commit.
    #[error("Unable to resolve commit for refspec '{reference}': {reason}")]
    RevisionUnresolved { reference: String, reason: String },

    /// A manifest (registry.yaml or parts.yaml) could not be decoded or encoded.
    #[error("Invalid manifest {path}: {message}")]
    ManifestParse { path: String, message: String },

    /// The registry manifest was not found where the descriptor points.
    #[error("Could not find valid registry with coordinates: {coordinates}")]
    MissingManifest { coordinates: String },

    /// A library name resolved to a file instead of a directory.
    #[error("Library '{library}' resolves to a file in registry '{registry}'")]
    ResolvesToFile { library: String, registry: String },

    /// A manifest path resolved to a directory instead of a file.
    #[error("Can't download library specification; resource '{path}' points at a directory")]
    ResolvesToDirectory { path: String },

    /// The API listed an entry as a file but returned a directory for it.
    #[error("Remote reported '{path}' as a file but returned a directory")]
    UnexpectedDirectory { path: String },

    /// A library contains an entry that cannot be resolved through the content API.
    #[error("Invalid library '{library}': unsupported {kind} entry at '{path}'")]
    UnsupportedEntry {
        library: String,
        path: String,
        kind: EntryKind,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HubregError {
    /// Whether this error came from the network rather than from input or content.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RevisionUnresolved { .. })
    }
}

/// Result type alias for hubreg operations.
pub type Result<T> = std::result::Result<T, HubregError>;
