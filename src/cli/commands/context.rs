//! Shared state for commands that touch registries.

use std::path::{Path, PathBuf};

use url::Url;

use crate::cli::args::Cli;
use crate::config::{load_config, HubregConfig};
use crate::error::{HubregError, Result};
use crate::registry::{GitHubRegistry, RegistryConfig};
use crate::transport::GitHubClient;

/// Global flags plus the working directory.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    working_dir: PathBuf,
    config_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    api_root: Option<Url>,
    token: Option<String>,
}

impl CommandContext {
    /// Context with no global flags set.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Default::default()
        }
    }

    /// Context from parsed command-line flags.
    pub fn from_cli(cli: &Cli, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            config_path: cli.config.clone(),
            cache_dir: cli.cache_dir.clone(),
            api_root: cli.api_root.clone(),
            token: cli.token.clone(),
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(path.into());
        self
    }

    pub fn with_api_root(mut self, root: Url) -> Self {
        self.api_root = Some(root);
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Load the configuration, applying `--cache-dir`.
    pub fn load_config(&self) -> Result<HubregConfig> {
        let mut config = load_config(self.config_path.as_deref(), &self.working_dir)?;
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
        Ok(config)
    }

    /// HTTP transport honoring the configured timeout and global flags.
    pub fn transport(&self, config: &HubregConfig) -> Result<GitHubClient> {
        let mut client = GitHubClient::with_timeout(config.registry_options().request_timeout)?
            .with_token(self.token.clone());
        if let Some(root) = &self.api_root {
            client = client.with_default_root(root.clone());
        }
        Ok(client)
    }

    /// Build the registry called `name`.
    ///
    /// `uri` replaces the configured location, or defines the registry when
    /// the configuration has no entry for it.
    pub fn registry(
        &self,
        config: &HubregConfig,
        name: &str,
        uri: Option<&str>,
    ) -> Result<GitHubRegistry<GitHubClient>> {
        let entry = match (config.registry(name), uri) {
            (Some(entry), Some(uri)) => RegistryConfig {
                uri: uri.to_string(),
                ..entry.clone()
            },
            (Some(entry), None) => entry.clone(),
            (None, Some(uri)) => RegistryConfig::github(name, uri),
            (None, None) => {
                return Err(HubregError::UnknownRegistry {
                    name: name.to_string(),
                })
            }
        };

        GitHubRegistry::new(entry, self.transport(config)?, config.registry_options())
    }
}
