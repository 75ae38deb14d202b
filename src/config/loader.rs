//! Configuration file discovery and loading.
//!
//! This module handles finding and loading the configuration file from
//! the locations hubreg looks in, in priority order.

use crate::config::schema::HubregConfig;
use crate::config::validator::validate;
use crate::error::{HubregError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "hubreg.yml";

/// Candidate configuration files (earlier wins).
///
/// Priority:
/// 1. Explicit path (`--config`)
/// 2. Project config (`./hubreg.yml`)
/// 3. User global config (`<config dir>/hubreg/config.yml`)
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path given on the command line; must exist.
    pub explicit: Option<PathBuf>,

    /// Project config: hubreg.yml in the working directory
    pub project: Option<PathBuf>,

    /// User's global config
    pub user_global: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files relative to `working_dir`.
    pub fn discover(explicit: Option<&Path>, working_dir: &Path) -> Self {
        Self {
            explicit: explicit.map(Path::to_path_buf),
            project: Self::find_project_config(working_dir),
            user_global: Self::find_user_global(),
        }
    }

    /// Find user's global config at <config dir>/hubreg/config.yml
    fn find_user_global() -> Option<PathBuf> {
        let path = dirs::config_dir()?.join("hubreg").join("config.yml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Find project config at ./hubreg.yml
    fn find_project_config(working_dir: &Path) -> Option<PathBuf> {
        let path = working_dir.join(PROJECT_CONFIG_FILE);
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// The file that will be loaded, if any.
    pub fn selected(&self) -> Option<&Path> {
        self.explicit
            .as_deref()
            .or(self.project.as_deref())
            .or(self.user_global.as_deref())
    }
}

/// Load a single config file and parse it into HubregConfig.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<HubregConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HubregError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            HubregError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into HubregConfig.
///
/// An empty document yields the defaults.
pub fn parse_config(content: &str, source_path: &Path) -> Result<HubregConfig> {
    if content.trim().is_empty() {
        return Ok(HubregConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| HubregError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Discover, load and validate the configuration.
///
/// # Errors
///
/// Returns `ConfigNotFound` if an explicit path doesn't exist.
/// Returns `ConfigParseError` or `ConfigValidationError` for bad files.
pub fn load_config(explicit: Option<&Path>, working_dir: &Path) -> Result<HubregConfig> {
    let paths = ConfigPaths::discover(explicit, working_dir);

    let config = match paths.selected() {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            load_config_file(path)?
        }
        None => {
            tracing::debug!("no config file found, using defaults");
            HubregConfig::default()
        }
    };

    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn discovers_project_config() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROJECT_CONFIG_FILE), "{}").unwrap();

        let paths = ConfigPaths::discover(None, temp.path());
        assert_eq!(paths.project, Some(temp.path().join(PROJECT_CONFIG_FILE)));
        assert_eq!(
            paths.selected(),
            Some(temp.path().join(PROJECT_CONFIG_FILE).as_path())
        );
    }

    #[test]
    fn explicit_path_wins() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROJECT_CONFIG_FILE), "{}").unwrap();
        let explicit = temp.path().join("other.yml");

        let paths = ConfigPaths::discover(Some(&explicit), temp.path());
        assert_eq!(paths.selected(), Some(explicit.as_path()));
    }

    #[test]
    fn missing_explicit_path_is_not_found() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.yml");

        let result = load_config(Some(&missing), temp.path());
        assert!(matches!(result, Err(HubregError::ConfigNotFound { .. })));
    }

    #[test]
    fn load_project_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "registries:\n  - name: incubator\n    uri: github.com/ksonnet/parts/tree/master/incubator\n",
        )
        .unwrap();

        let config = load_config(None, temp.path()).unwrap();
        assert_eq!(config.registries.len(), 1);
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        fs::write(&path, "registries: [unclosed").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, HubregError::ConfigParseError { .. }));
        assert!(err.to_string().contains("bad.yml"));
    }

    #[test]
    fn invalid_config_fails_validation() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dup.yml");
        fs::write(
            &path,
            "registries:\n  - name: a\n    uri: github.com/x/y\n  - name: a\n    uri: github.com/x/z\n",
        )
        .unwrap();

        let result = load_config(Some(&path), temp.path());
        assert!(matches!(
            result,
            Err(HubregError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn empty_file_is_default() {
        let config = parse_config("", Path::new("hubreg.yml")).unwrap();
        assert_eq!(config, HubregConfig::default());
    }
}
