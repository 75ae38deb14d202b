//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - Registry names must be non-empty, unique and usable as a directory name
//! - Registry URIs must be non-empty and parse
//! - Timeouts must be positive

use crate::config::schema::HubregConfig;
use crate::error::{HubregError, Result};
use crate::registry::{is_valid_name, RegistryDescriptor};
use std::collections::HashSet;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Registry name if error is registry-specific
    pub registry: Option<String>,
}

/// Validate a configuration and return all errors.
///
/// This function collects all validation errors rather than stopping
/// at the first one, allowing users to fix multiple issues at once.
pub fn validate_config(config: &HubregConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_registries(config));
    errors.extend(validate_settings(config));

    errors
}

/// Validate registry entries.
fn validate_registries(config: &HubregConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, registry) in config.registries.iter().enumerate() {
        if registry.name.trim().is_empty() {
            errors.push(ValidationError {
                rule: "missing-name".to_string(),
                message: format!("Registry #{} has an empty name", index + 1),
                registry: None,
            });
            continue;
        }

        if !is_valid_name(&registry.name) {
            errors.push(ValidationError {
                rule: "invalid-name".to_string(),
                message: format!(
                    "Registry name '{}' must be a single path component",
                    registry.name
                ),
                registry: Some(registry.name.clone()),
            });
        }

        if !seen.insert(registry.name.as_str()) {
            errors.push(ValidationError {
                rule: "duplicate-name".to_string(),
                message: format!("Registry '{}' is defined more than once", registry.name),
                registry: Some(registry.name.clone()),
            });
        }

        if registry.uri.trim().is_empty() {
            errors.push(ValidationError {
                rule: "missing-uri".to_string(),
                message: format!("Registry '{}' has an empty uri", registry.name),
                registry: Some(registry.name.clone()),
            });
        } else if let Err(e) = RegistryDescriptor::parse(&registry.uri) {
            errors.push(ValidationError {
                rule: "invalid-uri".to_string(),
                message: format!("Registry '{}': {}", registry.name, e),
                registry: Some(registry.name.clone()),
            });
        }
    }

    errors
}

fn validate_settings(config: &HubregConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (key, value) in [
        ("resolve_timeout", config.settings.resolve_timeout),
        ("request_timeout", config.settings.request_timeout),
    ] {
        if value == 0 {
            errors.push(ValidationError {
                rule: "zero-timeout".to_string(),
                message: format!("Setting '{}' must be at least 1 second", key),
                registry: None,
            });
        }
    }

    errors
}

/// Validate configuration, returning an error if any issues are found.
pub fn validate(config: &HubregConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(HubregError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryConfig;

    fn config(registries: Vec<RegistryConfig>) -> HubregConfig {
        HubregConfig {
            registries,
            ..Default::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = config(vec![
            RegistryConfig::github("incubator", "github.com/ksonnet/parts/tree/master/incubator"),
            RegistryConfig::github("stable", "github.com/ksonnet/parts/tree/master/stable"),
        ]);
        assert!(validate_config(&config).is_empty());
        validate(&config).unwrap();
    }

    #[test]
    fn rejects_duplicate_names() {
        let config = config(vec![
            RegistryConfig::github("incubator", "github.com/a/b"),
            RegistryConfig::github("incubator", "github.com/a/c"),
        ]);

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "duplicate-name");
        assert_eq!(errors[0].registry.as_deref(), Some("incubator"));
    }

    #[test]
    fn rejects_empty_name_and_uri() {
        let config = config(vec![
            RegistryConfig::github("", "github.com/a/b"),
            RegistryConfig::github("blank", "  "),
        ]);

        let rules: Vec<_> = validate_config(&config).into_iter().map(|e| e.rule).collect();
        assert_eq!(rules, vec!["missing-name", "missing-uri"]);
    }

    #[test]
    fn rejects_names_that_are_not_directory_names() {
        let config = config(vec![
            RegistryConfig::github("..", "github.com/a/b"),
            RegistryConfig::github("/tmp/x", "github.com/a/b"),
            RegistryConfig::github("a/b", "github.com/a/b"),
        ]);

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.rule == "invalid-name"));
        assert!(validate(&config).unwrap_err().to_string().contains("'..'"));
    }

    #[test]
    fn rejects_unparseable_uri() {
        let config = config(vec![RegistryConfig::github("bad", "gitlab.com/a/b")]);

        let errors = validate_config(&config);
        assert_eq!(errors[0].rule, "invalid-uri");
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = config(Vec::new());
        config.settings.resolve_timeout = 0;

        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("resolve_timeout"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = config(vec![
            RegistryConfig::github("a", ""),
            RegistryConfig::github("a", "github.com/x/y"),
        ]);
        config.settings.request_timeout = 0;

        assert_eq!(validate_config(&config).len(), 3);
    }
}
