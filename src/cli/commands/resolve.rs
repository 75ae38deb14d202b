//! The `hubreg resolve` command.
//!
//! Downloads a library into `<dest>/<registry>/<alias>`. Files land in a
//! staging directory first and are renamed into place only once the whole
//! library resolved, so a failed download never leaves a partial copy.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::cli::args::ResolveArgs;
use crate::error::{HubregError, Result};
use crate::registry::is_valid_name;
use crate::transport::RequestContext;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The resolve command implementation.
pub struct ResolveCommand<'a> {
    context: &'a CommandContext,
    args: ResolveArgs,
}

impl<'a> ResolveCommand<'a> {
    /// Create a new resolve command.
    pub fn new(context: &'a CommandContext, args: ResolveArgs) -> Self {
        Self { context, args }
    }

    /// Local directory name; defaults to the library name.
    fn alias(&self) -> Result<&str> {
        let alias = self
            .args
            .alias
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(&self.args.library);
        if !is_valid_name(alias) {
            return Err(HubregError::InvalidName {
                what: "alias",
                name: alias.to_string(),
            });
        }
        Ok(alias)
    }
}

/// Map a registry-relative path under `library` into `root`.
fn target_path(root: &Path, library: &str, path: &str) -> Result<PathBuf> {
    let inner = if path == library {
        ""
    } else {
        path.strip_prefix(library)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    };

    let relative = Path::new(inner);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(HubregError::Other(anyhow::anyhow!(
            "refusing to write '{}' outside the destination",
            path
        )));
    }
    Ok(root.join(relative))
}

fn short(sha: &str) -> &str {
    sha.get(..12).unwrap_or(sha)
}

impl Command for ResolveCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let alias = self.alias()?;
        let config = self.context.load_config()?;
        let registry =
            self.context
                .registry(&config, &self.args.registry, self.args.uri.as_deref())?;

        let library = self.args.library.as_str();
        let dest_root = self
            .args
            .dest
            .clone()
            .unwrap_or_else(|| self.context.working_dir().join("vendor"));
        let target = dest_root.join(registry.name()).join(alias);
        let staging = dest_root.join(format!(".{}.{}.staging", alias, std::process::id()));

        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let mut spinner = ui.start_spinner(&format!("Resolving {}/{}", registry.name(), library));
        let result = registry.resolve_library(
            &RequestContext::background(),
            library,
            Some(alias),
            self.args.reference.as_deref(),
            &mut |path: &str, contents: &[u8]| {
                let file = target_path(&staging, library, path)?;
                if let Some(parent) = file.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&file, contents)?;
                spinner.set_message(&format!("Fetched {}", path));
                Ok(())
            },
            &mut |path: &str| {
                fs::create_dir_all(target_path(&staging, library, path)?)?;
                Ok(())
            },
        );

        let resolution = match result {
            Ok(resolution) => resolution,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                spinner.finish_error(&format!("Could not resolve {}", library));
                return Err(e);
            }
        };

        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&staging, &target)?;

        spinner.finish_success(&format!(
            "Resolved {} @ {} into {}",
            library,
            short(&resolution.reference.version),
            target.display()
        ));

        let reference =
            serde_yaml::to_string(&resolution.reference).map_err(anyhow::Error::from)?;
        ui.message(reference.trim_end());

        Ok(CommandResult::success())
    }
}
