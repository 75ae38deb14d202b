//! Cache command implementation.
//!
//! Provides `hubreg cache list` and `hubreg cache clear`.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cache::CacheStore;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// Arguments for the cache command.
#[derive(Debug, Clone, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

/// Cache subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum CacheSubcommand {
    /// List cached inventories.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Remove cached inventories.
    Clear {
        /// Only clear this registry.
        name: Option<String>,
    },
}

/// The cache command implementation.
pub struct CacheCommand<'a> {
    context: &'a CommandContext,
    args: CacheArgs,
}

impl<'a> CacheCommand<'a> {
    /// Create a new cache command.
    pub fn new(context: &'a CommandContext, args: CacheArgs) -> Self {
        Self { context, args }
    }
}

impl Command for CacheCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> crate::error::Result<CommandResult> {
        let config = self.context.load_config()?;
        let options = config.registry_options();
        let store = CacheStore::new(&options.cache_root).with_permissions(options.permissions);

        match &self.args.command {
            CacheSubcommand::List { json } => list_cache(&store, *json, ui)?,
            CacheSubcommand::Clear { name } => clear_cache(&store, name.as_deref(), ui)?,
        }

        Ok(CommandResult::success())
    }
}

fn list_cache(store: &CacheStore, json: bool, ui: &mut dyn UserInterface) -> Result<()> {
    let entries = store.list()?;

    if json {
        let output = serde_json::to_string_pretty(&entries)?;
        ui.message(&output);
        return Ok(());
    }

    if entries.is_empty() {
        ui.warning(&format!("Cache is empty ({})", store.root().display()));
        return Ok(());
    }

    for entry in &entries {
        let revision = entry.revision.as_deref().unwrap_or("unreadable");
        let libraries = entry
            .libraries
            .map(|n| format!("{} libraries", n))
            .unwrap_or_else(|| "-".to_string());
        ui.message(&format!(
            "{}  {}  {}  {} bytes",
            entry.name, revision, libraries, entry.size_bytes
        ));
    }
    ui.success(&format!(
        "{} cached registries, {} bytes total",
        entries.len(),
        store.total_size()?
    ));

    Ok(())
}

fn clear_cache(store: &CacheStore, name: Option<&str>, ui: &mut dyn UserInterface) -> Result<()> {
    match name {
        Some(name) => {
            if store.remove(name)? {
                ui.success(&format!("Cleared cache for {}", name));
            } else {
                ui.warning(&format!("No cache for {}", name));
            }
        }
        None => {
            let cleared = store.clear()?;
            ui.success(&format!("Cleared {} cached registries", cleared));
        }
    }
    Ok(())
}
