//! The `hubreg inventory` command.

use crate::cli::args::InventoryArgs;
use crate::error::Result;
use crate::registry::RegistryInventory;
use crate::transport::RequestContext;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The inventory command implementation.
pub struct InventoryCommand<'a> {
    context: &'a CommandContext,
    args: InventoryArgs,
}

impl<'a> InventoryCommand<'a> {
    /// Create a new inventory command.
    pub fn new(context: &'a CommandContext, args: InventoryArgs) -> Self {
        Self { context, args }
    }
}

/// Whether the inventory came from the cache without a confirmed commit.
fn is_degraded(inventory: &RegistryInventory) -> bool {
    inventory
        .libraries
        .values()
        .any(|l| l.version != inventory.version)
}

/// Print an inventory fetched through `registry`.
pub(crate) fn show_inventory(
    inventory: &RegistryInventory,
    registry: &str,
    json: bool,
    ui: &mut dyn UserInterface,
) -> Result<()> {
    if is_degraded(inventory) {
        ui.warning(&format!(
            "Remote unreachable; showing cached inventory from {}",
            inventory.resolved_revision()
        ));
    }

    if json {
        let output = serde_json::to_string_pretty(inventory).map_err(anyhow::Error::from)?;
        ui.message(&output);
        return Ok(());
    }

    ui.message(&format!("registry: {}", registry));
    ui.message(&format!("revision: {}", inventory.resolved_revision()));
    if inventory.libraries.is_empty() {
        ui.message("libraries: none");
        return Ok(());
    }

    ui.message("libraries:");
    let width = inventory.libraries.keys().map(String::len).max().unwrap_or(0);
    for (name, library) in &inventory.libraries {
        ui.message(&format!(
            "  {:<width$}  {}",
            name,
            library.version,
            width = width
        ));
    }
    Ok(())
}

impl Command for InventoryCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.context.load_config()?;
        let registry = self
            .context
            .registry(&config, &self.args.name, self.args.uri.as_deref())?;

        let mut spinner = ui.start_spinner(&format!("Fetching inventory for {}", registry.name()));
        let inventory = match registry.fetch_inventory(&RequestContext::background()) {
            Ok(inventory) => {
                spinner.finish_success(&format!(
                    "{} libraries in {}",
                    inventory.libraries.len(),
                    registry.name()
                ));
                inventory
            }
            Err(e) => {
                spinner.finish_error(&format!("Could not fetch {}", registry.name()));
                return Err(e);
            }
        };

        show_inventory(&inventory, registry.name(), self.args.json, ui)?;
        Ok(CommandResult::success())
    }
}
