//! The `hubreg parse` command.
//!
//! Prints the coordinates a registry URI resolves to, without touching the
//! network.

use crate::cli::args::ParseArgs;
use crate::error::Result;
use crate::registry::RegistryDescriptor;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The parse command implementation.
pub struct ParseCommand {
    args: ParseArgs,
}

impl ParseCommand {
    /// Create a new parse command.
    pub fn new(args: ParseArgs) -> Self {
        Self { args }
    }
}

impl Command for ParseCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let descriptor = RegistryDescriptor::parse(&self.args.uri)?;

        let output = if self.args.json {
            serde_json::to_string_pretty(&descriptor).map_err(anyhow::Error::from)?
        } else {
            serde_yaml::to_string(&descriptor).map_err(anyhow::Error::from)?
        };
        ui.message(output.trim_end());

        Ok(CommandResult::success())
    }
}
