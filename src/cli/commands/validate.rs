//! The `hubreg validate` command.

use crate::cli::args::ValidateArgs;
use crate::error::Result;
use crate::registry::RegistryDescriptor;
use crate::transport::Transport;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The validate command implementation.
pub struct ValidateCommand<'a> {
    context: &'a CommandContext,
    args: ValidateArgs,
}

impl<'a> ValidateCommand<'a> {
    /// Create a new validate command.
    pub fn new(context: &'a CommandContext, args: ValidateArgs) -> Self {
        Self { context, args }
    }
}

impl Command for ValidateCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        // Parse first so malformed input never reaches the network.
        let descriptor = RegistryDescriptor::parse(&self.args.uri)?;

        if !self.args.offline {
            let config = self.context.load_config()?;
            let transport = self.context.transport(&config)?;

            let mut spinner = ui.start_spinner(&format!("Checking {}", self.args.uri));
            if let Err(e) = transport.validate_url(&self.args.uri) {
                spinner.finish_error(&format!("{} is not reachable", self.args.uri));
                return Err(e.into());
            }
            spinner.finish_success(&format!("{} is reachable", self.args.uri));
        }

        ui.success(&format!(
            "Valid registry URI: {}/{}@{} at '{}'",
            descriptor.organization(),
            descriptor.repository(),
            descriptor.revision_ref(),
            descriptor.registry_relative_path()
        ));
        Ok(CommandResult::success())
    }
}
