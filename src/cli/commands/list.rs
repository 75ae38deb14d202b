//! The `hubreg list` command.

use crate::cli::args::ListArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The list command implementation.
pub struct ListCommand<'a> {
    context: &'a CommandContext,
    args: ListArgs,
}

impl<'a> ListCommand<'a> {
    /// Create a new list command.
    pub fn new(context: &'a CommandContext, args: ListArgs) -> Self {
        Self { context, args }
    }
}

impl Command for ListCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.context.load_config()?;

        if self.args.json {
            let output =
                serde_json::to_string_pretty(&config.registries).map_err(anyhow::Error::from)?;
            ui.message(&output);
            return Ok(CommandResult::success());
        }

        if config.registries.is_empty() {
            ui.warning("No registries configured");
            return Ok(CommandResult::success());
        }

        let width = config
            .registries
            .iter()
            .map(|r| r.name.len())
            .max()
            .unwrap_or(0);
        for registry in &config.registries {
            let marker = if registry.is_override { " (override)" } else { "" };
            ui.message(&format!(
                "{:<width$}  {}  {}{}",
                registry.name,
                registry.protocol,
                registry.uri,
                marker,
                width = width
            ));
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn context_with(yaml: &str) -> (TempDir, CommandContext) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("hubreg.yml"), yaml).unwrap();
        let context = CommandContext::new(temp.path());
        (temp, context)
    }

    #[test]
    fn lists_registries() {
        let (_temp, context) = context_with(
            "registries:\n  - name: incubator\n    uri: github.com/ksonnet/parts/tree/master/incubator\n  - name: stable\n    uri: github.com/ksonnet/parts/tree/master/stable\n    is_override: true\n",
        );
        let mut ui = MockUI::new();

        ListCommand::new(&context, ListArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(ui.messages().len(), 2);
        assert!(ui.messages()[0].starts_with("incubator  github"));
        assert!(ui.messages()[1].ends_with("(override)"));
    }

    #[test]
    fn empty_config_warns() {
        let (_temp, context) = context_with("{}");
        let mut ui = MockUI::new();

        ListCommand::new(&context, ListArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(ui.has_warning("No registries"));
    }

    #[test]
    fn json_output() {
        let (_temp, context) =
            context_with("registries:\n  - name: incubator\n    uri: github.com/a/b\n");
        let mut ui = MockUI::new();

        ListCommand::new(&context, ListArgs { json: true })
            .execute(&mut ui)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.output()).unwrap();
        assert_eq!(value[0]["name"], "incubator");
        assert_eq!(value[0]["protocol"], "github");
    }
}
