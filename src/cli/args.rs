//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use url::Url;

use super::commands::cache::CacheArgs;

/// hubreg - Resolve libraries from GitHub-hosted registries.
#[derive(Debug, Parser)]
#[command(name = "hubreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides ./hubreg.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Cache root (overrides the configured one)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// GitHub API root for public registries
    #[arg(long, global = true, value_name = "URL")]
    pub api_root: Option<Url>,

    /// GitHub token sent with API requests
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Only print command output and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse a registry URI and print its coordinates
    Parse(ParseArgs),

    /// Check that a registry URI parses and is reachable
    Validate(ValidateArgs),

    /// List configured registries
    List(ListArgs),

    /// Show a registry's library inventory
    Inventory(InventoryArgs),

    /// Download a library at an immutable commit
    Resolve(ResolveArgs),

    /// Manage the inventory cache
    Cache(CacheArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `parse` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ParseArgs {
    /// Registry URI
    pub uri: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ValidateArgs {
    /// Registry URI
    pub uri: String,

    /// Skip the availability probe
    #[arg(long)]
    pub offline: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `inventory` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InventoryArgs {
    /// Registry name
    pub name: String,

    /// Registry URI (for registries missing from the config)
    #[arg(long)]
    pub uri: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `resolve` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ResolveArgs {
    /// Registry name
    pub registry: String,

    /// Library name
    pub library: String,

    /// Local name for the library
    #[arg(long = "as", value_name = "ALIAS")]
    pub alias: Option<String>,

    /// Branch, tag or commit (defaults to the registry's reference)
    #[arg(long = "ref", value_name = "REF")]
    pub reference: Option<String>,

    /// Destination root (defaults to ./vendor)
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Registry URI (for registries missing from the config)
    #[arg(long)]
    pub uri: Option<String>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_resolve_flags() {
        let cli = Cli::try_parse_from([
            "hubreg", "resolve", "incubator", "redis", "--as", "cache", "--ref", "v1",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.registry, "incubator");
                assert_eq!(args.alias.as_deref(), Some("cache"));
                assert_eq!(args.reference.as_deref(), Some("v1"));
            }
            other => panic!("expected resolve, got {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hubreg",
            "inventory",
            "incubator",
            "--api-root",
            "http://127.0.0.1:9000/",
            "--cache-dir",
            "/tmp/cache",
        ])
        .unwrap();

        assert_eq!(cli.api_root.unwrap().as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/cache")));
    }

    #[test]
    fn rejects_bad_api_root() {
        assert!(Cli::try_parse_from(["hubreg", "list", "--api-root", "not a url"]).is_err());
    }

    #[test]
    fn subcommand_required() {
        assert!(Cli::try_parse_from(["hubreg"]).is_err());
    }
}
