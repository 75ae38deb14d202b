//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Global flags are collected once
//! into a [`CommandContext`] that knows how to load the configuration and
//! build registries.

pub mod cache;
pub mod completions;
pub mod context;
pub mod dispatcher;
pub mod inventory;
pub mod list;
pub mod parse;
pub mod resolve;
pub mod validate;

pub use context::CommandContext;
pub use dispatcher::{Command, CommandDispatcher, CommandResult};
