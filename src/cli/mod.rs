//! The `kamek` command line: clap definitions in [`args`], one module per
//! subcommand in [`commands`].

pub mod args;
pub mod commands;

pub use args::{
    CheckArgs, Cli, Commands, CompletionsArgs, InfoArgs, PackagesArgs, ResolveArgs, SuiteArgs,
    UpgradeArgs,
};
pub use commands::{Command, CommandContext, CommandDispatcher, CommandResult};
