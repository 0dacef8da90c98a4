//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which loads the
//! configuration once and hands every command the same [`CommandContext`]:
//! the process runner, environment, fetcher, and release-metadata source.
//! Tests build the context from fakes instead.

pub mod check;
pub mod completions;
pub mod dispatcher;
pub mod info;
pub mod packages;
pub mod resolve;
pub mod suite;
pub mod upgrade;

pub use dispatcher::{Command, CommandContext, CommandDispatcher, CommandResult};
