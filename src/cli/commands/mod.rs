//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`]. Running `vkdiag`
//! without a subcommand executes [`diagnose::DiagnoseCommand`].

pub mod completions;
pub mod diagnose;
pub mod dispatcher;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
