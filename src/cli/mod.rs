//! CLI module for modroll - command-line interface, subcommands, and terminal output.

pub mod commands;
pub mod progress;

pub use commands::Cli;
