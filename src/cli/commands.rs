//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - catalog: list the filtered modifier catalog
//! - split: split a stat catalog into area / non-area files
//! - check: evaluate one item description against the targets
//! - run: roll until the targets hit or Ctrl-C

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// modroll - roll item modifiers until the targets hit
#[derive(Parser, Debug)]
#[command(name = "modroll")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the filtered modifier catalog with indices
    Catalog {
        /// Only show modifiers whose text contains this (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Split a stat catalog into area and non-area modifier files
    Split {
        /// Input NDJSON catalog
        input: PathBuf,

        /// Output for records with fromAreaMods
        #[arg(long, default_value = "terms_area.ndjson")]
        area: PathBuf,

        /// Output for the remaining records
        #[arg(long, default_value = "terms_non_area.ndjson")]
        non_area: PathBuf,
    },

    /// Evaluate one item description against the configured targets
    Check {
        /// Item text file (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Roll until the configured targets hit (Ctrl-C stops)
    Run,
}
