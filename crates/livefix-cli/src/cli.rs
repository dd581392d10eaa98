//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Livefix CLI
#[derive(Parser)]
#[command(name = "livefix")]
#[command(about = "Livefix - location-update negotiation pipeline", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Path to config file (overrides built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Stream simulated location fixes through the negotiation pipeline
    Watch {
        /// Deny the permission until the host prompt runs
        #[arg(long)]
        deny_permission: bool,

        /// Require a settings resolution before streaming
        #[arg(long)]
        settings_resolution: bool,

        /// Reject the settings resolution when it is offered
        #[arg(long)]
        reject_resolution: bool,

        /// Number of fixes to stream before exiting
        #[arg(long, default_value_t = 5)]
        fixes: u32,

        /// Swap to a low-power descriptor after this many fixes
        #[arg(long)]
        switch_after: Option<u32>,

        /// Emit results as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the last known fix, if the simulated platform holds one
    Last {
        /// Deny the permission for the one-shot query
        #[arg(long)]
        deny_permission: bool,
    },
}
