//! CLI command definitions for the `supportdesk` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod config;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Customer-support chat backend.
#[derive(Parser)]
#[command(name = "supportdesk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info",
            1 => "debug,sqlx=warn",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides PORT and the config file).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides HOST and the config file).
        #[arg(long)]
        host: Option<String>,
    },

    /// Inspect the resolved configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Check that the database is reachable and migrated.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration with secrets redacted.
    Show,
}
