//! CLI command definitions for the `perch` binary.

pub mod resolve;
pub mod run;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Run social-feed agents behind credit, session, and loop-breaker gates.
#[derive(Parser)]
#[command(name = "perch", version, about, long_about = None)]
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

    /// Config file (default: ~/.perch/perch.toml).
    #[arg(long, global = true, env = "PERCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every configured agent over a JSON-lines event stream (dry run).
    Run {
        /// Event file, one JSON event per line. Reads stdin when omitted or `-`.
        #[arg(long, short)]
        events: Option<PathBuf>,

        /// Export spans through OpenTelemetry regardless of config.
        #[arg(long)]
        otel: bool,
    },

    /// Check the config file and print each agent's effective settings.
    Validate,

    /// Show how an agent would address a reply to a message.
    Resolve {
        /// The agent's own username.
        #[arg(long = "as", value_name = "USERNAME")]
        username: String,

        /// Platform message length limit.
        #[arg(long, default_value_t = 140)]
        limit: usize,

        /// Message JSON file. Reads stdin when omitted or `-`.
        message: Option<PathBuf>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Log filter for the requested verbosity.
pub fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn,perch_core=info",
        1 => "info,perch_core=debug,perch_infra=debug",
        _ => "trace",
    }
}
