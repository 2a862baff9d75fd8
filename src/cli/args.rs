//! Command line argument parsing for the Tessera CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Tessera - inspect composite views over segment lists
#[derive(Parser, Debug, Clone)]
#[command(name = "tessera")]
#[command(about = "Inspect composite views over immutable index segments")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TesseraArgs {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// View configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "TESSERA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl TesseraArgs {
    /// Effective verbosity: 0 when quiet, otherwise one more than the `-v` count.
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the cumulative boundary table for a list of segment sizes
    Starts(StartsArgs),

    /// Resolve global positions to (segment, local offset)
    Locate(LocateArgs),
}

/// Arguments for printing the boundary table
#[derive(Parser, Debug, Clone)]
pub struct StartsArgs {
    /// Segment sizes in index order, comma separated
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub sizes: Vec<u64>,
}

/// Arguments for resolving positions
#[derive(Parser, Debug, Clone)]
pub struct LocateArgs {
    /// Segment sizes in index order, comma separated
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub sizes: Vec<u64>,

    /// Global positions to resolve
    #[arg(value_name = "POSITION", required = true)]
    pub positions: Vec<u64>,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
