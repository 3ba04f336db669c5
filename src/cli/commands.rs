//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CentrePoint daily statistics pipeline CLI
#[derive(Parser, Debug)]
#[command(name = "centrepoint-pipeline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Incremental state file (overrides the configured path)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Warehouse database file (overrides the configured path)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch daily statistics from the API into the bronze table
    Extract {
        /// Ignore the incremental cursor and reload the whole date window
        #[arg(long)]
        refresh: bool,
    },

    /// Rebuild the silver observation table from bronze
    Transform,

    /// Extract then transform
    Run {
        /// Ignore the incremental cursor and reload the whole date window
        #[arg(long)]
        refresh: bool,
    },

    /// Print the effective configuration after defaults are applied
    ShowConfig,
}
