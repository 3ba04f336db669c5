//! CLI module
//!
//! Command-line interface for running the pipeline.
//!
//! # Commands
//!
//! - `extract` - Load daily statistics into the bronze table
//! - `transform` - Rebuild the silver observation table from bronze
//! - `run` - Both stages back to back
//! - `show-config` - Print the effective configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
