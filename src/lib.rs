// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # CentrePoint Daily Statistics Pipeline
//!
//! A two-stage ELT pipeline for Actigraph CentrePoint wearable data.
//!
//! ## Stages
//!
//! - **Extract**: authenticate with OAuth2 client credentials, walk the
//!   paginated daily statistics endpoint, and merge the raw records into a
//!   DuckDB bronze table by primary key. An incremental cursor over
//!   `lastEpochDateTimeUtc` keeps repeat runs cheap.
//! - **Transform**: rebuild a silver observation table from bronze — resolve
//!   platform references, derive day-granularity temporal bounds, and assign
//!   each row a deterministic content-addressed identifier.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use centrepoint_pipeline::{PipelineConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PipelineConfig::from_file("pipeline.yaml")?;
//!     config.validate()?;
//!     // wire up TokenProvider, HttpClient, DailyStatisticsFetcher and
//!     // Warehouse, then call pipeline::run_full
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Configuration loading and validation
pub mod config;

/// OAuth2 client-credentials token provider
pub mod auth;

/// HTTP client with bearer authentication
pub mod http;

/// Offset pagination
pub mod pagination;

/// Paginated daily statistics fetcher
pub mod fetch;

/// DuckDB warehouse: bronze merge loading and silver rebuilds
pub mod store;

/// Incremental cursor state
pub mod state;

/// Bronze-to-silver observation transform
pub mod transform;

/// Stage orchestration
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

// Re-export commonly used types
pub use config::{Credentials, PipelineConfig};
pub use pipeline::{run_extract, run_full, ExtractReport, RunReport};
pub use store::Warehouse;
pub use transform::{run_transform, TransformReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
