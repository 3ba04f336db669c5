//! Warehouse module
//!
//! DuckDB-backed bronze and silver tables. The bronze table is merge-loaded
//! by primary key `id`, so repeated or overlapping extractions converge to
//! the same state regardless of order. The silver table is rebuilt from
//! scratch on every transform run.

mod types;
mod warehouse;

pub use types::{BronzeRecord, BronzeRow, ObservationRecord};
pub use warehouse::{MergeReport, Warehouse};

pub(crate) use warehouse::validate_identifier;
