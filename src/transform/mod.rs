//! Bronze-to-silver transform
//!
//! Reads landed daily statistics, resolves internal keys to platform
//! identifiers, derives the content-addressed observation id, and rebuilds
//! the silver table. The whole transform is a pure function of the bronze
//! table plus the resolver: re-running it over unchanged input produces a
//! byte-identical silver table.
//!
//! Per-row problems never abort the run. An unparseable date nulls the
//! temporal fields, a lookup miss nulls the reference, and the row is still
//! written, so bronze and silver always have the same row count. A broken
//! resolver backend (missing lookup table, SQL failure) is not a per-row
//! problem and fails the whole run.

mod identity;
mod observation;
mod resolver;

pub use identity::{observation_id, SOURCE_TYPE};
pub use observation::{day_bounds, map_observation, DayBounds};
pub use resolver::{
    PlaceholderResolver, ReferenceResolver, ResolutionKey, ResolvedReferences, TableResolver,
};

use crate::error::Result;
use crate::store::Warehouse;
use serde_json::Value;
use tracing::{info, warn};

/// Statistics from one transform run
#[derive(Debug, Clone, Default)]
pub struct TransformReport {
    /// Bronze rows read
    pub rows_read: usize,
    /// Silver rows written (always equals `rows_read`)
    pub rows_written: usize,
    /// Rows whose bronze date could not be parsed (temporal fields nulled)
    pub date_parse_failures: usize,
}

/// Run the transform: bronze table in, silver table out (full refresh)
pub fn run_transform(
    warehouse: &Warehouse,
    bronze_table: &str,
    silver_table: &str,
    resolver: &dyn ReferenceResolver,
) -> Result<TransformReport> {
    let bronze = warehouse.bronze_rows(bronze_table)?;
    let mut report = TransformReport {
        rows_read: bronze.len(),
        ..Default::default()
    };

    let mut observations = Vec::with_capacity(bronze.len());
    for row in &bronze {
        let payload = row.payload_value().unwrap_or(Value::Null);
        let key = ResolutionKey {
            study_id: row.study_id,
            subject_id: row.subject_id,
            site_id: row.site_id,
            device_serial: payload
                .get("deviceSerial")
                .and_then(Value::as_str)
                .map(String::from),
        };
        let refs = resolver.resolve(&key)?;

        let bounds = row.date.as_deref().and_then(day_bounds);
        if bounds.is_none() {
            report.date_parse_failures += 1;
            warn!(
                "Bronze row {} has unparseable date {:?}; temporal fields nulled",
                row.id, row.date
            );
        }

        observations.push(map_observation(row, &refs, bounds.as_ref())?);
    }

    warehouse.rebuild_observations(silver_table, &observations)?;
    report.rows_written = observations.len();

    info!(
        "Transformed {} bronze rows into '{}' ({} date failures)",
        report.rows_read, silver_table, report.date_parse_failures
    );

    Ok(report)
}
