//! DuckDB warehouse
//!
//! Owns the connection and all SQL for the bronze and silver tables.

use super::types::{BronzeRecord, BronzeRow, ObservationRecord};
use crate::error::{Error, Result};
use duckdb::{params, Connection};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Result of one merge load
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// Load batch identifier attached to every record of this load
    pub load_id: String,
    /// Number of records written (inserted or updated)
    pub records_written: usize,
}

/// DuckDB-backed warehouse holding the bronze and silver tables
pub struct Warehouse {
    conn: Connection,
}

impl Warehouse {
    /// Open (or create) a warehouse at the given database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::store(format!("Failed to open DuckDB database: {e}")))?;
        Ok(Self { conn })
    }

    /// Open an in-memory warehouse (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("Failed to create DuckDB connection: {e}")))?;
        Ok(Self { conn })
    }

    /// The underlying connection, for lookup-table resolvers
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ========================================================================
    // Bronze
    // ========================================================================

    /// Create the bronze table if it does not exist
    pub fn ensure_bronze_table(&self, table: &str) -> Result<()> {
        validate_identifier(table)?;
        let ddl = format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
                id BIGINT PRIMARY KEY,
                study_id BIGINT,
                subject_id BIGINT,
                site_id BIGINT,
                "date" VARCHAR,
                last_epoch_datetime_utc VARCHAR,
                payload VARCHAR,
                _load_id VARCHAR,
                _record_id VARCHAR
            )"#
        );
        self.conn.execute_batch(&ddl)?;
        Ok(())
    }

    /// Merge records into the bronze table by primary key.
    ///
    /// A record whose `id` already exists replaces that row's non-key
    /// columns; new ids are inserted. Each record gets a fresh `_record_id`
    /// and the whole batch shares one `_load_id`.
    pub fn merge_daily_statistics(
        &self,
        table: &str,
        records: &[BronzeRecord],
    ) -> Result<MergeReport> {
        self.ensure_bronze_table(table)?;

        let load_id = Uuid::new_v4().to_string();
        let sql = format!(
            r#"INSERT INTO {table}
                (id, study_id, subject_id, site_id, "date",
                 last_epoch_datetime_utc, payload, _load_id, _record_id)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (id) DO UPDATE SET
                 study_id = excluded.study_id,
                 subject_id = excluded.subject_id,
                 site_id = excluded.site_id,
                 "date" = excluded."date",
                 last_epoch_datetime_utc = excluded.last_epoch_datetime_utc,
                 payload = excluded.payload,
                 _load_id = excluded._load_id,
                 _record_id = excluded._record_id"#
        );

        let mut stmt = self.conn.prepare(&sql)?;
        for record in records {
            let record_id = Uuid::new_v4().to_string();
            stmt.execute(params![
                record.id,
                record.study_id,
                record.subject_id,
                record.site_id,
                record.date,
                record.last_epoch_datetime_utc,
                record.payload_json()?,
                load_id,
                record_id,
            ])?;
        }

        info!(
            "Merged {} records into '{}' (load {})",
            records.len(),
            table,
            load_id
        );

        Ok(MergeReport {
            load_id,
            records_written: records.len(),
        })
    }

    /// Read every bronze row, ordered by id
    pub fn bronze_rows(&self, table: &str) -> Result<Vec<BronzeRow>> {
        validate_identifier(table)?;
        let sql = format!(
            r#"SELECT id, study_id, subject_id, site_id, "date",
                      payload, _load_id, _record_id
               FROM {table} ORDER BY id"#
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(BronzeRow {
                    id: row.get(0)?,
                    study_id: row.get(1)?,
                    subject_id: row.get(2)?,
                    site_id: row.get(3)?,
                    date: row.get(4)?,
                    payload: row.get(5)?,
                    load_id: row.get(6)?,
                    record_id: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Read {} bronze rows from '{}'", rows.len(), table);
        Ok(rows)
    }

    // ========================================================================
    // Silver
    // ========================================================================

    /// Replace the silver table with the given observation rows (full
    /// refresh: the table is recreated on every transform run)
    pub fn rebuild_observations(&self, table: &str, rows: &[ObservationRecord]) -> Result<()> {
        validate_identifier(table)?;
        let ddl = format!(
            "CREATE OR REPLACE TABLE {table} (
                observation_id VARCHAR,
                status VARCHAR,
                code VARCHAR,
                category VARCHAR,
                subject VARCHAR,
                device VARCHAR,
                study_environment VARCHAR,
                part_of VARCHAR,
                derived_from VARCHAR,
                body_site VARCHAR,
                interpretation VARCHAR,
                effective_datetime VARCHAR,
                effective_period_start VARCHAR,
                effective_period_end VARCHAR,
                bronze_id BIGINT,
                study_id BIGINT,
                subject_id BIGINT,
                site_id BIGINT,
                _load_id VARCHAR,
                _record_id VARCHAR
            )"
        );
        self.conn.execute_batch(&ddl)?;

        let sql = format!(
            "INSERT INTO {table} VALUES
             (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        for row in rows {
            stmt.execute(params![
                row.observation_id,
                row.status,
                row.code,
                row.category,
                row.subject,
                row.device,
                row.study_environment,
                row.part_of,
                row.derived_from,
                row.body_site,
                row.interpretation,
                row.effective_datetime,
                row.effective_period_start,
                row.effective_period_end,
                row.bronze_id,
                row.study_id,
                row.subject_id,
                row.site_id,
                row.load_id,
                row.record_id,
            ])?;
        }

        info!("Rebuilt '{}' with {} observations", table, rows.len());
        Ok(())
    }

    /// Read every silver row, ordered by bronze id
    pub fn observation_rows(&self, table: &str) -> Result<Vec<ObservationRecord>> {
        validate_identifier(table)?;
        let sql = format!("SELECT * FROM {table} ORDER BY bronze_id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ObservationRecord {
                    observation_id: row.get(0)?,
                    status: row.get(1)?,
                    code: row.get(2)?,
                    category: row.get(3)?,
                    subject: row.get(4)?,
                    device: row.get(5)?,
                    study_environment: row.get(6)?,
                    part_of: row.get(7)?,
                    derived_from: row.get(8)?,
                    body_site: row.get(9)?,
                    interpretation: row.get(10)?,
                    effective_datetime: row.get(11)?,
                    effective_period_start: row.get(12)?,
                    effective_period_end: row.get(13)?,
                    bronze_id: row.get(14)?,
                    study_id: row.get(15)?,
                    subject_id: row.get(16)?,
                    site_id: row.get(17)?,
                    load_id: row.get(18)?,
                    record_id: row.get(19)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Row count of a table
    pub fn count(&self, table: &str) -> Result<usize> {
        validate_identifier(table)?;
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl std::fmt::Debug for Warehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warehouse").finish_non_exhaustive()
    }
}

/// Reject table names that are not plain identifiers; table names are
/// interpolated into SQL and must never carry quoting or punctuation
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.chars().next().is_some_and(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(Error::store(format!("Invalid table name: '{name}'")))
    }
}

#[cfg(test)]
mod identifier_tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("daily_statistics").is_ok());
        assert!(validate_identifier("observations_v2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("drop table;--").is_err());
    }
}
