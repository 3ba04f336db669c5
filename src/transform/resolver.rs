//! Reference resolution
//!
//! Translates internal numeric identifiers (study, subject, site) and the
//! device serial into stable platform identifiers via null-safe outer
//! lookups: an unmatched key yields `None`, so downstream mapping still
//! produces a row with null references instead of dropping the record.
//! Only genuine misses are nulls; a broken lookup (missing table, bad SQL)
//! is an error and fails the transform.
//!
//! `ReferenceResolver` is the injectable seam; the production join logic
//! can be swapped in without touching the transform.

use crate::error::Result;
use crate::store::validate_identifier;
use duckdb::{params, Connection};

/// Lookup key drawn from one landed record
#[derive(Debug, Clone, Default)]
pub struct ResolutionKey {
    /// CentrePoint study id
    pub study_id: Option<i64>,
    /// CentrePoint subject id
    pub subject_id: Option<i64>,
    /// CentrePoint site id
    pub site_id: Option<i64>,
    /// Device serial, when the payload carries one
    pub device_serial: Option<String>,
}

/// Resolved platform identifiers; `None` marks a lookup miss
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedReferences {
    /// Platform patient identifier
    pub platform_patient_uuid: Option<String>,
    /// Platform device identifier
    pub device_id: Option<String>,
    /// Platform study-environment identifier
    pub platform_study_environment_uuid: Option<String>,
}

/// Resolves internal keys to external stable identifiers
pub trait ReferenceResolver {
    /// Resolve one record's keys. A miss is a null; only a broken lookup
    /// backend is an error.
    fn resolve(&self, key: &ResolutionKey) -> Result<ResolvedReferences>;
}

// ============================================================================
// Placeholder resolver
// ============================================================================

/// Placeholder patient identifier emitted until reference tables exist
pub const PLACEHOLDER_PATIENT_UUID: &str = "placeholder-patient-uuid";

/// Placeholder device identifier emitted until reference tables exist
pub const PLACEHOLDER_DEVICE_ID: &str = "placeholder-device-id";

/// Placeholder study-environment identifier emitted until reference tables exist
pub const PLACEHOLDER_STUDY_ENVIRONMENT_UUID: &str = "placeholder-study-environment-uuid";

/// NOT PRODUCTION-READY: returns fixed placeholder identifiers regardless of
/// input. Every observation derived through this resolver shares the same
/// reference values (and therefore collides on the patient/device segments
/// of the observation id). Replace with [`TableResolver`] once the platform
/// reference tables are populated.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderResolver;

impl ReferenceResolver for PlaceholderResolver {
    fn resolve(&self, _key: &ResolutionKey) -> Result<ResolvedReferences> {
        Ok(ResolvedReferences {
            platform_patient_uuid: Some(PLACEHOLDER_PATIENT_UUID.to_string()),
            device_id: Some(PLACEHOLDER_DEVICE_ID.to_string()),
            platform_study_environment_uuid: Some(PLACEHOLDER_STUDY_ENVIRONMENT_UUID.to_string()),
        })
    }
}

// ============================================================================
// Table resolver
// ============================================================================

/// Resolver backed by warehouse lookup tables.
///
/// Expected table shapes:
/// - `{patient_table}(subject_id BIGINT, platform_patient_uuid VARCHAR)`
/// - `{device_table}(device_serial VARCHAR, device_id VARCHAR)`
/// - `{environment_table}(study_id BIGINT, site_id BIGINT,
///   platform_study_environment_uuid VARCHAR)`
///
/// All lookups are left-outer: no match (or a missing input key) resolves
/// to `None`. A missing table or other SQL failure is an error, not a miss.
#[derive(Debug)]
pub struct TableResolver<'a> {
    conn: &'a Connection,
    patient_table: String,
    device_table: String,
    environment_table: String,
}

impl<'a> TableResolver<'a> {
    /// Create a resolver over the given lookup tables.
    ///
    /// Table names are interpolated into SQL and must pass the same
    /// identifier check the warehouse applies to its own tables.
    pub fn new(
        conn: &'a Connection,
        patient_table: impl Into<String>,
        device_table: impl Into<String>,
        environment_table: impl Into<String>,
    ) -> Result<Self> {
        let patient_table = patient_table.into();
        let device_table = device_table.into();
        let environment_table = environment_table.into();
        validate_identifier(&patient_table)?;
        validate_identifier(&device_table)?;
        validate_identifier(&environment_table)?;
        Ok(Self {
            conn,
            patient_table,
            device_table,
            environment_table,
        })
    }

    fn lookup_patient(&self, subject_id: i64) -> Result<Option<String>> {
        let sql = format!(
            "SELECT platform_patient_uuid FROM {} WHERE subject_id = ?",
            self.patient_table
        );
        self.query_optional(&sql, params![subject_id])
    }

    fn lookup_device(&self, serial: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT device_id FROM {} WHERE device_serial = ?",
            self.device_table
        );
        self.query_optional(&sql, params![serial])
    }

    fn lookup_environment(&self, study_id: i64, site_id: Option<i64>) -> Result<Option<String>> {
        let sql = format!(
            "SELECT platform_study_environment_uuid FROM {}
             WHERE study_id = ? AND site_id IS NOT DISTINCT FROM ?",
            self.environment_table
        );
        self.query_optional(&sql, params![study_id, site_id])
    }

    fn query_optional(&self, sql: &str, params: impl duckdb::Params) -> Result<Option<String>> {
        match self
            .conn
            .query_row(sql, params, |row| row.get::<_, Option<String>>(0))
        {
            Ok(value) => Ok(value),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ReferenceResolver for TableResolver<'_> {
    fn resolve(&self, key: &ResolutionKey) -> Result<ResolvedReferences> {
        let platform_patient_uuid = match key.subject_id {
            Some(id) => self.lookup_patient(id)?,
            None => None,
        };
        let device_id = match key.device_serial.as_deref() {
            Some(serial) => self.lookup_device(serial)?,
            None => None,
        };
        let platform_study_environment_uuid = match key.study_id {
            Some(study) => self.lookup_environment(study, key.site_id)?,
            None => None,
        };
        Ok(ResolvedReferences {
            platform_patient_uuid,
            device_id,
            platform_study_environment_uuid,
        })
    }
}
