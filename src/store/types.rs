//! Row types for the bronze and silver tables

use crate::error::{Error, Result};
use serde_json::Value;

/// A raw daily statistic as fetched from the API, ready for merge loading.
///
/// The numeric identifiers are lifted out of the payload so they become
/// queryable columns; the full payload (including the nested epoch, cutpoint
/// and step aggregations) is kept verbatim as JSON text.
#[derive(Debug, Clone)]
pub struct BronzeRecord {
    /// Vendor primary identifier; the merge key
    pub id: i64,
    /// CentrePoint study id
    pub study_id: Option<i64>,
    /// CentrePoint subject id
    pub subject_id: Option<i64>,
    /// CentrePoint site id
    pub site_id: Option<i64>,
    /// Calendar date of the statistic, as reported
    pub date: Option<String>,
    /// Incremental cursor field reported by the API
    pub last_epoch_datetime_utc: Option<String>,
    /// The complete record as returned by the API
    pub payload: Value,
}

impl BronzeRecord {
    /// Parse one element of the `items` array.
    ///
    /// A record without a numeric `id` cannot be merged and fails the run.
    pub fn from_item(item: &Value) -> Result<Self> {
        let id = item
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::malformed(format!("record has no numeric 'id': {item}")))?;

        Ok(Self {
            id,
            study_id: item.get("studyId").and_then(Value::as_i64),
            subject_id: item.get("subjectId").and_then(Value::as_i64),
            site_id: item.get("siteId").and_then(Value::as_i64),
            date: item.get("date").and_then(Value::as_str).map(String::from),
            last_epoch_datetime_utc: item
                .get("lastEpochDateTimeUtc")
                .and_then(Value::as_str)
                .map(String::from),
            payload: item.clone(),
        })
    }

    /// Payload serialized as JSON text for storage
    pub fn payload_json(&self) -> Result<String> {
        serde_json::to_string(&self.payload).map_err(Error::JsonParse)
    }
}

/// A bronze row read back from the warehouse, provenance included
#[derive(Debug, Clone)]
pub struct BronzeRow {
    /// Vendor primary identifier
    pub id: i64,
    /// CentrePoint study id
    pub study_id: Option<i64>,
    /// CentrePoint subject id
    pub subject_id: Option<i64>,
    /// CentrePoint site id
    pub site_id: Option<i64>,
    /// Calendar date of the statistic
    pub date: Option<String>,
    /// Full payload as JSON text
    pub payload: String,
    /// Load batch identifier
    pub load_id: String,
    /// Per-record identifier
    pub record_id: String,
}

impl BronzeRow {
    /// Parse the stored payload back into JSON
    pub fn payload_value(&self) -> Result<Value> {
        serde_json::from_str(&self.payload).map_err(Error::JsonParse)
    }
}

/// One silver row: the flattened observation shape written to the warehouse.
///
/// Nested structures (code, category, references, null-placeholder arrays)
/// are serialized as JSON text columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationRecord {
    /// Content-addressed identifier, stable across runs
    pub observation_id: String,
    /// Constant status for this record type
    pub status: String,
    /// Coded value, JSON text
    pub code: String,
    /// Category coding, JSON text
    pub category: String,
    /// Subject reference `{reference, type}`, JSON text
    pub subject: String,
    /// Device reference `{reference, type}`, JSON text
    pub device: String,
    /// Study-environment reference `{reference, type}`, JSON text
    pub study_environment: String,
    /// Unpopulated reference array, JSON text `[null]`
    pub part_of: String,
    /// Unpopulated reference array, JSON text `[null]`
    pub derived_from: String,
    /// Unpopulated coding array, JSON text `[null]`
    pub body_site: String,
    /// Unpopulated coding array, JSON text `[null]`
    pub interpretation: String,
    /// Event instant; null when the bronze date was unparseable
    pub effective_datetime: Option<String>,
    /// Start of the day window
    pub effective_period_start: Option<String>,
    /// End of the day window
    pub effective_period_end: Option<String>,
    /// Source bronze row id
    pub bronze_id: i64,
    /// Carried through unchanged from bronze
    pub study_id: Option<i64>,
    /// Carried through unchanged from bronze
    pub subject_id: Option<i64>,
    /// Carried through unchanged from bronze
    pub site_id: Option<i64>,
    /// Load batch provenance, carried from bronze
    pub load_id: String,
    /// Record provenance, carried from bronze
    pub record_id: String,
}
