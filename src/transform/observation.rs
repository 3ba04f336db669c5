//! Observation shape mapping
//!
//! Projects a resolved bronze row into the fixed observation schema. Absent
//! data is always represented as a structurally valid empty value — a null
//! `reference` inside a present object, a `[null]` array — never by
//! omitting the field.

use super::identity::{observation_id, SOURCE_TYPE};
use super::resolver::ResolvedReferences;
use crate::error::Result;
use crate::store::{BronzeRow, ObservationRecord};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

/// Constant status for daily statistic observations
pub const STATUS_FINAL: &str = "final";

/// Coding system of the fixed observation code
pub const CODE_SYSTEM: &str = "http://loinc.org";

/// Fixed observation code: number of steps in 24 hours
pub const CODE_CODE: &str = "41950-7";

/// Display text of the fixed observation code
pub const CODE_DISPLAY: &str = "Number of steps in 24 hour Measured";

/// Human-readable code text
pub const CODE_TEXT: &str = "Daily step count";

/// Coding system of the fixed category
pub const CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/observation-category";

/// Fixed category code
pub const CATEGORY_CODE: &str = "activity";

/// Display text of the fixed category
pub const CATEGORY_DISPLAY: &str = "Activity";

/// A `{reference, type}` pair; `reference` is null on a resolution miss
#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    /// Target reference, e.g. `Patient/<uuid>`; null when unresolved
    pub reference: Option<String>,
    /// Target resource type
    #[serde(rename = "type")]
    pub reference_type: &'static str,
}

impl Reference {
    fn new(reference_type: &'static str, id: Option<&str>) -> Self {
        Self {
            reference: id.map(|id| format!("{reference_type}/{id}")),
            reference_type,
        }
    }
}

/// A single coding entry
#[derive(Debug, Clone, Serialize)]
pub struct Coding {
    /// Coding system URI
    pub system: &'static str,
    /// Code within the system
    pub code: &'static str,
    /// Display text
    pub display: &'static str,
}

/// A coded value: codings plus optional text
#[derive(Debug, Clone, Serialize)]
pub struct CodeableConcept {
    /// Codings
    pub coding: Vec<Coding>,
    /// Human-readable text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'static str>,
}

/// Day-granularity temporal bounds derived from a bronze date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBounds {
    /// Event instant (start of day)
    pub effective_datetime: String,
    /// `T00:00:00.000` on the calendar day
    pub period_start: String,
    /// `T23:59:59.999` on the same calendar day
    pub period_end: String,
}

/// Normalize a bronze date string to day-granularity bounds.
///
/// Returns `None` for anything that is not a plain `YYYY-MM-DD` calendar
/// date; the caller nulls the temporal fields and keeps the row.
pub fn day_bounds(date: &str) -> Option<DayBounds> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let day = day.format("%Y-%m-%d");
    let period_start = format!("{day}T00:00:00.000");
    Some(DayBounds {
        effective_datetime: period_start.clone(),
        period_start,
        period_end: format!("{day}T23:59:59.999"),
    })
}

/// Map one resolved bronze row into the observation record shape
pub fn map_observation(
    row: &BronzeRow,
    refs: &ResolvedReferences,
    bounds: Option<&DayBounds>,
) -> Result<ObservationRecord> {
    let subject = Reference::new("Patient", refs.platform_patient_uuid.as_deref());
    let device = Reference::new("Device", refs.device_id.as_deref());
    let study_environment = Reference::new(
        "ResearchStudy",
        refs.platform_study_environment_uuid.as_deref(),
    );

    let code = CodeableConcept {
        coding: vec![Coding {
            system: CODE_SYSTEM,
            code: CODE_CODE,
            display: CODE_DISPLAY,
        }],
        text: Some(CODE_TEXT),
    };
    let category = CodeableConcept {
        coding: vec![Coding {
            system: CATEGORY_SYSTEM,
            code: CATEGORY_CODE,
            display: CATEGORY_DISPLAY,
        }],
        text: None,
    };

    // Unpopulated reference fields hold an explicit null element, keeping
    // the schema stable across rows
    let null_array = json!([null]).to_string();

    let event_time = bounds.map(|b| b.effective_datetime.as_str());
    let id = observation_id(
        refs.platform_patient_uuid.as_deref(),
        refs.device_id.as_deref(),
        event_time,
        Some(SOURCE_TYPE),
    );

    Ok(ObservationRecord {
        observation_id: id,
        status: STATUS_FINAL.to_string(),
        code: serde_json::to_string(&code)?,
        category: serde_json::to_string(&category)?,
        subject: serde_json::to_string(&subject)?,
        device: serde_json::to_string(&device)?,
        study_environment: serde_json::to_string(&study_environment)?,
        part_of: null_array.clone(),
        derived_from: null_array.clone(),
        body_site: null_array.clone(),
        interpretation: null_array,
        effective_datetime: bounds.map(|b| b.effective_datetime.clone()),
        effective_period_start: bounds.map(|b| b.period_start.clone()),
        effective_period_end: bounds.map(|b| b.period_end.clone()),
        bronze_id: row.id,
        study_id: row.study_id,
        subject_id: row.subject_id,
        site_id: row.site_id,
        load_id: row.load_id.clone(),
        record_id: row.record_id.clone(),
    })
}
