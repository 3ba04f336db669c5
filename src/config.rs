//! Pipeline configuration
//!
//! Run parameters come from a YAML file (optionally overridden by CLI flags);
//! API credentials come from the environment only and are never written to
//! disk. Everything is validated before the first network call — a missing
//! value is a fatal `ConfigMissing` error that names the absent key.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the OAuth2 client id
pub const ENV_CLIENT_ID: &str = "CENTERPOINT_USERNAME";

/// Environment variable holding the OAuth2 client secret
pub const ENV_CLIENT_SECRET: &str = "CENTERPOINT_PASSWORD";

/// Default CentrePoint API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.actigraphcorp.com";

/// Default CentrePoint token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://auth.actigraphcorp.com/connect/token";

/// OAuth2 scope required for the daily statistics endpoint.
///
/// All four permission strings are required; a narrower scope is accepted by
/// the token endpoint but yields 401/403 on the data calls.
pub const REQUIRED_SCOPE: &str = "CentrePoint DataAccess Analytics DataRetrieval";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// API endpoints and HTTP settings
    #[serde(default)]
    pub api: ApiConfig,

    /// What to extract (study, subject, date range)
    #[serde(default)]
    pub source: SourceConfig,

    /// Where bronze and silver tables live
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Path of the incremental cursor state file (optional; no file means
    /// every run starts from the beginning of the date range)
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

impl PipelineConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Validate everything the extract stage needs, before any network call
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        if self.api.base_url.is_empty() {
            return Err(Error::config_missing("api.base_url"));
        }
        if self.api.token_url.is_empty() {
            return Err(Error::config_missing("api.token_url"));
        }
        Ok(())
    }
}

// ============================================================================
// API Config
// ============================================================================

/// API endpoints and HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for data requests
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// OAuth2 token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// OAuth2 scope sent with the client-credentials grant
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            scope: default_scope(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_scope() -> String {
    REQUIRED_SCOPE.to_string()
}

fn default_timeout() -> u64 {
    30
}

// ============================================================================
// Source Config
// ============================================================================

/// What to extract: study, subject, and the date window
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// CentrePoint study id
    pub study_id: Option<u64>,

    /// CentrePoint subject id
    pub subject_id: Option<u64>,

    /// Start of the date window, ISO8601 calendar date (no time component)
    pub from_date: Option<String>,

    /// End of the date window, ISO8601 calendar date (no time component)
    pub to_date: Option<String>,

    /// Optional GUID of the settings used to create the daily statistics
    #[serde(default)]
    pub daily_statistics_setting_id: Option<String>,

    /// Page size requested from the API
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_page_limit() -> u32 {
    100
}

impl SourceConfig {
    /// Check required parameters and date formats
    pub fn validate(&self) -> Result<()> {
        if self.study_id.is_none() {
            return Err(Error::config_missing("source.study_id"));
        }
        if self.subject_id.is_none() {
            return Err(Error::config_missing("source.subject_id"));
        }
        let from = self
            .from_date
            .as_deref()
            .ok_or_else(|| Error::config_missing("source.from_date"))?;
        let to = self
            .to_date
            .as_deref()
            .ok_or_else(|| Error::config_missing("source.to_date"))?;

        let from = parse_calendar_date("source.from_date", from)?;
        let to = parse_calendar_date("source.to_date", to)?;
        if from > to {
            return Err(Error::invalid_value(
                "source.from_date",
                format!("{from} is after to_date {to}"),
            ));
        }
        if self.page_limit == 0 {
            return Err(Error::invalid_value("source.page_limit", "must be > 0"));
        }
        Ok(())
    }

    /// Study id after validation
    pub fn study_id(&self) -> u64 {
        self.study_id.unwrap_or_default()
    }

    /// Subject id after validation
    pub fn subject_id(&self) -> u64 {
        self.subject_id.unwrap_or_default()
    }
}

/// Parse an ISO8601 calendar date, rejecting any time-of-day component
pub fn parse_calendar_date(key: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::invalid_value(key, format!("expected YYYY-MM-DD, got '{value}': {e}")))
}

// ============================================================================
// Warehouse Config
// ============================================================================

/// Where the bronze and silver tables live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// DuckDB database file path
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Bronze table name (raw landed records)
    #[serde(default = "default_bronze_table")]
    pub bronze_table: String,

    /// Silver table name (derived observations)
    #[serde(default = "default_silver_table")]
    pub silver_table: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bronze_table: default_bronze_table(),
            silver_table: default_silver_table(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("centrepoint.duckdb")
}

fn default_bronze_table() -> String {
    "daily_statistics".to_string()
}

fn default_silver_table() -> String {
    "observations".to_string()
}

// ============================================================================
// Credentials
// ============================================================================

/// OAuth2 client credentials, sourced from the environment only
#[derive(Debug, Clone)]
pub struct Credentials {
    /// OAuth2 client id
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
}

impl Credentials {
    /// Read credentials from `CENTERPOINT_USERNAME` / `CENTERPOINT_PASSWORD`
    pub fn from_env() -> Result<Self> {
        let client_id = read_env(ENV_CLIENT_ID)?;
        let client_secret = read_env(ENV_CLIENT_SECRET)?;
        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

fn read_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::config_missing(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_source() -> SourceConfig {
        SourceConfig {
            study_id: Some(2775),
            subject_id: Some(22518),
            from_date: Some("2024-01-01".to_string()),
            to_date: Some("2024-01-31".to_string()),
            daily_statistics_setting_id: None,
            page_limit: 100,
        }
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.api.scope, REQUIRED_SCOPE);
        assert_eq!(config.warehouse.bronze_table, "daily_statistics");
        assert_eq!(config.warehouse.silver_table, "observations");
    }

    #[test]
    fn test_source_validate_ok() {
        assert!(valid_source().validate().is_ok());
    }

    #[test]
    fn test_missing_study_id_names_the_key() {
        let mut source = valid_source();
        source.study_id = None;
        let err = source.validate().unwrap_err();
        assert!(err.to_string().contains("source.study_id"));
    }

    #[test]
    fn test_missing_dates_name_the_key() {
        let mut source = valid_source();
        source.from_date = None;
        let err = source.validate().unwrap_err();
        assert!(err.to_string().contains("source.from_date"));

        let mut source = valid_source();
        source.to_date = None;
        let err = source.validate().unwrap_err();
        assert!(err.to_string().contains("source.to_date"));
    }

    #[test]
    fn test_date_with_time_component_rejected() {
        let mut source = valid_source();
        source.from_date = Some("2024-01-01T00:00:00".to_string());
        assert!(source.validate().is_err());
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let mut source = valid_source();
        source.from_date = Some("2024-02-01".to_string());
        source.to_date = Some("2024-01-01".to_string());
        assert!(source.validate().is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r"
source:
  study_id: 2775
  subject_id: 22518
  from_date: '2024-01-01'
  to_date: '2024-01-31'
warehouse:
  database_path: /tmp/test.duckdb
";
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.source.study_id, Some(2775));
        assert_eq!(
            config.warehouse.database_path,
            PathBuf::from("/tmp/test.duckdb")
        );
        // Unspecified sections fall back to defaults
        assert_eq!(config.api.scope, REQUIRED_SCOPE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credentials_missing_env() {
        std::env::remove_var(ENV_CLIENT_ID);
        std::env::remove_var(ENV_CLIENT_SECRET);
        let err = Credentials::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_CLIENT_ID));
    }
}
