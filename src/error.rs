//! Error types for the CentrePoint pipeline
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Extraction-stage errors (auth, API requests) abort the run. Transform-stage
//! per-row problems (unparseable dates, lookup misses) are handled inline with
//! null values and never surface as an `Error`.

use thiserror::Error;

/// The main error type for the pipeline
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ============================================================================
    // HTTP / API Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("API request failed (page {page}): HTTP {status}: {body}")]
    ApiRequestFailed {
        page: u32,
        status: u16,
        body: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Errors
    // ============================================================================
    #[error("Malformed record: {message}")]
    MalformedRecord { message: String },

    #[error("Warehouse error: {message}")]
    Store { message: String },

    #[error("Transform error: {message}")]
    Transform { message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing-configuration error naming the absent key
    pub fn config_missing(key: impl Into<String>) -> Self {
        Self::ConfigMissing { key: key.into() }
    }

    /// Create an invalid-value error
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a malformed-record error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }

    /// Create a warehouse error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a transform error
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Store {
            message: e.to_string(),
        }
    }
}

/// Result type alias for the pipeline
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::config_missing("CENTERPOINT_USERNAME");
        assert_eq!(
            err.to_string(),
            "Missing required configuration: CENTERPOINT_USERNAME"
        );

        let err = Error::auth("bad credentials");
        assert_eq!(err.to_string(), "Authentication failed: bad credentials");
    }

    #[test]
    fn test_api_request_failed_display() {
        let err = Error::ApiRequestFailed {
            page: 3,
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API request failed (page 3): HTTP 500: boom"
        );
    }

    #[test]
    fn test_config_missing_names_the_key() {
        let err = Error::config_missing("from_date");
        assert!(err.to_string().contains("from_date"));
    }
}
