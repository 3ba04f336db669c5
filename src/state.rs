//! Incremental cursor state
//!
//! The extract stage tracks the maximum `lastEpochDateTimeUtc` seen so the
//! next run only keeps records past that point. The cursor lives in a small
//! JSON file written atomically (temp file + rename).
//!
//! Caveat carried over from the source system: if the API mutates an
//! existing record so its cursor value moves backwards, that update is
//! missed until a `--refresh` run reloads everything.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted incremental state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    /// Maximum `lastEpochDateTimeUtc` value seen across all loads
    #[serde(default)]
    pub last_epoch_datetime_utc: Option<String>,
}

impl CursorState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor if the candidate is greater.
    ///
    /// ISO8601 UTC timestamps compare correctly as strings.
    pub fn advance(&mut self, candidate: &str) {
        match &self.last_epoch_datetime_utc {
            Some(current) if current.as_str() >= candidate => {}
            _ => self.last_epoch_datetime_utc = Some(candidate.to_string()),
        }
    }
}

/// File-backed store for the cursor state
#[derive(Debug)]
pub struct StateStore {
    path: Option<PathBuf>,
}

impl StateStore {
    /// Create a store backed by the given file
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Create a store with no persistence (every run starts fresh)
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// Load the persisted state; a missing file yields an empty state
    pub fn load(&self) -> Result<CursorState> {
        let Some(path) = &self.path else {
            return Ok(CursorState::new());
        };
        if !path.exists() {
            return Ok(CursorState::new());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::state(format!("Failed to parse state file: {e}")))
    }

    /// Persist the state atomically (write temp file, then rename)
    pub fn save(&self, state: &CursorState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?;

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, &contents)
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;
        std::fs::rename(&temp_path, path)
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_keeps_maximum() {
        let mut state = CursorState::new();
        state.advance("2024-01-02T00:00:00Z");
        state.advance("2024-01-01T00:00:00Z");
        assert_eq!(
            state.last_epoch_datetime_utc.as_deref(),
            Some("2024-01-02T00:00:00Z")
        );

        state.advance("2024-01-03T12:00:00Z");
        assert_eq!(
            state.last_epoch_datetime_utc.as_deref(),
            Some("2024-01-03T12:00:00Z")
        );
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::at(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), CursorState::new());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::at(dir.path().join("state.json"));

        let mut state = CursorState::new();
        state.advance("2024-03-15T23:45:00Z");
        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn test_in_memory_store_never_persists() {
        let store = StateStore::in_memory();
        let mut state = CursorState::new();
        state.advance("2024-03-15T23:45:00Z");
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), CursorState::new());
    }
}
