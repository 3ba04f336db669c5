//! Deterministic observation identifier
//!
//! The identifier is a pure function of its four inputs: the same logical
//! event always hashes to the same id, which is what makes the silver
//! rebuild idempotent. Missing components are treated as empty strings, not
//! as failures, so two records both missing a device collapse to the same
//! segment of the hash input. That ambiguity is accepted.

use sha2::{Digest, Sha256};

/// Source type segment for records produced by this pipeline
pub const SOURCE_TYPE: &str = "centrepoint_daily_statistics";

/// Derive the content-addressed observation identifier.
///
/// `hex(sha256(patient + "|" + device + "|" + event_time + "|" + source))`
/// with every absent component coalesced to the empty string.
pub fn observation_id(
    platform_patient_uuid: Option<&str>,
    device_id: Option<&str>,
    event_time: Option<&str>,
    source_type: Option<&str>,
) -> String {
    let input = format!(
        "{}|{}|{}|{}",
        platform_patient_uuid.unwrap_or(""),
        device_id.unwrap_or(""),
        event_time.unwrap_or(""),
        source_type.unwrap_or(""),
    );
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_inputs_identical_id() {
        let a = observation_id(
            Some("patient-1"),
            Some("device-1"),
            Some("2024-03-15T00:00:00.000"),
            Some(SOURCE_TYPE),
        );
        let b = observation_id(
            Some("patient-1"),
            Some("device-1"),
            Some("2024-03-15T00:00:00.000"),
            Some(SOURCE_TYPE),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_differing_input_changes_id() {
        let base = observation_id(Some("p"), Some("d"), Some("t"), Some("s"));
        assert_ne!(base, observation_id(Some("p2"), Some("d"), Some("t"), Some("s")));
        assert_ne!(base, observation_id(Some("p"), Some("d2"), Some("t"), Some("s")));
        assert_ne!(base, observation_id(Some("p"), Some("d"), Some("t2"), Some("s")));
        assert_ne!(base, observation_id(Some("p"), Some("d"), Some("t"), Some("s2")));
    }

    #[test]
    fn test_null_collapses_to_empty_string() {
        // None and Some("") occupy the same hash segment
        let with_none = observation_id(Some("p"), None, Some("t"), Some("s"));
        let with_empty = observation_id(Some("p"), Some(""), Some("t"), Some("s"));
        assert_eq!(with_none, with_empty);
    }

    #[test]
    fn test_fixed_length_printable() {
        let id = observation_id(None, None, None, None);
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_separator_prevents_trivial_collisions() {
        // "ab"+"c" must not collide with "a"+"bc"
        let a = observation_id(Some("ab"), Some("c"), None, None);
        let b = observation_id(Some("a"), Some("bc"), None, None);
        assert_ne!(a, b);
    }
}
