//! Shared input validation helpers

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// 8-4-4-4-12 hex with hyphens and version 1-5; any variant nibble
static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("UUID pattern is valid")
});

/// Check whether a string has the canonical UUID shape
pub fn is_valid_uuid(value: &str) -> bool {
    UUID_PATTERN.is_match(value)
}

/// Parse a canonical UUID string; braced, URN and unhyphenated forms are rejected
pub fn parse_uuid(value: &str) -> Option<Uuid> {
    if !is_valid_uuid(value) {
        return None;
    }
    Uuid::parse_str(value).ok()
}
