//! Request size limits.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Default cap on records returned by a single `/get`.
pub const DEFAULT_MAX_OBJECTS_IN_GET: usize = 500;

/// Default cap on items in a single `/set`.
pub const DEFAULT_MAX_OBJECTS_IN_SET: usize = 500;

/// Upper bound for `maxChanges`; also used when the client sends none.
pub const DEFAULT_MAX_CHANGES: usize = 1024;

/// Per-account request limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub max_objects_in_get: usize,
    pub max_objects_in_set: usize,
    pub max_changes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_objects_in_get: DEFAULT_MAX_OBJECTS_IN_GET,
            max_objects_in_set: DEFAULT_MAX_OBJECTS_IN_SET,
            max_changes: DEFAULT_MAX_CHANGES,
        }
    }
}

impl Limits {
    /// Effective page size for a `/changes` call.
    ///
    /// Integers in `1..=max_changes` are honoured; anything else, including
    /// no value, negatives, fractions and integers past `u64`, falls back to
    /// `max_changes`.
    pub fn page_size(&self, requested: Option<&Number>) -> usize {
        match requested.and_then(Number::as_u64) {
            Some(n) if n >= 1 && n <= self.max_changes as u64 => n as usize,
            _ => self.max_changes,
        }
    }
}
