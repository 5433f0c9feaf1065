//! Pure classification of record payloads for reporting.
//!
//! Admin summaries, CSV export and the invalid-data endpoint all bucket
//! records through this one function, so they can never disagree about a
//! record's status. Classification never mutates anything.

use serde_json::Value;
use std::fmt;

/// Reporting bucket for a record's payload.
///
/// Buckets are mutually exclusive and exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataStatus {
    /// Payload is NULL/absent
    Null,
    /// Payload is an object with zero keys
    Empty,
    /// Payload is neither a calendar document nor empty
    Invalid,
    /// Calendar-shaped but with an empty terms sequence
    RefinedEmptyTerms,
    /// Calendar-shaped with at least one term: usable data
    Refined,
}

impl DataStatus {
    /// True when the payload counts as usable calendar data.
    pub fn is_usable(self) -> bool {
        self == DataStatus::Refined
    }
}

impl fmt::Display for DataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DataStatus::Null => "NULL",
            DataStatus::Empty => "EMPTY",
            DataStatus::Invalid => "INVALID",
            DataStatus::RefinedEmptyTerms => "REFINED_EMPTY_TERMS",
            DataStatus::Refined => "REFINED",
        };
        f.write_str(label)
    }
}

/// Classify a record payload. Pure: same payload, same bucket, no side
/// effects.
pub fn classify(payload: Option<&Value>) -> DataStatus {
    let payload = match payload {
        None => return DataStatus::Null,
        Some(Value::Null) => return DataStatus::Null,
        Some(value) => value,
    };

    let Some(obj) = payload.as_object() else {
        return DataStatus::Invalid;
    };
    if obj.is_empty() {
        return DataStatus::Empty;
    }

    if obj.contains_key("school_name") && obj.contains_key("terms") {
        match obj.get("terms").and_then(Value::as_array) {
            Some(terms) if !terms.is_empty() => DataStatus::Refined,
            _ => DataStatus::RefinedEmptyTerms,
        }
    } else {
        DataStatus::Invalid
    }
}
