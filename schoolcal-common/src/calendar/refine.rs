//! Payload refinement into the canonical calendar document shape.
//!
//! Stored payloads arrive in several incompatible shapes. Dispatch is a
//! tagged union decided by one ordered function, so the precedence between
//! shapes lives in exactly one place.

use serde_json::{json, Map, Value};
use thiserror::Error;

use super::extract::extract_json;
use super::validate::{validate_calendar, SchemaError};

/// Why a record payload could not be refined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefineError {
    #[error("Data is NULL")]
    NullData,
    #[error("Could not extract JSON")]
    ExtractFailed,
    #[error("Invalid format: {0}")]
    InvalidFormat(#[from] SchemaError),
}

/// The recognized payload shapes, in dispatch precedence order.
enum PayloadShape<'a> {
    /// Already carries `school_name` and `terms`: use it directly
    Canonical(&'a Value),
    /// Scraper output wrapped as `{"text": "..."}`
    TextWrapped(&'a Value),
    /// Scraper output wrapped as `{"raw": "..."}`
    RawWrapped(&'a Value),
    /// A single key whose value is a string: treat the string as scraper text
    SingleKeyString(&'a str),
    Unrecognized,
}

fn dispatch(payload: &Value) -> PayloadShape<'_> {
    let Some(obj) = payload.as_object() else {
        return PayloadShape::Unrecognized;
    };
    if obj.contains_key("school_name") && obj.contains_key("terms") {
        return PayloadShape::Canonical(payload);
    }
    if let Some(text) = obj.get("text") {
        return PayloadShape::TextWrapped(text);
    }
    if let Some(raw) = obj.get("raw") {
        return PayloadShape::RawWrapped(raw);
    }
    if obj.len() == 1 {
        if let Some(s) = obj.values().next().and_then(Value::as_str) {
            return PayloadShape::SingleKeyString(s);
        }
    }
    PayloadShape::Unrecognized
}

/// Refine a raw record payload into the canonical calendar document.
///
/// `None` models a NULL payload in storage; a stored JSON `null` is treated
/// the same way. On success the returned document is fully normalized: no
/// extraneous keys, no missing optional fields.
pub fn refine(payload: Option<&Value>) -> Result<Value, RefineError> {
    let payload = match payload {
        None | Some(Value::Null) => return Err(RefineError::NullData),
        Some(value) => value,
    };

    let candidate = match dispatch(payload) {
        PayloadShape::Canonical(value) => value.clone(),
        PayloadShape::TextWrapped(wrapped) | PayloadShape::RawWrapped(wrapped) => wrapped
            .as_str()
            .and_then(extract_json)
            .ok_or(RefineError::ExtractFailed)?,
        PayloadShape::SingleKeyString(text) => {
            extract_json(text).ok_or(RefineError::ExtractFailed)?
        }
        PayloadShape::Unrecognized => return Err(RefineError::ExtractFailed),
    };

    validate_calendar(&candidate)?;
    Ok(normalize(&candidate))
}

/// Rebuild a validated candidate in the exact canonical shape.
///
/// Required string fields default to `""` if absent (the candidate already
/// passed validation, so this is defensive only); `end_date` and `time`
/// pass through unchanged, with absence normalized to null. Values are
/// copied verbatim, never coerced.
fn normalize(candidate: &Value) -> Value {
    let field = |obj: &Value, key: &str| obj.get(key).cloned().unwrap_or_else(|| json!(""));
    let passthrough = |obj: &Value, key: &str| obj.get(key).cloned().unwrap_or(Value::Null);

    let terms: Vec<Value> = candidate
        .get("terms")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|term| {
            let events: Vec<Value> = term
                .get("events")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .map(|event| {
                    let mut out = Map::new();
                    out.insert("start_date".into(), field(event, "start_date"));
                    out.insert("end_date".into(), passthrough(event, "end_date"));
                    out.insert("time".into(), passthrough(event, "time"));
                    out.insert("event_text".into(), field(event, "event_text"));
                    Value::Object(out)
                })
                .collect();

            let mut out = Map::new();
            out.insert("academic_year".into(), field(term, "academic_year"));
            out.insert("term_name".into(), field(term, "term_name"));
            out.insert("events".into(), Value::Array(events));
            Value::Object(out)
        })
        .collect();

    let mut doc = Map::new();
    doc.insert("school_name".into(), field(candidate, "school_name"));
    doc.insert("source_url".into(), field(candidate, "source_url"));
    doc.insert("terms".into(), Value::Array(terms));
    Value::Object(doc)
}
