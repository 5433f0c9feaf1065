//! Strict schema validation for candidate calendar documents.
//!
//! Checks run in a fixed order and short-circuit at the first failure;
//! callers surface that single reason, never an aggregate. The exact reason
//! strings are load-bearing: batch reports, the refinement sweep and the
//! admin tooling all display them verbatim.

use serde_json::Value;
use thiserror::Error;

/// Why a candidate document failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Not a dictionary")]
    NotDictionary,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("terms must be a list")]
    TermsNotList,
    #[error("terms array is empty (no terms data)")]
    EmptyTerms,
    #[error("Term must be a dictionary")]
    TermNotDictionary,
    #[error("Term missing required fields")]
    TermMissingFields,
    #[error("Events must be a list")]
    EventsNotList,
    #[error("Event must be a dictionary")]
    EventNotDictionary,
    #[error("Event missing required field: {0}")]
    EventMissingField(&'static str),
}

/// Validate a candidate document against the canonical calendar shape.
///
/// Presence and list-ness are checked; field value types beyond that are
/// not (the normalizer copies values through unchanged).
pub fn validate_calendar(doc: &Value) -> Result<(), SchemaError> {
    let Some(obj) = doc.as_object() else {
        return Err(SchemaError::NotDictionary);
    };

    for field in ["school_name", "source_url", "terms"] {
        if !obj.contains_key(field) {
            return Err(SchemaError::MissingField(field));
        }
    }

    let Some(terms) = obj["terms"].as_array() else {
        return Err(SchemaError::TermsNotList);
    };
    if terms.is_empty() {
        return Err(SchemaError::EmptyTerms);
    }

    for term in terms {
        let Some(term_obj) = term.as_object() else {
            return Err(SchemaError::TermNotDictionary);
        };
        if !term_obj.contains_key("academic_year")
            || !term_obj.contains_key("term_name")
            || !term_obj.contains_key("events")
        {
            return Err(SchemaError::TermMissingFields);
        }
        let Some(events) = term_obj["events"].as_array() else {
            return Err(SchemaError::EventsNotList);
        };

        for event in events {
            let Some(event_obj) = event.as_object() else {
                return Err(SchemaError::EventNotDictionary);
            };
            for field in ["start_date", "event_text"] {
                if !event_obj.contains_key(field) {
                    return Err(SchemaError::EventMissingField(field));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_is_not_a_dictionary() {
        assert_eq!(validate_calendar(&json!([])), Err(SchemaError::NotDictionary));
        assert_eq!(validate_calendar(&json!("x")), Err(SchemaError::NotDictionary));
        assert_eq!(validate_calendar(&json!(null)), Err(SchemaError::NotDictionary));
    }

    #[test]
    fn first_missing_field_wins_in_declared_order() {
        let err = validate_calendar(&json!({})).unwrap_err();
        assert_eq!(err, SchemaError::MissingField("school_name"));
        assert_eq!(err.to_string(), "Missing required field: school_name");

        let err = validate_calendar(&json!({"school_name": "A"})).unwrap_err();
        assert_eq!(err, SchemaError::MissingField("source_url"));

        let err = validate_calendar(&json!({"school_name": "A", "source_url": "u"})).unwrap_err();
        assert_eq!(err, SchemaError::MissingField("terms"));
    }

    #[test]
    fn terms_must_be_a_list() {
        let doc = json!({"school_name": "A", "source_url": "u", "terms": "nope"});
        let err = validate_calendar(&doc).unwrap_err();
        assert_eq!(err, SchemaError::TermsNotList);
        assert_eq!(err.to_string(), "terms must be a list");
    }

    #[test]
    fn empty_terms_is_a_specific_failure() {
        let doc = json!({"school_name": "A", "source_url": "u", "terms": []});
        let err = validate_calendar(&doc).unwrap_err();
        assert_eq!(err, SchemaError::EmptyTerms);
        assert_eq!(err.to_string(), "terms array is empty (no terms data)");
    }

    #[test]
    fn term_shape_is_enforced() {
        let doc = json!({"school_name": "A", "source_url": "u", "terms": ["x"]});
        assert_eq!(validate_calendar(&doc), Err(SchemaError::TermNotDictionary));

        let doc = json!({"school_name": "A", "source_url": "u",
            "terms": [{"academic_year": "2024-2025", "term_name": "Autumn"}]});
        assert_eq!(validate_calendar(&doc), Err(SchemaError::TermMissingFields));

        let doc = json!({"school_name": "A", "source_url": "u",
            "terms": [{"academic_year": "2024-2025", "term_name": "Autumn", "events": 3}]});
        assert_eq!(validate_calendar(&doc), Err(SchemaError::EventsNotList));
    }

    #[test]
    fn event_shape_is_enforced() {
        let doc = json!({"school_name": "A", "source_url": "u",
            "terms": [{"academic_year": "2024-2025", "term_name": "Autumn", "events": ["x"]}]});
        assert_eq!(validate_calendar(&doc), Err(SchemaError::EventNotDictionary));

        let doc = json!({"school_name": "A", "source_url": "u",
            "terms": [{"academic_year": "2024-2025", "term_name": "Autumn",
                       "events": [{"event_text": "t"}]}]});
        let err = validate_calendar(&doc).unwrap_err();
        assert_eq!(err, SchemaError::EventMissingField("start_date"));
        assert_eq!(err.to_string(), "Event missing required field: start_date");

        let doc = json!({"school_name": "A", "source_url": "u",
            "terms": [{"academic_year": "2024-2025", "term_name": "Autumn",
                       "events": [{"start_date": "2024-09-01"}]}]});
        assert_eq!(validate_calendar(&doc), Err(SchemaError::EventMissingField("event_text")));
    }

    #[test]
    fn complete_document_is_valid() {
        let doc = json!({
            "school_name": "A",
            "source_url": "u",
            "terms": [{
                "academic_year": "2024-2025",
                "term_name": "Autumn",
                "events": [{"start_date": "2024-09-01", "event_text": "Start of term"}]
            }]
        });
        assert_eq!(validate_calendar(&doc), Ok(()));
    }

    #[test]
    fn optional_event_fields_are_not_required() {
        // end_date and time may be absent or null; only presence of the two
        // required fields is checked
        let doc = json!({
            "school_name": "A",
            "source_url": "u",
            "terms": [{
                "academic_year": "2024-2025",
                "term_name": "Summer",
                "events": [{"start_date": "2025-07-22", "end_date": null,
                            "time": null, "event_text": "Last day"}]
            }]
        });
        assert_eq!(validate_calendar(&doc), Ok(()));
    }
}
