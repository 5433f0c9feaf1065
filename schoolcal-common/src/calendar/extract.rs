//! JSON extraction from free-text scraper output.
//!
//! The external extraction agent is asked for pure JSON but does not
//! reliably comply: payloads arrive as clean JSON, JSON inside markdown
//! fences, or JSON buried in prose. Extraction is maximally permissive;
//! the validator downstream stays strict.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// ```json ... ``` or ``` ... ``` around a brace-delimited object
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced block pattern")
});

/// Brace-delimited substring, tolerating one level of nested braces
static BRACE_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("brace object pattern")
});

/// Pull a candidate JSON value out of arbitrary text.
///
/// Tried in order, returning the first success:
/// 1. the whole text parses as JSON (returned as-is, any shape);
/// 2. the first markdown-fenced block parses;
/// 3. some brace-delimited substring parses AND carries both `school_name`
///    and `terms` keys.
pub fn extract_json(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    if let Some(caps) = FENCED_BLOCK.captures(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&caps[1]) {
            return Some(value);
        }
    }

    for candidate in BRACE_OBJECT.find_iter(text) {
        let Ok(value) = serde_json::from_str::<Value>(candidate.as_str()) else {
            continue;
        };
        if value.get("school_name").is_some() && value.get("terms").is_some() {
            return Some(value);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direct_json_returned_as_is() {
        let text = r#"{"school_name": "A", "terms": []}"#;
        assert_eq!(extract_json(text), Some(json!({"school_name": "A", "terms": []})));
    }

    #[test]
    fn direct_parse_accepts_any_shape() {
        assert_eq!(extract_json("[1, 2, 3]"), Some(json!([1, 2, 3])));
        assert_eq!(extract_json("42"), Some(json!(42)));
    }

    #[test]
    fn fenced_json_block_is_unwrapped() {
        let text = "```json\n{\"school_name\":\"A\",\"terms\":[]}\n```";
        assert_eq!(extract_json(text), Some(json!({"school_name": "A", "terms": []})));
    }

    #[test]
    fn fence_without_language_tag_also_works() {
        let text = "Here you go:\n```\n{\"school_name\":\"A\",\"terms\":[]}\n```\nDone.";
        assert_eq!(extract_json(text), Some(json!({"school_name": "A", "terms": []})));
    }

    #[test]
    fn loose_braces_require_calendar_keys() {
        let text = "prefix {\"other\": 1} middle {\"school_name\":\"A\",\"terms\":[]} suffix";
        assert_eq!(extract_json(text), Some(json!({"school_name": "A", "terms": []})));
    }

    #[test]
    fn loose_object_without_calendar_keys_is_rejected() {
        assert_eq!(extract_json("text {\"foo\": \"bar\"} text"), None);
    }

    #[test]
    fn nested_braces_survive_the_scan() {
        let text = "noise {\"school_name\":\"A\",\"terms\":[],\"extra\":{\"k\":1}} noise";
        let value = extract_json(text).expect("should extract");
        assert_eq!(value["school_name"], "A");
        assert_eq!(value["extra"]["k"], 1);
    }

    #[test]
    fn garbage_yields_none_without_panicking() {
        assert_eq!(extract_json("hello world"), None);
        assert_eq!(extract_json(""), None);
        assert_eq!(extract_json("{{{{"), None);
        assert_eq!(extract_json("``` not json ```"), None);
    }
}
