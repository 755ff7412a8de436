//! Recovers a directive embedded in reply text.
//!
//! Used when the reply carries no separate `suggested_action` field.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").unwrap());

/// Returns the directive object found in `text`, if any.
///
/// A fenced JSON block wins over a bare brace span. Either
/// `{"suggested_action": {...}}` or a bare `{"action": ...}` is accepted.
pub fn extract_embedded(text: &str) -> Option<Value> {
    let candidate = FENCED_JSON
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .or_else(|| outermost_braces(text))?;

    let parsed: Value = serde_json::from_str(candidate).ok()?;
    directive_in(parsed)
}

fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn directive_in(parsed: Value) -> Option<Value> {
    let Value::Object(mut object) = parsed else {
        return None;
    };
    match object.remove("suggested_action") {
        Some(action @ Value::Object(_)) => Some(action),
        Some(_) => None,
        None if object.contains_key("action") => Some(Value::Object(object)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_block_with_wrapper() {
        let text = "Counting now.\n```json\n{\"suggested_action\": {\"action\": \"count_documents\", \"execute_immediately\": true}}\n```";
        assert_eq!(
            extract_embedded(text),
            Some(json!({"action": "count_documents", "execute_immediately": true}))
        );
    }

    #[test]
    fn test_bare_braces() {
        let text = r#"Sure! {"action":"search_customer","query":"Acme"}"#;
        assert_eq!(
            extract_embedded(text),
            Some(json!({"action": "search_customer", "query": "Acme"}))
        );
    }

    #[test]
    fn test_plain_text_has_no_directive() {
        assert_eq!(extract_embedded("Hello, how can I help?"), None);
        assert_eq!(extract_embedded("Use {name} as a placeholder"), None);
    }

    #[test]
    fn test_object_without_action_ignored() {
        assert_eq!(extract_embedded(r#"{"customer": "Acme"}"#), None);
    }
}
