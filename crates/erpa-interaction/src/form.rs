//! Form encoding of request parameters.

use serde_json::{Map, Value};

/// Encodes parameters as form fields. Strings go as-is, numbers and
/// booleans as their literal text, objects and arrays as JSON. Nulls are
/// dropped.
pub fn encode_params(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| encode_value(value).map(|encoded| (key.clone(), encoded)))
        .collect()
}

fn encode_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_params() {
        let params = json!({
            "doctype": "Customer",
            "limit": 20,
            "execute": true,
            "filters": {"territory": "India"},
            "order_by": null
        });
        let encoded = encode_params(params.as_object().unwrap());
        assert_eq!(
            encoded,
            vec![
                ("doctype".to_string(), "Customer".to_string()),
                ("execute".to_string(), "true".to_string()),
                ("filters".to_string(), r#"{"territory":"India"}"#.to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }
}
