//! Single-document lookup and rendering.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::{DISPLAY_CAP, labeled_fields, more_suffix, scalar_text};
use crate::doctype::{desk_link, display_for, field_label, payload_key};
use crate::markup::Markup;

/// Bookkeeping fields that are never shown in the detail view.
const HIDDEN_FIELDS: &[&str] = &[
    "doctype",
    "name",
    "owner",
    "modified_by",
    "creation",
    "modified",
    "docstatus",
    "idx",
    "parent",
    "parentfield",
    "parenttype",
];
const CHILD_ROW_FIELDS: usize = 4;

static FULL_DETAILS_QUESTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:complete|full|all|detailed|every)\b.*\b(?:info|information|details?|data|fields)\b|\beverything\b",
    )
    .unwrap()
});

/// Where a document was found in a details payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Under the doctype's own key, e.g. `customer`.
    TypedKey,
    /// Under the generic `document` key.
    Generic,
    /// Legacy fallback: a related-looking key holding an object. Only used
    /// for `Sales Order`, whose older payloads used inconsistent keys.
    CompatibilityScan(String),
}

/// Finds the document object in an unwrapped details payload.
pub fn locate_document<'a>(
    payload: &'a Map<String, Value>,
    doctype: &str,
) -> Option<(&'a Map<String, Value>, DocumentSource)> {
    if let Some(document) = payload.get(&payload_key(doctype)).and_then(Value::as_object) {
        return Some((document, DocumentSource::TypedKey));
    }
    if let Some(document) = payload.get("document").and_then(Value::as_object) {
        return Some((document, DocumentSource::Generic));
    }
    if doctype.eq_ignore_ascii_case("Sales Order") {
        return sales_order_compatibility_scan(payload);
    }
    None
}

fn sales_order_compatibility_scan(
    payload: &Map<String, Value>,
) -> Option<(&Map<String, Value>, DocumentSource)> {
    payload.iter().find_map(|(key, value)| {
        let lower = key.to_lowercase();
        let related = lower.contains("sales_order")
            || lower.contains("salesorder")
            || lower.contains("order");
        let document = value.as_object().filter(|doc| doc.contains_key("name"))?;
        related.then(|| (document, DocumentSource::CompatibilityScan(key.clone())))
    })
}

/// True when a follow-up question asks for the whole record rather than a
/// specific fact.
pub fn wants_full_details(question: &str) -> bool {
    FULL_DETAILS_QUESTION.is_match(question)
}

/// Full detail view of one document.
pub fn detail_view(doctype: &str, document: &Map<String, Value>) -> Markup {
    let name = document.get("name").and_then(scalar_text);
    let title = display_for(doctype)
        .and_then(|display| document.get(display.title_field))
        .and_then(scalar_text)
        .or_else(|| name.clone())
        .unwrap_or_else(|| doctype.to_string());

    let mut markup = Markup::element_text("h4", &format!("📄 {doctype}: {title}"));
    if let Some(name) = &name {
        let mut line = Markup::text("Open ");
        line.push(Markup::link(&desk_link(doctype, name), name));
        markup.push(Markup::element("p", line));
    }

    let mut fields = Vec::new();
    let mut tables = Vec::new();
    for (key, value) in document {
        if HIDDEN_FIELDS.contains(&key.as_str()) || key.starts_with('_') {
            continue;
        }
        match value {
            Value::Array(rows) if rows.iter().any(Value::is_object) => {
                tables.push(child_table(key, rows));
            }
            Value::Array(values) => {
                let joined: Vec<String> = values.iter().filter_map(scalar_text).collect();
                if !joined.is_empty() {
                    fields.push(field_item(key, &joined.join(", ")));
                }
            }
            Value::Object(nested) => {
                let keys = nested.keys().map(String::as_str);
                let parts = labeled_fields(nested, keys, usize::MAX);
                if !parts.is_empty() {
                    fields.push(field_item(key, &parts.join(", ")));
                }
            }
            scalar => {
                if let Some(text) = scalar_text(scalar) {
                    fields.push(field_item(key, &text));
                }
            }
        }
    }

    if !fields.is_empty() {
        markup.push(Markup::element("ul", Markup::concat(fields)));
    }
    for table in tables {
        markup.push(table);
    }
    markup
}

fn field_item(key: &str, value: &str) -> Markup {
    let mut item = Markup::element_text("strong", &format!("{}:", field_label(key)));
    item.push_text(&format!(" {value}"));
    Markup::element("li", item)
}

fn child_table(key: &str, rows: &[Value]) -> Markup {
    let heading = Markup::element(
        "p",
        Markup::concat([
            Markup::element_text("strong", &field_label(key)),
            Markup::text(&format!(" ({})", rows.len())),
        ]),
    );

    let items = rows.iter().take(DISPLAY_CAP).filter_map(Value::as_object).map(|row| {
        let keys = row
            .keys()
            .map(String::as_str)
            .filter(|key| !HIDDEN_FIELDS.contains(key) && !key.starts_with('_'));
        let parts = labeled_fields(row, keys, CHILD_ROW_FIELDS);
        Markup::element_text("li", &parts.join(", "))
    });
    let mut markup = Markup::concat([heading, Markup::element("ol", Markup::concat(items))]);
    if rows.len() > DISPLAY_CAP {
        markup.push(more_suffix(rows.len() - DISPLAY_CAP));
    }
    markup
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_typed_key_wins() {
        let payload = object(json!({
            "customer": {"name": "CUST-1"},
            "document": {"name": "OTHER"}
        }));
        let (document, source) = locate_document(&payload, "Customer").unwrap();
        assert_eq!(document["name"], json!("CUST-1"));
        assert_eq!(source, DocumentSource::TypedKey);
    }

    #[test]
    fn test_generic_document_key() {
        let payload = object(json!({"document": {"name": "ITEM-1"}}));
        let (_, source) = locate_document(&payload, "Item").unwrap();
        assert_eq!(source, DocumentSource::Generic);
    }

    #[test]
    fn test_sales_order_compatibility_scan() {
        let payload = object(json!({"status": "success", "order_data": {"name": "SO-1"}}));
        let (document, source) = locate_document(&payload, "Sales Order").unwrap();
        assert_eq!(document["name"], json!("SO-1"));
        assert_eq!(source, DocumentSource::CompatibilityScan("order_data".into()));
    }

    #[test]
    fn test_scan_only_for_sales_order() {
        let payload = object(json!({"order_data": {"name": "X"}}));
        assert!(locate_document(&payload, "Customer").is_none());
    }

    #[test]
    fn test_full_details_questions() {
        assert!(wants_full_details("show me the complete information"));
        assert!(wants_full_details("Give me all details"));
        assert!(wants_full_details("tell me everything about it"));
        assert!(!wants_full_details("what is the email address?"));
        assert!(!wants_full_details("who is the sales person"));
    }

    #[test]
    fn test_detail_view_renders_fields_and_tables() {
        let document = object(json!({
            "name": "SO-1",
            "customer_name": "Acme",
            "docstatus": 1,
            "grand_total": 500,
            "notes": null,
            "items": [
                {"item_code": "WID-1", "qty": 2, "idx": 1},
                {"item_code": "WID-2", "qty": 3, "idx": 2}
            ]
        }));
        let html = detail_view("Sales Order", &document).into_string();

        assert!(html.starts_with("<h4>📄 Sales Order: SO-1</h4>"));
        assert!(html.contains("<a href=\"/app/sales-order/SO-1\">SO-1</a>"));
        assert!(html.contains("<li><strong>Customer Name:</strong> Acme</li>"));
        assert!(html.contains("<li><strong>Grand Total:</strong> 500</li>"));
        assert!(!html.contains("Docstatus"));
        assert!(!html.contains("Notes"));
        assert!(html.contains("<p><strong>Items</strong> (2)</p><ol><li>Item Code: WID-1, Qty: 2</li>"));
    }
}
