//! Turns structured backend results into markup.
//!
//! [`classify`] picks the payload shape in a fixed priority order and
//! [`render_result`] renders it. Kind-specific formatters live in [`format`]
//! and the single-document view in [`detail`].

pub mod detail;
pub mod format;

use serde_json::{Map, Value};

use crate::doctype::{
    count_noun, desk_link, display_for, doctype_from_field, field_label, plural_label,
};
use crate::markdown;
use crate::markup::Markup;
use crate::session::QueryContext;

/// Maximum number of entries rendered in any list.
pub const DISPLAY_CAP: usize = 10;

/// Counts at or below this enumerate the attached names inline.
const INLINE_NAME_LIMIT: u64 = 5;

/// Array fields that never hold the result documents themselves.
const IGNORED_ARRAY_FIELDS: &[&str] = &["filters_applied", "by_territory", "by_group", "breakdown"];

const COUNT_FIELDS: &[&str] = &["total_count", "count"];
const NAME_LIST_FIELDS: &[&str] = &["document_names", "names"];
const GENERIC_DETAIL_LIMIT: usize = 5;

/// Shape of a result payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultShape<'a> {
    /// An extraction waiting for the user's confirmation.
    ExtractionPrompt { response: &'a str },
    /// Exactly one array of documents.
    List {
        field: &'a str,
        items: &'a [Value],
        total: Option<u64>,
    },
    /// Only a total, possibly with the matching names.
    Count { total: u64, names: Vec<&'a str> },
    Empty,
}

/// A rendered result plus what the renderer learned about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub markup: Markup,
    /// Documents now on screen, for follow-up questions.
    pub context: Option<QueryContext>,
    /// True when the user is expected to confirm an extraction.
    pub awaits_confirmation: bool,
}

impl Rendered {
    pub fn new(markup: Markup) -> Self {
        Self {
            markup,
            context: None,
            awaits_confirmation: false,
        }
    }

    pub fn with_context(mut self, context: QueryContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Classifies a payload. Rules are tried in priority order.
pub fn classify(payload: &Map<String, Value>) -> ResultShape<'_> {
    if payload.get("requires_action").and_then(Value::as_bool) == Some(true) {
        if let Some(response) = text_field(payload, &["response", "message"]) {
            return ResultShape::ExtractionPrompt { response };
        }
    }

    let arrays: Vec<(&str, &Vec<Value>)> = payload
        .iter()
        .filter(|(key, _)| !IGNORED_ARRAY_FIELDS.contains(&key.as_str()))
        .filter(|(key, _)| !NAME_LIST_FIELDS.contains(&key.as_str()))
        .filter_map(|(key, value)| value.as_array().map(|items| (key.as_str(), items)))
        .collect();
    if let &[(field, items)] = arrays.as_slice() {
        return ResultShape::List {
            field,
            items: items.as_slice(),
            total: count_field(payload),
        };
    }

    if let Some(total) = count_field(payload) {
        let names = NAME_LIST_FIELDS
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_array))
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        return ResultShape::Count { total, names };
    }

    ResultShape::Empty
}

/// Renders any result payload. `doctype` is used when known; otherwise it is
/// inferred from the list field.
pub fn render_result(payload: &Map<String, Value>, doctype: Option<&str>) -> Rendered {
    match classify(payload) {
        ResultShape::ExtractionPrompt { response } => Rendered {
            markup: markdown::render(response),
            context: None,
            awaits_confirmation: true,
        },
        ResultShape::List {
            field,
            items,
            total,
        } => {
            let doctype = doctype
                .map(str::to_string)
                .unwrap_or_else(|| doctype_from_field(field));
            render_list(&doctype, items, total)
        }
        ResultShape::Count { total, names } => {
            let noun = match doctype {
                Some(doctype) => count_noun(doctype, total),
                None if total == 1 => "record".to_string(),
                None => "records".to_string(),
            };
            let mut rendered = Rendered::new(count_sentence(total, &noun, &names));
            if let Some(doctype) = doctype {
                rendered = rendered.with_context(QueryContext::new(
                    doctype,
                    total,
                    names.iter().map(|name| name.to_string()).collect(),
                ));
            }
            rendered
        }
        ResultShape::Empty => Rendered::new(Markup::element_text("p", "No results found.")),
    }
}

/// Renders a capped document list with a header sentence.
pub fn render_list(doctype: &str, items: &[Value], total: Option<u64>) -> Rendered {
    let total = total.unwrap_or(items.len() as u64).max(items.len() as u64);
    let names: Vec<String> = items
        .iter()
        .filter_map(|item| item.get("name").and_then(scalar_text))
        .collect();
    let context = QueryContext::new(doctype, total, names);

    if items.is_empty() {
        let markup = Markup::element_text("p", &format!("No {} found.", plural_label(doctype)));
        return Rendered::new(markup).with_context(context);
    }

    let header = Markup::element(
        "p",
        Markup::concat([
            Markup::text("Found "),
            Markup::element_text("strong", &total.to_string()),
            Markup::text(&format!(" {}:", count_noun(doctype, total))),
        ]),
    );
    let list = capped_list(items, |item| document_item(doctype, item));

    Rendered::new(Markup::concat([header, list])).with_context(context)
}

/// `<ul>` of at most [`DISPLAY_CAP`] entries, followed by "…and N more".
pub fn capped_list<T, F>(items: &[T], mut render: F) -> Markup
where
    F: FnMut(&T) -> Markup,
{
    let shown = items.iter().take(DISPLAY_CAP).map(&mut render);
    let mut markup = Markup::element("ul", Markup::concat(shown));
    if items.len() > DISPLAY_CAP {
        markup.push(more_suffix(items.len() - DISPLAY_CAP));
    }
    markup
}

pub(crate) fn more_suffix(hidden: usize) -> Markup {
    Markup::element("p", Markup::element_text("em", &format!("…and {hidden} more")))
}

/// One `<li>` for a document, using the doctype's display table when known.
pub fn document_item(doctype: &str, item: &Value) -> Markup {
    let Some(object) = item.as_object() else {
        return Markup::element_text("li", &scalar_text(item).unwrap_or_default());
    };

    let name = object.get("name").and_then(scalar_text);
    let (title, details) = match display_for(doctype) {
        Some(display) => {
            let title = object
                .get(display.title_field)
                .and_then(scalar_text)
                .or_else(|| name.clone())
                .unwrap_or_else(|| "(unnamed)".to_string());
            let details = labeled_fields(object, display.detail_fields.iter().copied(), usize::MAX);
            (title, details)
        }
        None => {
            let title = name
                .clone()
                .or_else(|| object.values().find_map(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| "(unnamed)".to_string());
            let keys = object
                .keys()
                .map(String::as_str)
                .filter(|key| *key != "name" && !key.starts_with('_'));
            (title, labeled_fields(object, keys, GENERIC_DETAIL_LIMIT))
        }
    };

    let mut entry = match &name {
        Some(name) => Markup::link(&desk_link(doctype, name), &title),
        None => Markup::element_text("strong", &title),
    };
    if let Some(name) = name.filter(|name| *name != title) {
        entry.push_text(&format!(" ({name})"));
    }
    if !details.is_empty() {
        entry.push_text(&format!(" · {}", details.join(", ")));
    }
    Markup::element("li", entry)
}

/// The count sentence, with names enumerated for small counts.
pub fn count_sentence(total: u64, noun: &str, names: &[&str]) -> Markup {
    let mut sentence = Markup::concat([
        Markup::text("Found "),
        Markup::element_text("strong", &total.to_string()),
        Markup::text(&format!(" {noun}.")),
    ]);

    match (total, names) {
        (1, [only, ..]) => {
            sentence.push_text(" It is ");
            sentence.push(Markup::element_text("strong", only));
            sentence.push_text(".");
        }
        (2..=INLINE_NAME_LIMIT, names) if !names.is_empty() => {
            sentence.push_text(&format!(" They are: {}.", names.join(", ")));
        }
        _ => {}
    }
    Markup::element("p", sentence)
}

/// `Label: value` strings for the scalar fields among `keys`.
pub(crate) fn labeled_fields<'a, I>(object: &Map<String, Value>, keys: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .filter_map(|key| {
            object
                .get(key)
                .and_then(scalar_text)
                .map(|value| format!("{}: {value}", field_label(key)))
        })
        .take(limit)
        .collect()
}

/// Display text for a scalar value; `None` for null, empty, arrays and objects.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        _ => None,
    }
}

fn count_field(payload: &Map<String, Value>) -> Option<u64> {
    COUNT_FIELDS
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_u64))
}

fn text_field<'a>(payload: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .filter(|text| !text.trim().is_empty())
}
