//! Formatters for results whose shape is known from the action kind.

use serde_json::{Map, Value};

use super::{
    DISPLAY_CAP, Rendered, capped_list, count_sentence, labeled_fields, more_suffix, render_list,
    scalar_text,
};
use crate::action::AggregateKind;
use crate::doctype::{count_noun, desk_link, plural_label};
use crate::markup::Markup;
use crate::session::QueryContext;

/// Row identity columns for aggregate results, tried in order:
/// `(id field, doctype, title field)`.
const ROW_IDENTITIES: &[(&str, &str, &str)] = &[
    ("name", "Sales Order", "name"),
    ("customer", "Customer", "customer_name"),
    ("item_code", "Item", "item_name"),
    ("sales_person", "Sales Person", "sales_person"),
];
const ROW_DETAIL_LIMIT: usize = 5;

/// Count sentence plus territory and group breakdowns.
pub fn count_summary(doctype: &str, payload: &Map<String, Value>) -> Rendered {
    let total = payload
        .get("total_count")
        .or_else(|| payload.get("count"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let names: Vec<&str> = payload
        .get("document_names")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut markup = count_sentence(total, &count_noun(doctype, total), &names);
    for (field, label, key) in [
        ("by_territory", "By territory", "territory"),
        ("by_group", "By customer group", "customer_group"),
    ] {
        if let Some(rows) = payload.get(field).and_then(Value::as_array) {
            if !rows.is_empty() {
                markup.push(breakdown(label, rows, key));
            }
        }
    }

    let context = QueryContext::new(
        doctype,
        total,
        names.iter().map(|name| name.to_string()).collect(),
    );
    Rendered::new(markup).with_context(context)
}

fn breakdown(label: &str, rows: &[Value], key: &str) -> Markup {
    let heading = Markup::element("p", Markup::element_text("strong", label));
    let list = capped_list(rows, |row| {
        let group = row
            .get(key)
            .and_then(scalar_text)
            .unwrap_or_else(|| "(not set)".to_string());
        let count = row.get("count").and_then(scalar_text).unwrap_or_default();
        Markup::element_text("li", &format!("{group}: {count}"))
    });
    Markup::concat([heading, list])
}

/// Groups of documents sharing a name.
pub fn duplicates(doctype: &str, payload: &Map<String, Value>) -> Rendered {
    let groups = payload
        .get("duplicates")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let count = payload
        .get("duplicate_count")
        .and_then(Value::as_u64)
        .unwrap_or(groups.len() as u64);

    if count == 0 || groups.is_empty() {
        let text = format!("No duplicate {} found.", plural_label(doctype));
        return Rendered::new(Markup::element_text("p", &text));
    }

    let header = Markup::element(
        "p",
        Markup::concat([
            Markup::text("Found "),
            Markup::element_text("strong", &count.to_string()),
            Markup::text(&format!(
                " {} of duplicate {}:",
                if count == 1 { "group" } else { "groups" },
                plural_label(doctype)
            )),
        ]),
    );
    let list = capped_list(groups, |group| duplicate_group(doctype, group));
    Rendered::new(Markup::concat([header, list]))
}

fn duplicate_group(doctype: &str, group: &Value) -> Markup {
    let shared = group
        .get("customer_name")
        .or_else(|| group.get("title"))
        .and_then(scalar_text)
        .unwrap_or_else(|| "(unnamed)".to_string());
    let members = group
        .get("customers")
        .or_else(|| group.get("documents"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let count = group
        .get("count")
        .and_then(Value::as_u64)
        .unwrap_or(members.len() as u64);

    let mut entry = Markup::element_text("strong", &shared);
    entry.push_text(&format!(" ({count} records)"));
    let links: Vec<Markup> = members
        .iter()
        .filter_map(|member| member.get("name").and_then(scalar_text))
        .map(|name| Markup::link(&desk_link(doctype, &name), &name))
        .collect();
    for (index, link) in links.into_iter().enumerate() {
        entry.push_text(if index == 0 { ": " } else { ", " });
        entry.push(link);
    }
    Markup::element("li", entry)
}

/// Confirmation for a newly created document.
pub fn created(doctype: Option<&str>, payload: &Map<String, Value>) -> Rendered {
    let doctype = payload
        .get("doctype")
        .and_then(Value::as_str)
        .or(doctype)
        .unwrap_or("Document");

    let Some(name) = payload.get("name").and_then(scalar_text) else {
        let message = payload
            .get("message")
            .and_then(scalar_text)
            .unwrap_or_else(|| format!("{doctype} created."));
        return Rendered::new(Markup::element_text("p", &format!("✅ {message}")));
    };

    let mut line = Markup::text(&format!("✅ Created {doctype} "));
    line.push(Markup::link(&desk_link(doctype, &name), &name));
    line.push_text(".");
    let mut markup = Markup::element("p", line);

    let details = labeled_fields(payload, ["customer_name", "grand_total"], usize::MAX);
    if !details.is_empty() {
        markup.push(Markup::element(
            "ul",
            Markup::concat(details.iter().map(|d| Markup::element_text("li", d))),
        ));
    }
    Rendered::new(markup)
}

/// Summary of a sales order created from a confirmed extraction, or `None`
/// when the reply names no order.
pub fn extraction_confirmed(payload: &Map<String, Value>) -> Option<Rendered> {
    let name = payload.get("sales_order_name").and_then(scalar_text)?;

    let mut line = Markup::text("✅ Sales Order ");
    line.push(Markup::link(&desk_link("Sales Order", &name), &name));
    line.push_text(" created.");
    let mut markup = Markup::element("p", line);

    let customer = payload
        .get("customer_name")
        .or_else(|| payload.get("customer"))
        .and_then(scalar_text);
    let mut facts: Vec<String> = customer.map(|c| format!("Customer: {c}")).into_iter().collect();
    facts.extend(labeled_fields(payload, ["grand_total"], usize::MAX));
    if !facts.is_empty() {
        markup.push(Markup::element(
            "ul",
            Markup::concat(facts.iter().map(|fact| Markup::element_text("li", fact))),
        ));
    }
    Some(Rendered::new(markup))
}

/// Renders an aggregate query result.
pub fn aggregate(kind: AggregateKind, payload: &Map<String, Value>) -> Rendered {
    let heading = Markup::element_text("h4", kind.title());
    let body = match kind {
        AggregateKind::TotalQuantitySold => Rendered::new(total_quantity(payload)),
        AggregateKind::SalesPersonCount => {
            let total = payload
                .get("total_count")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Rendered::new(count_sentence(total, &count_noun("Sales Person", total), &[]))
        }
        AggregateKind::SalesPersonNames => Rendered::new(name_list(payload)),
        AggregateKind::SalesPersonsByGroup => Rendered::new(summary_list(
            payload,
            &["group_count", "individual_count", "total_count"],
        )),
        AggregateKind::SalesPersonSummary => sales_person_summary(payload),
        _ => result_rows(payload),
    };

    Rendered {
        markup: Markup::concat([heading, body.markup]),
        ..body
    }
}

fn total_quantity(payload: &Map<String, Value>) -> Markup {
    let item = payload
        .get("item_name")
        .or_else(|| payload.get("item_code"))
        .and_then(scalar_text)
        .unwrap_or_else(|| "item".to_string());
    let quantity = payload
        .get("total_qty")
        .and_then(scalar_text)
        .unwrap_or_else(|| "0".to_string());

    let mut line = Markup::text("Total quantity sold for ");
    line.push(Markup::element_text("strong", &item));
    line.push_text(": ");
    line.push(Markup::element_text("strong", &quantity));
    let mut markup = Markup::element("p", line);

    let mut facts = labeled_fields(payload, ["total_amount", "order_count"], usize::MAX);
    match (
        payload.get("from_date").and_then(scalar_text),
        payload.get("to_date").and_then(scalar_text),
    ) {
        (Some(from), Some(to)) => facts.push(format!("Period: {from} to {to}")),
        (Some(from), None) => facts.push(format!("Since: {from}")),
        (None, Some(to)) => facts.push(format!("Until: {to}")),
        (None, None) => {}
    }
    if !facts.is_empty() {
        markup.push(Markup::element(
            "ul",
            Markup::concat(facts.iter().map(|fact| Markup::element_text("li", fact))),
        ));
    }
    markup
}

fn name_list(payload: &Map<String, Value>) -> Markup {
    let names: Vec<String> = payload
        .get("names")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(scalar_text).collect())
        .unwrap_or_default();
    if names.is_empty() {
        return Markup::element_text("p", "No sales persons found.");
    }
    let count = payload
        .get("count")
        .and_then(Value::as_u64)
        .unwrap_or(names.len() as u64);
    let header = count_sentence(count, &count_noun("Sales Person", count), &[]);
    let list = capped_list(&names, |name| Markup::element_text("li", name));
    Markup::concat([header, list])
}

fn summary_list(object: &Map<String, Value>, keys: &[&str]) -> Markup {
    let facts = labeled_fields(object, keys.iter().copied(), usize::MAX);
    if facts.is_empty() {
        return Markup::element_text("p", "No results found.");
    }
    Markup::element(
        "ul",
        Markup::concat(facts.iter().map(|fact| Markup::element_text("li", fact))),
    )
}

fn sales_person_summary(payload: &Map<String, Value>) -> Rendered {
    let mut markup = match payload.get("summary").and_then(Value::as_object) {
        Some(summary) => {
            let keys: Vec<&str> = summary.keys().map(String::as_str).collect();
            summary_list(summary, &keys)
        }
        None => Markup::empty(),
    };

    let orders = payload
        .get("sales_orders")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if orders.is_empty() {
        if markup.is_empty() {
            markup = Markup::element_text("p", "No results found.");
        }
        return Rendered::new(markup);
    }

    let listed = render_list("Sales Order", orders, None);
    markup.push(listed.markup);
    Rendered {
        markup,
        context: listed.context,
        awaits_confirmation: false,
    }
}

fn result_rows(payload: &Map<String, Value>) -> Rendered {
    let rows = payload
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if rows.is_empty() {
        return Rendered::new(Markup::element_text("p", "No results found."));
    }

    let mut markup = Markup::element("ul", Markup::concat(rows.iter().take(DISPLAY_CAP).map(row_item)));
    if rows.len() > DISPLAY_CAP {
        markup.push(more_suffix(rows.len() - DISPLAY_CAP));
    }

    let order_names: Vec<String> = rows
        .iter()
        .filter_map(|row| row.get("name").and_then(scalar_text))
        .collect();
    let rendered = Rendered::new(markup);
    if order_names.len() == rows.len() {
        let total = payload
            .get("count")
            .and_then(Value::as_u64)
            .unwrap_or(rows.len() as u64);
        return rendered.with_context(QueryContext::new("Sales Order", total, order_names));
    }
    rendered
}

fn row_item(row: &Value) -> Markup {
    let Some(object) = row.as_object() else {
        return Markup::element_text("li", &scalar_text(row).unwrap_or_default());
    };

    let identity = ROW_IDENTITIES.iter().find_map(|(id_field, doctype, title_field)| {
        let id = object.get(*id_field).and_then(scalar_text)?;
        let title = object
            .get(*title_field)
            .and_then(scalar_text)
            .unwrap_or_else(|| id.clone());
        Some((id, *doctype, title, [*id_field, *title_field]))
    });

    let (mut entry, skip) = match identity {
        Some((id, doctype, title, skip)) => {
            let mut entry = Markup::link(&desk_link(doctype, &id), &title);
            if title != id {
                entry.push_text(&format!(" ({id})"));
            }
            (entry, skip.to_vec())
        }
        None => (Markup::empty(), Vec::new()),
    };

    let keys = object
        .keys()
        .map(String::as_str)
        .filter(|key| !skip.contains(key) && *key != "currency");
    let details: Vec<String> = labeled_fields(object, keys, ROW_DETAIL_LIMIT);
    if !details.is_empty() {
        let separator = if entry.is_empty() { "" } else { " · " };
        entry.push_text(&format!("{separator}{}", details.join(", ")));
    }
    Markup::element("li", entry)
}
