//! Document-type knowledge: display tables and naming helpers.

/// How documents of one doctype are shown in result lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoctypeDisplay {
    pub doctype: &'static str,
    /// Field used as the row title; falls back to `name`.
    pub title_field: &'static str,
    /// Desk route segment, e.g. `customer` for `/app/customer/<name>`.
    pub route: &'static str,
    /// Secondary fields shown after the title when present.
    pub detail_fields: &'static [&'static str],
}

const DISPLAY_TABLE: &[DoctypeDisplay] = &[
    DoctypeDisplay {
        doctype: "Customer",
        title_field: "customer_name",
        route: "customer",
        detail_fields: &["mobile_no", "email_id", "territory", "customer_group"],
    },
    DoctypeDisplay {
        doctype: "Item",
        title_field: "item_name",
        route: "item",
        detail_fields: &["item_code", "item_group", "stock_uom", "standard_rate"],
    },
    DoctypeDisplay {
        doctype: "Sales Order",
        title_field: "name",
        route: "sales-order",
        detail_fields: &["customer_name", "transaction_date", "grand_total", "status"],
    },
];

/// Looks up the display table entry, case-insensitively.
pub fn display_for(doctype: &str) -> Option<&'static DoctypeDisplay> {
    DISPLAY_TABLE
        .iter()
        .find(|entry| entry.doctype.eq_ignore_ascii_case(doctype.trim()))
}

/// Desk link for a document.
pub fn desk_link(doctype: &str, name: &str) -> String {
    let route = match display_for(doctype) {
        Some(entry) => entry.route.to_string(),
        None => doctype.trim().to_lowercase().replace(' ', "-"),
    };
    format!("/app/{route}/{name}")
}

/// Envelope key a doctype is returned under (`Sales Order` → `sales_order`).
pub fn payload_key(doctype: &str) -> String {
    doctype.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Lower-case plural used in sentences (`Customer` → `customers`).
pub fn plural_label(doctype: &str) -> String {
    let lower = doctype.trim().to_lowercase();
    if lower.is_empty() {
        return "documents".to_string();
    }
    pluralize(&lower)
}

/// Lower-case noun agreeing with `count` (`1 customer`, `2 customers`).
pub fn count_noun(doctype: &str, count: u64) -> String {
    if count == 1 && !doctype.trim().is_empty() {
        doctype.trim().to_lowercase()
    } else {
        plural_label(doctype)
    }
}

fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh")
    {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// Infers a doctype from a plural payload field (`sales_orders` → `Sales Order`).
pub fn doctype_from_field(field: &str) -> String {
    let singular = singularize(field.trim());
    singular
        .split(['_', ' '])
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["ches", "shes", "sses", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if !stem.ends_with('s') {
            return stem.to_string();
        }
    }
    word.to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human label for a field name (`customer_group` → `Customer Group`).
pub fn field_label(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}
