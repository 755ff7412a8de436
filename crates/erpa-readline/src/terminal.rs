//! Markup to terminal text.
//!
//! Block elements become line breaks, list items get bullets (or numbers
//! inside `<ol>`), links keep their label and every other tag is dropped.

use erpa_core::markup::{Markup, strip_tags};
use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)[^>]*>").unwrap());

enum ListKind {
    Bullet,
    Numbered(usize),
}

/// Renders markup as plain lines for the terminal.
pub fn to_terminal_text(markup: &Markup) -> String {
    let html = markup.as_str();
    let mut out = String::new();
    let mut lists: Vec<ListKind> = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&strip_tags(&html[last..whole.start()]));
        last = whole.end();

        let closing = &caps[1] == "/";
        match (caps[2].to_ascii_lowercase().as_str(), closing) {
            ("ul", false) => lists.push(ListKind::Bullet),
            ("ol", false) => lists.push(ListKind::Numbered(0)),
            ("ul" | "ol", true) => {
                lists.pop();
                end_line(&mut out);
            }
            ("li", false) => {
                end_line(&mut out);
                let depth = lists.len().max(1);
                out.push_str(&"  ".repeat(depth));
                match lists.last_mut() {
                    Some(ListKind::Numbered(n)) => {
                        *n += 1;
                        out.push_str(&format!("{n}. "));
                    }
                    _ => out.push_str("• "),
                }
            }
            ("p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "pre", true) => {
                end_line(&mut out);
                out.push('\n');
            }
            ("p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "pre", false) => end_line(&mut out),
            ("br", _) => out.push('\n'),
            _ => {}
        }
    }
    out.push_str(&strip_tags(&html[last..]));

    out.trim_end().to_string()
}

fn end_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erpa_core::markdown;

    #[test]
    fn test_paragraphs_are_separated() {
        let markup = markdown::render("first\n\nsecond");
        assert_eq!(to_terminal_text(&markup), "first\n\nsecond");
    }

    #[test]
    fn test_lists_get_markers() {
        let markup = markdown::render("- one\n- two");
        assert_eq!(to_terminal_text(&markup), "  • one\n  • two");

        let markup = markdown::render("1. first\n2. second");
        assert_eq!(to_terminal_text(&markup), "  1. first\n  2. second");
    }

    #[test]
    fn test_links_keep_label_and_entities_decode() {
        let markup = Markup::concat([
            Markup::text("Tom & Jerry: "),
            Markup::link("/app/customer/CUST-1", "Acme <Ltd>"),
        ]);
        assert_eq!(to_terminal_text(&markup), "Tom & Jerry: Acme <Ltd>");
    }

    #[test]
    fn test_heading_then_list() {
        let markup = Markup::concat([
            Markup::element_text("h4", "Most sold items"),
            Markup::element("ul", Markup::element_text("li", "Widget")),
        ]);
        assert_eq!(to_terminal_text(&markup), "Most sold items\n\n  • Widget");
    }
}
