//! Renders the assistant's markdown dialect into [`Markup`].
//!
//! Rendering is a fixed sequence of passes over escaped text. Regions that a
//! pass converts are swapped for private-use placeholders so later passes
//! cannot touch them; placeholders are restored at the very end.
//!
//! The renderer is deterministic but not idempotent. Apply it once.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::markup::{Markup, escape};

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:[A-Za-z0-9_+\-]*[ \t]*\n)?(.*?)```").unwrap());
static CODE_LIST_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*[*\-+][ \t]+`([^`\n]+)`[ \t]*$").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").unwrap());
static LEAD_IN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:such as|including|like|for example|i need|at minimum)\b").unwrap()
});
static LIST_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\s,;]*(?:(?:and|or)[\s,;]*)?$").unwrap());
static TRAILING_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s\p{P}]*$").unwrap());
static BOLD_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").unwrap());
static BOLD_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_\n]+?)__").unwrap());
static ITALIC_STARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|\s)\*([^*\s](?:[^*\n]*[^*\s])?)\*(\s|$)").unwrap());
static ITALIC_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|\s)_([^_\s](?:[^_\n]*[^_\s])?)_(\s|$)").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[*\-+][ \t]+(.*)$").unwrap());
static ORDERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)][ \t]+(.*)$").unwrap());

/// Converts assistant text into markup.
pub fn render(text: &str) -> Markup {
    let mut fragments = Fragments::default();

    let text: String = text
        .replace("\r\n", "\n")
        .chars()
        .filter(|ch| *ch != OPEN && *ch != CLOSE)
        .collect();
    let text = escape(&text);
    let text = fragments.fenced_code(&text);
    let text = fragments.code_list_lines(&text);
    let text = fragments.inline_code(&text);
    let text = fragments.lead_in_lists(&text);
    let text = emphasis(&text);
    let html = assemble_blocks(&text, &fragments);

    Markup::from_trusted(fragments.restore(&html))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentKind {
    /// Stands alone between blocks.
    Block,
    /// A finished `<li>` element.
    ListItem,
    /// Sits inside a line of text.
    Inline,
}

#[derive(Debug)]
struct Fragment {
    kind: FragmentKind,
    html: String,
}

#[derive(Debug, Default)]
struct Fragments {
    items: Vec<Fragment>,
}

impl Fragments {
    fn stash(&mut self, kind: FragmentKind, html: String) -> String {
        let index = self.items.len();
        self.items.push(Fragment { kind, html });
        format!("{OPEN}{index}{CLOSE}")
    }

    fn kind_at(&self, index: &str) -> Option<FragmentKind> {
        let index: usize = index.parse().ok()?;
        self.items.get(index).map(|fragment| fragment.kind)
    }

    /// Kind of the placeholder when `line` is exactly one placeholder.
    fn sole_placeholder(&self, line: &str) -> Option<FragmentKind> {
        let caps = PLACEHOLDER.captures(line)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != line.len() {
            return None;
        }
        self.kind_at(&caps[1])
    }

    fn fenced_code(&mut self, text: &str) -> String {
        FENCED_CODE
            .replace_all(text, |caps: &Captures| {
                let inner = caps[1].trim_end_matches('\n');
                let token = self.stash(
                    FragmentKind::Block,
                    format!("<pre><code>{inner}</code></pre>"),
                );
                format!("\n{token}\n")
            })
            .into_owned()
    }

    fn code_list_lines(&mut self, text: &str) -> String {
        CODE_LIST_LINE
            .replace_all(text, |caps: &Captures| {
                self.stash(
                    FragmentKind::ListItem,
                    format!("<li><code>{}</code></li>", &caps[1]),
                )
            })
            .into_owned()
    }

    fn inline_code(&mut self, text: &str) -> String {
        INLINE_CODE
            .replace_all(text, |caps: &Captures| {
                self.stash(FragmentKind::Inline, format!("<code>{}</code>", &caps[1]))
            })
            .into_owned()
    }

    /// "fields such as `a`, `b` and `c`." becomes a label plus a list.
    fn lead_in_lists(&mut self, text: &str) -> String {
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| self.lead_in_line(line).unwrap_or_else(|| line.to_string()))
            .collect();
        lines.join("\n")
    }

    fn lead_in_line(&mut self, line: &str) -> Option<String> {
        let tokens: Vec<(usize, usize)> = PLACEHOLDER
            .captures_iter(line)
            .filter(|caps| self.kind_at(&caps[1]) == Some(FragmentKind::Inline))
            .filter_map(|caps| caps.get(0).map(|m| (m.start(), m.end())))
            .collect();
        if tokens.len() < 2 {
            return None;
        }

        let prefix = &line[..tokens[0].0];
        if !LEAD_IN.is_match(prefix) {
            return None;
        }
        let separated = tokens
            .windows(2)
            .all(|pair| LIST_SEPARATOR.is_match(&line[pair[0].1..pair[1].0]));
        let last_end = tokens[tokens.len() - 1].1;
        if !separated || !TRAILING_PUNCTUATION.is_match(&line[last_end..]) {
            return None;
        }

        let label = prefix.trim_end().trim_end_matches(':').trim_end();
        let mut out = format!("\n{label}:");
        for (start, end) in tokens {
            let item = self.stash(
                FragmentKind::ListItem,
                format!("<li>{}</li>", &line[start..end]),
            );
            out.push('\n');
            out.push_str(&item);
        }
        out.push('\n');
        Some(out)
    }

    fn restore(&self, text: &str) -> String {
        let mut current = text.to_string();
        for _ in 0..=self.items.len() {
            if !current.contains(OPEN) {
                break;
            }
            current = PLACEHOLDER
                .replace_all(&current, |caps: &Captures| {
                    caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| self.items.get(index))
                        .map(|fragment| fragment.html.clone())
                        .unwrap_or_default()
                })
                .into_owned();
        }
        current
    }
}

fn emphasis(text: &str) -> String {
    let text = BOLD_STARS.replace_all(text, "<strong>$1</strong>");
    let mut text = BOLD_UNDERSCORES
        .replace_all(&text, "<strong>$1</strong>")
        .into_owned();

    // Bounding whitespace is consumed by a match, so adjacent spans need
    // another pass.
    loop {
        let next = ITALIC_STARS.replace_all(&text, "${1}<em>${2}</em>${3}");
        let next = ITALIC_UNDERSCORES
            .replace_all(&next, "${1}<em>${2}</em>${3}")
            .into_owned();
        if next == text {
            return text;
        }
        text = next;
    }
}

enum CurrentBlock {
    None,
    Paragraph(Vec<String>),
    List { ordered: bool, items: Vec<String> },
}

struct BlockAssembler {
    current: CurrentBlock,
    out: String,
}

impl BlockAssembler {
    fn new() -> Self {
        Self {
            current: CurrentBlock::None,
            out: String::new(),
        }
    }

    fn close(&mut self) {
        match std::mem::replace(&mut self.current, CurrentBlock::None) {
            CurrentBlock::None => {}
            CurrentBlock::Paragraph(lines) => {
                self.out.push_str("<p>");
                self.out.push_str(&lines.join(" "));
                self.out.push_str("</p>");
            }
            CurrentBlock::List { ordered, items } => {
                let tag = if ordered { "ol" } else { "ul" };
                self.out.push_str(&format!("<{tag}>{}</{tag}>", items.concat()));
            }
        }
    }

    fn paragraph_line(&mut self, line: &str) {
        if let CurrentBlock::Paragraph(lines) = &mut self.current {
            lines.push(line.to_string());
            return;
        }
        self.close();
        self.current = CurrentBlock::Paragraph(vec![line.to_string()]);
    }

    fn list_item(&mut self, ordered: bool, item: String) {
        if let CurrentBlock::List {
            ordered: open_ordered,
            items,
        } = &mut self.current
        {
            if *open_ordered == ordered {
                items.push(item);
                return;
            }
        }
        self.close();
        self.current = CurrentBlock::List {
            ordered,
            items: vec![item],
        };
    }

    fn standalone(&mut self, html: &str) {
        self.close();
        self.out.push_str(html);
    }

    fn finish(mut self) -> String {
        self.close();
        self.out
    }
}

fn assemble_blocks(text: &str, fragments: &Fragments) -> String {
    let mut blocks = BlockAssembler::new();

    for raw in text.split('\n') {
        let line = raw.trim();
        if line.is_empty() {
            blocks.close();
            continue;
        }

        match fragments.sole_placeholder(line) {
            Some(FragmentKind::Block) => {
                blocks.standalone(line);
                continue;
            }
            Some(FragmentKind::ListItem) => {
                blocks.list_item(false, line.to_string());
                continue;
            }
            Some(FragmentKind::Inline) | None => {}
        }

        if let Some(caps) = BULLET.captures(line) {
            blocks.list_item(false, format!("<li>{}</li>", caps[1].trim()));
        } else if let Some(caps) = ORDERED.captures(line) {
            blocks.list_item(true, format!("<li>{}</li>", caps[1].trim()));
        } else {
            blocks.paragraph_line(line);
        }
    }

    blocks.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(text: &str) -> String {
        render(text).into_string()
    }

    #[test]
    fn test_plain_text_is_one_paragraph() {
        assert_eq!(html("Hello world & friends"), "<p>Hello world &amp; friends</p>");
        assert_eq!(html("first line\nsecond line"), "<p>first line second line</p>");
    }

    #[test]
    fn test_code_list_line() {
        assert_eq!(html("* `qty`"), "<ul><li><code>qty</code></li></ul>");
    }

    #[test]
    fn test_fenced_code_is_not_wrapped_in_paragraph() {
        assert_eq!(html("```const x=1```"), "<pre><code>const x=1</code></pre>");
    }

    #[test]
    fn test_fenced_code_with_language_tag() {
        assert_eq!(
            html("Run this:\n```rust\nlet a = b < c;\n```\nDone."),
            "<p>Run this:</p><pre><code>let a = b &lt; c;</code></pre><p>Done.</p>"
        );
    }

    #[test]
    fn test_code_content_is_protected() {
        assert_eq!(html("Try `**x**` now"), "<p>Try <code>**x**</code> now</p>");
    }

    #[test]
    fn test_lead_in_becomes_labeled_list() {
        assert_eq!(
            html("Please include fields such as `customer_name`, `email_id` and `mobile_no`."),
            "<p>Please include fields such as:</p><ul><li><code>customer_name</code></li>\
             <li><code>email_id</code></li><li><code>mobile_no</code></li></ul>"
        );
    }

    #[test]
    fn test_lead_in_with_prose_between_codes_stays_inline() {
        assert_eq!(
            html("Filters like `a` behave differently from `b` here"),
            "<p>Filters like <code>a</code> behave differently from <code>b</code> here</p>"
        );
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            html("This is **bold**, __strong__ and *soft* or _gentle_ text"),
            "<p>This is <strong>bold</strong>, <strong>strong</strong> and <em>soft</em> or <em>gentle</em> text</p>"
        );
    }

    #[test]
    fn test_snake_case_is_not_italic() {
        assert_eq!(html("use customer_name_field"), "<p>use customer_name_field</p>");
    }

    #[test]
    fn test_lists_and_paragraphs() {
        assert_eq!(
            html("Intro\n- a\n- b\nOutro"),
            "<p>Intro</p><ul><li>a</li><li>b</li></ul><p>Outro</p>"
        );
        assert_eq!(html("1. one\n2. two"), "<ol><li>one</li><li>two</li></ol>");
    }

    #[test]
    fn test_list_kind_change_closes_list() {
        assert_eq!(
            html("- a\n1. b"),
            "<ul><li>a</li></ul><ol><li>b</li></ol>"
        );
    }

    #[test]
    fn test_markup_in_input_is_escaped() {
        assert_eq!(html("<b>x</b>"), "<p>&lt;b&gt;x&lt;/b&gt;</p>");
    }

    #[test]
    fn test_sentinels_in_input_are_dropped() {
        assert_eq!(html("a\u{E000}0\u{E001}b"), "<p>a0b</p>");
    }

    #[test]
    fn test_blank_line_separates_paragraphs() {
        assert_eq!(html("one\n\ntwo"), "<p>one</p><p>two</p>");
    }
}
