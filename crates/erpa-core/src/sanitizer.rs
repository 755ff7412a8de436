//! Cleans assistant text before it is rendered.
//!
//! The assistant sometimes leaks the directive it attached to a reply into
//! the prose itself. When a descriptor is present every such fragment is
//! removed, and if nothing readable survives the action's status phrase is
//! shown instead.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::action::ActionDescriptor;
use crate::markup;

/// Anything shorter than this after cleaning is treated as residue.
pub const MIN_DISPLAY_CHARS: usize = 10;

static BRACE_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").unwrap());
static KEYWORD_RESIDUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)"?\b(?:suggested_action|execute_immediately|confidence|action|filters)\b"?\s*[:=]\s*(?:"[^"\n]*"|[\w.%$\-]+)?"#,
    )
    .unwrap()
});
static STRUCTURAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[{}"\[\]]"#).unwrap());
static ISOLATED_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|[ \t])[:,]+(?:[ \t]|$)").unwrap());
static FENCE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+\-]*").unwrap());
static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static PUNCTUATION_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s\p{P}\p{S}]*$").unwrap());
static FILLER_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[\s\p{P}]*(?:(?:sure|ok|okay|here|yes|alright|certainly|absolutely|of course|got it|great|done|one moment|let me check)[\s\p{P}]*)+$",
    )
    .unwrap()
});

/// Produces display-safe text. Never fails.
pub fn sanitize(raw: &str, action: Option<&ActionDescriptor>) -> String {
    let mut text = if markup::contains_tags(raw) {
        markup::strip_tags(raw)
    } else {
        raw.to_string()
    };

    let Some(descriptor) = action else {
        return text.replace("\r\n", "\n").trim().to_string();
    };

    text = strip_directives(&text);
    if is_residue(&text) {
        return descriptor.action.status_phrase();
    }
    text
}

/// Removes directive fragments, keyword residue and stray punctuation.
pub fn strip_directives(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = BRACE_FRAGMENT.replace_all(&current, "").into_owned();
        if next == current {
            break;
        }
        current = next;
    }

    let current = KEYWORD_RESIDUE.replace_all(&current, "");
    let current = FENCE_MARKER.replace_all(&current, "");
    let current = STRUCTURAL.replace_all(&current, "");
    let current = ISOLATED_SEPARATORS.replace_all(&current, "$1");
    normalize_whitespace(&current)
}

/// True when the text is too short or carries no real content.
pub fn is_residue(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.chars().count() < MIN_DISPLAY_CHARS
        || PUNCTUATION_ONLY.is_match(trimmed)
        || FILLER_ONLY.is_match(trimmed)
}

fn normalize_whitespace(text: &str) -> String {
    let lines: Vec<String> = text
        .replace("\r\n", "\n")
        .split('\n')
        .map(|line| HORIZONTAL_WS.replace_all(line, " ").trim().to_string())
        .collect();
    let joined = lines.join("\n");
    BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string()
}
