//! Renderable markup fragments.
//!
//! [`Markup`] is the only type that crosses into the display surface. Every
//! public way of building one escapes untrusted text, so a value of this type
//! never carries raw, unescaped input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z!][^>]*>").unwrap());
static NUMERIC_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(x[0-9A-Fa-f]+|[0-9]+);").unwrap());

/// A fragment of semantic markup (`p`, `ul`, `ol`, `li`, `pre`, `code`,
/// `strong`, `em`, `a`, `div`, `h4`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Markup(String);

impl Markup {
    /// An empty fragment.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Escaped text.
    pub fn text(text: &str) -> Self {
        Self(escape(text))
    }

    /// Wraps `inner` in a tag.
    pub fn element(tag: &'static str, inner: Markup) -> Self {
        Self(format!("<{tag}>{}</{tag}>", inner.0))
    }

    /// Shorthand for an element around escaped text.
    pub fn element_text(tag: &'static str, text: &str) -> Self {
        Self::element(tag, Self::text(text))
    }

    /// A hyperlink. Both the target and the label are escaped.
    pub fn link(href: &str, label: &str) -> Self {
        Self(format!("<a href=\"{}\">{}</a>", escape(href), escape(label)))
    }

    /// Concatenates fragments in order.
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Markup>,
    {
        Self(parts.into_iter().map(|part| part.0).collect())
    }

    /// Appends another fragment.
    pub fn push(&mut self, other: Markup) {
        self.0.push_str(&other.0);
    }

    /// Appends escaped text.
    pub fn push_text(&mut self, text: &str) {
        self.0.push_str(&escape(text));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Text content with tags removed and entities decoded.
    pub fn to_plain_text(&self) -> String {
        strip_tags(&self.0)
    }

    /// Wraps a string that was assembled from already-escaped pieces.
    pub(crate) fn from_trusted(markup: String) -> Self {
        Self(markup)
    }
}

impl std::fmt::Display for Markup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escapes the five markup-significant characters.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Returns true when the text contains something that looks like a tag.
pub fn contains_tags(text: &str) -> bool {
    TAG.is_match(text)
}

/// Removes tags and decodes entities, leaving the text content.
pub fn strip_tags(text: &str) -> String {
    let without_tags = TAG.replace_all(text, "");
    decode_entities(&without_tags)
}

fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped() {
        let markup = Markup::text("<script>alert('x')</script> & co");
        assert_eq!(
            markup.as_str(),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; co"
        );
    }

    #[test]
    fn test_link_escapes_href_and_label() {
        let markup = Markup::link("/app/customer/A\"B", "A<B>");
        assert_eq!(
            markup.as_str(),
            "<a href=\"/app/customer/A&quot;B\">A&lt;B&gt;</a>"
        );
    }

    #[test]
    fn test_strip_tags_decodes_entities() {
        assert_eq!(
            strip_tags("<p>Fish &amp; chips &lt;3</p><br/>done&#33;"),
            "Fish & chips <3done!"
        );
    }

    #[test]
    fn test_strip_tags_leaves_comparisons() {
        assert!(!contains_tags("a < b and c > d"));
        assert_eq!(strip_tags("a < b"), "a < b");
    }

    #[test]
    fn test_plain_text_round() {
        let markup = Markup::element("p", Markup::text("Tom & Jerry"));
        assert_eq!(markup.to_plain_text(), "Tom & Jerry");
    }
}
