//! Anti-forgery token discovery.
//!
//! A token supplied by the host always wins. Otherwise the token is scraped
//! once from a desk page, which carries it either as a `<meta>` tag or as a
//! `csrf_token` script assignment.

use once_cell::sync::Lazy;
use regex::Regex;

pub const CSRF_HEADER: &str = "X-Frappe-CSRF-Token";

static META_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta\s+name=["']csrf_token["']\s+content=["']([^"']*)["']"#).unwrap()
});

static SCRIPT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"csrf_token\s*=\s*["']([^"']+)["']"#).unwrap());

/// Extracts the token from a page body. Placeholder values such as
/// `{{ csrf_token }}` and `None` are ignored.
pub fn scrape_token(page: &str) -> Option<String> {
    [&*META_TOKEN, &*SCRIPT_TOKEN]
        .iter()
        .filter_map(|pattern| pattern.captures(page))
        .filter_map(|captures| captures.get(1))
        .map(|token| token.as_str().trim())
        .find(|token| is_usable(token))
        .map(str::to_string)
}

/// Picks the host-provided token when usable, else the scraped one.
pub fn resolve_token(configured: Option<&str>, scraped: Option<String>) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|token| is_usable(token))
        .map(str::to_string)
        .or(scraped)
}

fn is_usable(token: &str) -> bool {
    !token.is_empty() && token != "None" && !token.contains("{{")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_meta_tag() {
        let page = r#"<head><meta name="csrf_token" content="abc123"></head>"#;
        assert_eq!(scrape_token(page).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_scrape_script_assignment() {
        let page = r#"<script>frappe.csrf_token = "tok-9";</script>"#;
        assert_eq!(scrape_token(page).as_deref(), Some("tok-9"));
    }

    #[test]
    fn test_placeholders_are_ignored() {
        let page = r#"<meta name="csrf_token" content="{{ csrf_token }}">"#;
        assert_eq!(scrape_token(page), None);
        assert_eq!(scrape_token("<html></html>"), None);
    }

    #[test]
    fn test_configured_token_wins() {
        assert_eq!(
            resolve_token(Some("host"), Some("page".into())).as_deref(),
            Some("host")
        );
        assert_eq!(resolve_token(Some("  "), Some("page".into())).as_deref(), Some("page"));
        assert_eq!(resolve_token(None, None), None);
    }
}
