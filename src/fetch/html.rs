// src/fetch/html.rs
// =============================================================================
// The default LinkExtractor, built on the `scraper` crate.
//
// It reports the href of every <a> element exactly as written: relative,
// empty, fragment-only and mailto: values all come through. Deciding what
// is crawlable is the scope filter's job, not ours.
// =============================================================================

use scraper::{Html, Selector};
use std::sync::LazyLock;

use super::LinkExtractor;

// "a" is a constant, known-valid selector, so parsing it cannot fail
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("static selector"));

/// Extracts anchor hrefs from HTML documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, body: &[u8]) -> Vec<String> {
        // Pages are not always valid UTF-8; keep what we can read
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        document
            .select(&ANCHOR)
            .map(|element| element.value().attr("href").unwrap_or("").to_string())
            .collect()
    }
}
