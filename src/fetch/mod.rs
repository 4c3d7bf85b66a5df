// src/fetch/mod.rs
// =============================================================================
// The crawl engine's two collaborators.
//
// - Fetcher: turns a URL into the page body (or a transport error)
// - LinkExtractor: turns a page body into the raw href strings it contains
//
// The engine only talks to these traits, so tests can swap in fixtures
// and the real HTTP/HTML implementations stay out of the core loop.
// =============================================================================

mod html;
mod http;

use async_trait::async_trait;

use crate::error::FetchError;

pub use html::HtmlLinkExtractor;
pub use http::{FetchConfig, HttpFetcher};

/// Downloads a page body.
///
/// Timeouts are the implementation's job; the engine never cancels a fetch.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Pulls raw hrefs out of a page body.
///
/// Results may contain empty, relative or malformed entries; scope
/// filtering happens downstream.
pub trait LinkExtractor: Send + Sync + 'static {
    fn extract(&self, body: &[u8]) -> Vec<String>;
}
