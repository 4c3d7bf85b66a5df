// src/lib.rs
// =============================================================================
// site-crawler: collect the unique pages of one site, a bounded number of
// fetches at a time.
//
// Layout:
// - crawl: engine, visited-URL store and scope filter
// - fetch: the HTTP fetcher and HTML link extractor the engine drives
// - error: library error types
// =============================================================================

pub mod crawl;
pub mod error;
pub mod fetch;

pub use crawl::{
    filter_links, Admission, CrawlConfig, CrawlStats, Engine, EngineState, ScopeFilter,
    StopReason, VisitedStore,
};
pub use error::{CrawlError, FetchError};
pub use fetch::{FetchConfig, Fetcher, HtmlLinkExtractor, HttpFetcher, LinkExtractor};
