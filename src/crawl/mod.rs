// src/crawl/mod.rs
// =============================================================================
// This module handles crawling a single site.
//
// Pieces:
// - engine: the coordinator loop, permit pool and stop detection
// - visited: the shared set of URLs already claimed by the crawl
// - scope: the same-site filter applied to every discovered link
// =============================================================================

mod engine;
mod scope;
mod visited;

pub use engine::{CrawlConfig, CrawlStats, Engine, EngineState, StopReason};
pub use scope::{filter_links, ScopeFilter};
pub use visited::{Admission, VisitedStore};
