// src/error.rs
// =============================================================================
// Error types for the crawler library.
//
// Two families:
// - CrawlError: fatal problems found while building or driving an engine
//   (bad base URL, zero concurrency, lifecycle misuse)
// - FetchError: a single page could not be downloaded. These never abort
//   a crawl; the engine logs them and drops the URL.
//
// The binary wraps both in anyhow, the library keeps them typed.
// =============================================================================

use reqwest::StatusCode;
use thiserror::Error;

/// Fatal errors surfaced by the crawl engine.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The base URL could not be parsed.
    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The base URL parsed, but has nothing to scope the crawl to.
    #[error("base URL '{0}' has no host")]
    MissingHost(String),

    /// At least one fetch must be allowed in flight.
    #[error("max concurrent fetches must be at least 1")]
    InvalidConcurrency,

    /// The default HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("crawl already started")]
    AlreadyStarted,

    #[error("crawl was never started")]
    NotStarted,

    /// The coordinator task panicked or was cancelled.
    #[error("crawl task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Why a single page fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The server answered, but not with a 2xx.
    #[error("HTTP {0}")]
    Status(StatusCode),
}
