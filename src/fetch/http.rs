// src/fetch/http.rs
// =============================================================================
// The default Fetcher: a plain GET over reqwest.
//
// Transport policy:
// - One client per crawl, shared by every fetch task (connection setup,
//   cookie jar)
// - Per-request timeout, so a slow server only ties up one permit for a
//   bounded time
// - Non-2xx answers are failures; the engine logs and drops them
// - HTTP/1 only, no idle keep-alive pool, certificate checks off unless
//   asked for
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::Fetcher;
use crate::error::{CrawlError, FetchError};

const DEFAULT_USER_AGENT: &str = concat!("site-crawler/", env!("CARGO_PKG_VERSION"));

/// Knobs for the HTTP transport.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout, headers and body included.
    pub timeout: Duration,
    pub user_agent: String,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: true,
        }
    }
}

/// reqwest-backed page fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::limited(5))
            .cookie_store(true)
            .http1_only()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(CrawlError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}
