// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There is a single command: crawl one site, starting from its base URL,
// until enough unique pages are collected or there is nothing left to
// fetch. The flags map straight onto CrawlConfig and FetchConfig.
// =============================================================================

use clap::Parser;
use site_crawler::{CrawlConfig, FetchConfig};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "site-crawler",
    version,
    about = "Collect the unique pages of a single site",
    long_about = "site-crawler starts from a base URL, follows links that stay on the same \
                  site (the bare host or its www. alias, same scheme) and stops once it has \
                  collected the requested number of unique URLs. Set RUST_LOG=debug to see \
                  every admitted link."
)]
pub struct Cli {
    /// Base URL to start crawling from (e.g., https://example.com)
    pub url: String,

    /// Number of unique URLs to collect, the base URL included
    #[arg(long, default_value_t = 40)]
    pub links: usize,

    /// Maximum number of requests in flight at once
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Verify TLS certificates (they are not checked by default)
    #[arg(long)]
    pub strict_tls: bool,

    /// Output results in JSON format instead of a plain list
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig::new(self.links, self.limit)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            accept_invalid_certs: !self.strict_tls,
        }
    }
}
