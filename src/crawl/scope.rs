// src/crawl/scope.rs
// =============================================================================
// Decides which discovered links belong to the site being crawled.
//
// A candidate href is in scope when all of these hold:
// 1. it parses as a URL
// 2. it is absolute (scheme and host)
// 3. its scheme matches the base scheme exactly
// 4. its host is the base host, or "www." + the base host
// 5. its string form is non-empty
//
// Nothing else is normalized: trailing slashes, case in the path and query,
// and explicit ports all stay as the url crate parses them. Relative hrefs
// are dropped, not resolved.
//
// The filter holds nothing but the base scheme and host, so one instance
// is shared by every fetch task.
// =============================================================================

use url::Url;

use crate::error::CrawlError;

/// Same-site link filter for one crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
    scheme: String,
    // host[:port], the same shape we build for candidates
    authority: String,
}

impl ScopeFilter {
    /// Builds a filter from an already parsed base URL.
    pub fn new(base: &Url) -> Result<Self, CrawlError> {
        let authority =
            authority(base).ok_or_else(|| CrawlError::MissingHost(base.to_string()))?;

        Ok(Self {
            scheme: base.scheme().to_string(),
            authority,
        })
    }

    /// Parses `base` and builds a filter from it.
    pub fn parse(base: &str) -> Result<Self, CrawlError> {
        let url = Url::parse(base).map_err(|source| CrawlError::InvalidBaseUrl {
            url: base.to_string(),
            source,
        })?;
        Self::new(&url)
    }

    /// Whether an already parsed URL is in scope.
    pub fn admits(&self, link: &Url) -> bool {
        let Some(link_authority) = authority(link) else {
            return false;
        };

        link.scheme() == self.scheme
            && self.is_same_site(&link_authority)
            && !link.as_str().is_empty()
    }

    /// Keeps the in-scope hrefs of a batch, as normalized absolute URL strings.
    ///
    /// Unparseable and empty hrefs are skipped silently. Input order is kept;
    /// duplicates are left for the visited store to reject.
    pub fn filter<I, S>(&self, hrefs: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        hrefs
            .into_iter()
            .filter_map(|href| {
                let href = href.as_ref();
                if href.is_empty() {
                    return None;
                }
                // Relative hrefs fail here with RelativeUrlWithoutBase
                Url::parse(href).ok()
            })
            .filter(|link| self.admits(link))
            .map(String::from)
            .collect()
    }

    fn is_same_site(&self, authority: &str) -> bool {
        authority == self.authority
            || authority
                .strip_prefix("www.")
                .is_some_and(|rest| rest == self.authority)
    }
}

/// One-shot form of [`ScopeFilter::filter`].
pub fn filter_links<I, S>(base: &Url, hrefs: I) -> Result<Vec<String>, CrawlError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(ScopeFilter::new(base)?.filter(hrefs))
}

// host plus explicit port, e.g. "a.com" or "127.0.0.1:8080"; default
// ports are already dropped by the parser
fn authority(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|host| !host.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
