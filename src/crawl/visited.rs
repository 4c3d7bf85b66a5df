// src/crawl/visited.rs
// =============================================================================
// The set of URLs a crawl has claimed.
//
// A URL is claimed by exactly one caller: whoever first finds it absent.
// Claims are permanent for the life of the store, and the count is the
// size of the set itself, so the two can never disagree.
//
// Every operation takes one short std Mutex critical section. None of them
// await while holding the lock, so a blocking mutex is the right tool even
// from async tasks.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of a bounded claim, see [`VisitedStore::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First sighting. Carries the store size right after the insert, which
    /// is unique per admission and so identifies the caller that hit a limit.
    Fresh(usize),
    /// Someone already claimed this URL.
    Seen,
    /// New URL, but the store was already at the limit; nothing recorded.
    Full,
}

/// Concurrent insert-if-absent set of normalized URL strings.
#[derive(Debug, Default)]
pub struct VisitedStore {
    urls: Mutex<HashSet<String>>,
}

impl VisitedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url`. True only for the first caller to see it.
    pub fn try_visit(&self, url: &str) -> bool {
        matches!(self.admit(url, usize::MAX), Admission::Fresh(_))
    }

    /// Claims `url` unless the store already holds `limit` URLs.
    ///
    /// The membership check, the limit check and the insert happen under one
    /// lock, so concurrent callers can never push the store past `limit`.
    pub fn admit(&self, url: &str, limit: usize) -> Admission {
        let mut urls = self.lock();
        if urls.contains(url) {
            return Admission::Seen;
        }
        if urls.len() >= limit {
            return Admission::Full;
        }
        urls.insert(url.to_owned());
        Admission::Fresh(urls.len())
    }

    /// Number of URLs claimed so far.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Every URL claimed before this call, in no particular order.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    // Nothing panics while the lock is held, but if a caller ever did the
    // set itself is still consistent: inserts are all-or-nothing.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
