// src/crawl/engine.rs
// =============================================================================
// The crawl engine: a coordinator loop plus short-lived fetch tasks.
//
// How it works:
// 1. The seed URL is claimed in the visited store and put on the frontier
// 2. The coordinator takes batches off the frontier and, for each URL,
//    waits for a permit and spawns a fetch task
// 3. A fetch task downloads the page, gives its permit back, extracts and
//    scope-filters the links, claims them in the visited store and pushes
//    only the fresh ones back onto the frontier
// 4. The crawl stops when the store reaches the target, or when no URL is
//    queued or in flight any more
//
// States: Idle -> Running -> Draining -> Done
//
// Stopping is event driven. The task that claims the target-th URL, or the
// task whose completion leaves nothing outstanding, flips Running to
// Draining through a watch channel. The coordinator is parked on that
// channel, stops admitting work and publishes the snapshot. In-flight
// fetches are left to finish on their own; their links are not re-queued.
// =============================================================================

use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use url::Url;

use super::scope::ScopeFilter;
use super::visited::{Admission, VisitedStore};
use crate::error::CrawlError;
use crate::fetch::{FetchConfig, Fetcher, HtmlLinkExtractor, HttpFetcher, LinkExtractor};

type Frontier = mpsc::UnboundedSender<Vec<String>>;

/// How much to crawl and how hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Number of unique URLs to collect, seed included.
    pub target: usize,
    /// Upper bound on simultaneous fetches.
    pub max_concurrent_fetches: usize,
}

impl CrawlConfig {
    pub fn new(target: usize, max_concurrent_fetches: usize) -> Self {
        Self {
            target,
            max_concurrent_fetches,
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new(40, 10)
    }
}

/// Lifecycle of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Running,
    /// Stopped admitting work; the result is being published.
    Draining,
    Done,
}

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TargetReached,
    /// Nothing left to fetch before the target was hit.
    FrontierExhausted,
}

/// Counters for a crawl, readable at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub visited: usize,
    pub fetched: usize,
    pub failed: usize,
}

// Everything the coordinator and fetch tasks share
struct Shared {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    scope: ScopeFilter,
    visited: VisitedStore,
    target: usize,
    permits: Arc<Semaphore>,
    // URLs queued on the frontier or being fetched
    outstanding: AtomicUsize,
    fetched: AtomicUsize,
    failed: AtomicUsize,
    state: watch::Sender<EngineState>,
    stop_reason: OnceLock<StopReason>,
}

/// A single crawl run.
///
/// ```no_run
/// # async fn demo() -> Result<(), site_crawler::CrawlError> {
/// use site_crawler::{CrawlConfig, Engine};
///
/// let mut engine = Engine::new("https://example.com", CrawlConfig::new(40, 10))?;
/// engine.run()?;
/// let visited = engine.await_result().await?;
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    shared: Arc<Shared>,
    seed: String,
    task: Option<JoinHandle<Vec<String>>>,
    result: Option<Vec<String>>,
}

impl Engine {
    /// Builds an engine backed by the default HTTP fetcher and HTML extractor.
    pub fn new(base_url: &str, config: CrawlConfig) -> Result<Self, CrawlError> {
        Self::with_fetch_config(base_url, config, &FetchConfig::default())
    }

    /// Like [`Engine::new`], with a custom HTTP transport configuration.
    pub fn with_fetch_config(
        base_url: &str,
        config: CrawlConfig,
        fetch_config: &FetchConfig,
    ) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(fetch_config)?;
        Self::with_components(
            base_url,
            config,
            Arc::new(fetcher),
            Arc::new(HtmlLinkExtractor::new()),
        )
    }

    /// Builds an engine around caller-supplied collaborators.
    pub fn with_components(
        base_url: &str,
        config: CrawlConfig,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Result<Self, CrawlError> {
        if config.max_concurrent_fetches == 0 {
            return Err(CrawlError::InvalidConcurrency);
        }

        let base = Url::parse(base_url).map_err(|source| CrawlError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        let scope = ScopeFilter::new(&base)?;

        let (state, _) = watch::channel(EngineState::Idle);

        let shared = Shared {
            fetcher,
            extractor,
            scope,
            visited: VisitedStore::new(),
            target: config.target,
            permits: Arc::new(Semaphore::new(config.max_concurrent_fetches)),
            outstanding: AtomicUsize::new(0),
            fetched: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            state,
            stop_reason: OnceLock::new(),
        };

        Ok(Self {
            shared: Arc::new(shared),
            seed: base.into(),
            task: None,
            result: None,
        })
    }

    /// Starts the crawl in the background and returns immediately.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn run(&mut self) -> Result<(), CrawlError> {
        if *self.shared.state.borrow() != EngineState::Idle {
            return Err(CrawlError::AlreadyStarted);
        }
        self.shared.state.send_replace(EngineState::Running);

        info!(
            "crawling {} (target {}, {} concurrent fetches)",
            self.seed,
            self.shared.target,
            self.shared.permits.available_permits()
        );

        let shared = Arc::clone(&self.shared);
        let seed = self.seed.clone();
        self.task = Some(tokio::spawn(shared.coordinate(seed)));
        Ok(())
    }

    /// Waits for the crawl to finish and returns the visited URLs, sorted.
    ///
    /// Later calls return the same result without waiting.
    pub async fn await_result(&mut self) -> Result<Vec<String>, CrawlError> {
        if let Some(task) = self.task.take() {
            self.result = Some(task.await?);
        }
        self.result.clone().ok_or(CrawlError::NotStarted)
    }

    pub fn state(&self) -> EngineState {
        *self.shared.state.borrow()
    }

    /// Why the crawl stopped, once it has.
    pub fn outcome(&self) -> Option<StopReason> {
        self.shared.stop_reason.get().copied()
    }

    pub fn stats(&self) -> CrawlStats {
        self.shared.stats()
    }

    /// The normalized seed URL.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn target(&self) -> usize {
        self.shared.target
    }
}

impl Shared {
    async fn coordinate(self: Arc<Self>, seed: String) -> Vec<String> {
        let (frontier, mut batches) = mpsc::unbounded_channel();
        let mut state = self.state.subscribe();

        if self.target == 0 {
            self.stop(StopReason::TargetReached);
        } else {
            // The seed goes through the same claim as every other URL
            let fresh = self.claim(vec![seed]);
            self.enqueue(&frontier, fresh);
        }

        'frontier: loop {
            let batch = tokio::select! {
                biased;
                _ = stopped(&mut state) => break,
                batch = batches.recv() => match batch {
                    Some(batch) => batch,
                    None => break,
                },
            };

            for url in batch {
                let permit = tokio::select! {
                    biased;
                    _ = stopped(&mut state) => break 'frontier,
                    permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break 'frontier,
                    },
                };

                let task = Arc::clone(&self);
                let frontier = frontier.clone();
                tokio::spawn(async move { task.visit(url, permit, frontier).await });
            }
        }

        let mut visited = self.visited.snapshot();
        visited.sort();

        let stats = self.stats();
        info!(
            "crawl finished: {} visited, {} fetched, {} failed",
            stats.visited, stats.fetched, stats.failed
        );

        self.state.send_replace(EngineState::Done);
        visited
    }

    async fn visit(self: Arc<Self>, url: String, permit: OwnedSemaphorePermit, frontier: Frontier) {
        // Held until the end of the task, including on panic
        let _in_flight = InFlight(&self);

        let fetched = self.fetcher.fetch(&url).await;
        drop(permit);

        let body = match fetched {
            Ok(body) => {
                self.fetched.fetch_add(1, Ordering::Relaxed);
                body
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!("failed to fetch {}: {}", url, e);
                return;
            }
        };

        if !self.is_running() {
            return;
        }

        let links = self.scope.filter(self.extractor.extract(&body));
        let fresh = self.claim(links);
        debug!("{}: {} new link(s)", url, fresh.len());

        if self.is_running() {
            self.enqueue(&frontier, fresh);
        }
    }

    // Claims links in order until the target is hit; returns the fresh ones
    fn claim(&self, links: Vec<String>) -> Vec<String> {
        let mut fresh = Vec::new();

        for link in links {
            match self.visited.admit(&link, self.target) {
                Admission::Fresh(count) => {
                    debug!("admitted {} ({}/{})", link, count, self.target);
                    fresh.push(link);
                    if count == self.target {
                        self.stop(StopReason::TargetReached);
                        break;
                    }
                }
                Admission::Seen => {}
                Admission::Full => break,
            }
        }

        fresh
    }

    fn enqueue(&self, frontier: &Frontier, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        // Counted before the send so the queue never looks empty in between
        self.outstanding.fetch_add(urls.len(), Ordering::AcqRel);
        if frontier.send(urls).is_err() {
            debug!("frontier closed, dropping links");
        }
    }

    // Running -> Draining, exactly once
    fn stop(&self, reason: StopReason) {
        let stopped = self.state.send_if_modified(|state| {
            if *state != EngineState::Running {
                return false;
            }
            *state = EngineState::Draining;
            let _ = self.stop_reason.set(reason);
            true
        });

        if stopped {
            match reason {
                StopReason::TargetReached => {
                    info!("target of {} URLs reached, draining", self.target)
                }
                StopReason::FrontierExhausted => info!(
                    "frontier exhausted at {}/{} URLs, draining",
                    self.visited.count(),
                    self.target
                ),
            }
        }
    }

    fn is_running(&self) -> bool {
        *self.state.borrow() == EngineState::Running
    }

    fn stats(&self) -> CrawlStats {
        CrawlStats {
            visited: self.visited.count(),
            fetched: self.fetched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

// One outstanding URL. The last one to finish declares the frontier empty.
struct InFlight<'a>(&'a Shared);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.0.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.stop(StopReason::FrontierExhausted);
        }
    }
}

// Resolves once the engine has left Running
async fn stopped(state: &mut watch::Receiver<EngineState>) {
    while *state.borrow_and_update() == EngineState::Running {
        if state.changed().await.is_err() {
            return;
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a semaphore and not a bounded channel?
//    - The frontier is unbounded on purpose: fetch tasks must never block
//      while handing links back, or a full queue could stall every task
//    - The permit pool is the only backpressure, and it only limits fetches
//
// 2. Why count outstanding URLs?
//    - "No tasks running" alone is not enough: a batch can be sitting in the
//      channel while every task is idle
//    - A task adds its fresh links to the count before it removes itself,
//      so the count only reaches zero when there is truly nothing left
//
// 3. Why can the result never exceed the target?
//    - VisitedStore::admit checks the limit and inserts under one lock
//    - Exactly one claim sees Fresh(target); that claim triggers the drain
// -----------------------------------------------------------------------------
