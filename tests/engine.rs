// tests/engine.rs
// =============================================================================
// End-to-end crawl tests.
//
// Most tests run the engine against an in-memory site: a map from URL to the
// hrefs on that page. The last group points the real HTTP fetcher and HTML
// extractor at a local wiremock server.
// =============================================================================

use async_trait::async_trait;
use reqwest::StatusCode;
use site_crawler::{
    CrawlConfig, CrawlError, Engine, EngineState, FetchError, Fetcher, LinkExtractor,
    StopReason,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Pages are keyed by their normalized URL; the body is the URL itself so the
// extractor can look the links back up
struct Site {
    pages: HashMap<String, Vec<String>>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    delay: Duration,
}

impl Site {
    fn new(pages: Vec<(&str, Vec<&str>)>) -> Arc<Self> {
        Self::with_delay(pages, Duration::ZERO)
    }

    fn with_delay(pages: Vec<(&str, Vec<&str>)>, delay: Duration) -> Arc<Self> {
        let pages = pages
            .into_iter()
            .map(|(url, links)| {
                let links: Vec<String> = links.iter().map(|l| l.to_string()).collect();
                (url.to_string(), links)
            })
            .collect();

        Arc::new(Self {
            pages,
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            delay,
        })
    }

    fn engine(self: &Arc<Self>, target: usize, concurrency: usize) -> Engine {
        Engine::with_components(
            "https://a.com",
            CrawlConfig::new(target, concurrency),
            Arc::clone(self) as Arc<dyn Fetcher>,
            Arc::clone(self) as Arc<dyn LinkExtractor>,
        )
        .unwrap()
    }
}

#[async_trait]
impl Fetcher for Site {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.pages.contains_key(url) {
            Ok(url.as_bytes().to_vec())
        } else {
            Err(FetchError::Status(StatusCode::NOT_FOUND))
        }
    }
}

impl LinkExtractor for Site {
    fn extract(&self, body: &[u8]) -> Vec<String> {
        let url = String::from_utf8_lossy(body);
        self.pages.get(&*url).cloned().unwrap_or_default()
    }
}

// A small site with cycles, off-site links, junk hrefs and a dead link
fn fixture() -> Arc<Site> {
    Site::new(vec![
        (
            "https://a.com/",
            vec![
                "https://a.com/docs",
                "https://www.a.com/about",
                "https://b.com/elsewhere",
                "http://a.com/plain",
                "/relative",
                "",
            ],
        ),
        (
            "https://a.com/docs",
            vec!["https://a.com/", "https://a.com/docs/intro", "https://a.com/missing"],
        ),
        ("https://www.a.com/about", vec!["https://a.com/docs", "%%"]),
        ("https://a.com/docs/intro", vec!["https://a.com/docs/intro"]),
    ])
}

fn as_set(urls: Vec<String>) -> HashSet<String> {
    urls.into_iter().collect()
}

async fn crawl(site: &Arc<Site>, target: usize, concurrency: usize) -> (Engine, Vec<String>) {
    let mut engine = site.engine(target, concurrency);
    engine.run().unwrap();
    let visited = tokio::time::timeout(Duration::from_secs(5), engine.await_result())
        .await
        .expect("crawl did not terminate")
        .unwrap();
    (engine, visited)
}

#[tokio::test]
async fn test_zero_target_returns_immediately() {
    let site = fixture();
    let (engine, visited) = crawl(&site, 0, 4).await;

    assert!(visited.is_empty());
    assert_eq!(site.fetches.load(Ordering::SeqCst), 0);
    assert_eq!(engine.state(), EngineState::Done);
}

#[tokio::test]
async fn test_seed_without_links_terminates() {
    let site = Site::new(vec![("https://a.com/", vec!["https://b.com/", "/local"])]);
    let (engine, visited) = crawl(&site, 5, 4).await;

    assert_eq!(visited, vec!["https://a.com/"]);
    assert_eq!(engine.outcome(), Some(StopReason::FrontierExhausted));
}

#[tokio::test]
async fn test_crawls_whole_site_below_target() {
    let site = fixture();
    let (engine, visited) = crawl(&site, 100, 4).await;

    let expected = as_set(
        [
            "https://a.com/",
            "https://a.com/docs",
            "https://www.a.com/about",
            "https://a.com/docs/intro",
            "https://a.com/missing",
        ]
        .map(String::from)
        .to_vec(),
    );
    assert_eq!(as_set(visited), expected);
    assert_eq!(engine.outcome(), Some(StopReason::FrontierExhausted));

    // every admitted URL is fetched exactly once; the dead link fails
    let stats = engine.stats();
    assert_eq!(site.fetches.load(Ordering::SeqCst), 5);
    assert_eq!(stats.fetched, 4);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn test_result_is_sorted() {
    let site = fixture();
    let (_, visited) = crawl(&site, 100, 2).await;

    let mut sorted = visited.clone();
    sorted.sort();
    assert_eq!(visited, sorted);
}

#[tokio::test]
async fn test_concurrency_does_not_change_the_result() {
    let serial = fixture();
    let parallel = fixture();

    let (_, one) = crawl(&serial, 100, 1).await;
    let (_, eight) = crawl(&parallel, 100, 8).await;

    assert_eq!(as_set(one), as_set(eight));
}

#[tokio::test]
async fn test_target_stops_the_crawl() {
    let seed_links: Vec<String> = (0..30).map(|i| format!("https://a.com/p{}", i)).collect();
    let seed_links: Vec<&str> = seed_links.iter().map(String::as_str).collect();
    let site = Site::new(vec![("https://a.com/", seed_links)]);

    let (engine, visited) = crawl(&site, 7, 3).await;

    assert_eq!(visited.len(), 7);
    assert!(visited.contains(&"https://a.com/".to_string()));
    assert_eq!(engine.outcome(), Some(StopReason::TargetReached));
    // the seed is the only page whose fetch could lead to the target
    assert_eq!(site.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fetches_never_exceed_the_limit() {
    let seed_links: Vec<String> = (0..40).map(|i| format!("https://a.com/p{}", i)).collect();
    let seed_links: Vec<&str> = seed_links.iter().map(String::as_str).collect();
    let mut pages = vec![("https://a.com/", seed_links.clone())];
    pages.extend(seed_links.iter().map(|url| (*url, Vec::new())));
    let site = Site::with_delay(pages, Duration::from_millis(10));

    let (_, visited) = crawl(&site, 100, 3).await;

    assert_eq!(visited.len(), 41);
    assert_eq!(site.fetches.load(Ordering::SeqCst), 41);
    let peak = site.peak_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight fetches was {}", peak);
    assert!(peak > 1, "fetches never overlapped");
}

#[tokio::test]
async fn test_invalid_base_url_is_fatal() {
    let site = fixture();
    let result = Engine::with_components(
        "not a url",
        CrawlConfig::default(),
        Arc::clone(&site) as Arc<dyn Fetcher>,
        site as Arc<dyn LinkExtractor>,
    );
    assert!(matches!(result, Err(CrawlError::InvalidBaseUrl { .. })));
}

#[tokio::test]
async fn test_crawls_a_live_server() {
    let server = MockServer::start().await;
    let base = server.uri();

    let index = format!(
        r#"<html><body>
            <a href="{base}/one">One</a>
            <a href="{base}/two">Two</a>
            <a href="/relative">Relative</a>
            <a href="https://elsewhere.example/">Elsewhere</a>
        </body></html>"#
    );
    let one = format!(r#"<a href="{base}/">Home</a><a href="{base}/gone">Gone</a>"#);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(ResponseTemplate::new(200).set_body_string(one))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>leaf</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut engine = Engine::new(&base, CrawlConfig::new(10, 2)).unwrap();
    engine.run().unwrap();
    let visited = engine.await_result().await.unwrap();

    let expected = as_set(vec![
        format!("{base}/"),
        format!("{base}/gone"),
        format!("{base}/one"),
        format!("{base}/two"),
    ]);
    assert_eq!(as_set(visited), expected);
    assert_eq!(engine.outcome(), Some(StopReason::FrontierExhausted));
    assert_eq!(engine.stats().failed, 1);
}
