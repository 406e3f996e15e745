pub mod fixtures;

use async_trait::async_trait;
use cardsheet::core::traits::{HttpResponse, HttpTransport, InMemoryTransport, TransportError};
use cardsheet::core::{ImageCache, ProxyEndpoint};
use cardsheet::{PipelineBuilder, RetryPolicy, SheetConfig, SheetPipeline};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const PROXY: &str = "http://proxy.test/.netlify/functions/swu";
pub const UPSTREAM: &str = "swu-db.com";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A scripted card database behind the proxy.
///
/// Cards registered here answer the exact-name search and serve a PNG at
/// their printing's image URL. Everything else answers 404.
pub struct FakeUpstream {
    pub transport: Arc<InMemoryTransport>,
    pub endpoint: ProxyEndpoint,
}

impl FakeUpstream {
    pub fn new() -> Self {
        init_logger();
        Self {
            transport: Arc::new(InMemoryTransport::new()),
            endpoint: ProxyEndpoint::new(PROXY, UPSTREAM).expect("valid proxy url"),
        }
    }

    /// Registers `name` as printing `set`/`number` with solid `rgb` artwork.
    pub fn add_card(&self, name: &str, set: &str, number: &str, rgb: [u8; 3]) {
        self.transport.add_route(
            self.endpoint.search_url(name),
            HttpResponse::json(fixtures::search_hit(name, set, number).into_bytes()),
        );
        self.transport.add_route(
            self.endpoint.card_image_url(set, number),
            HttpResponse::new(200, fixtures::png_bytes(rgb)),
        );
    }

    /// Serves the name catalog used for fuzzy fallback.
    pub fn set_catalog(&self, names: &[&str]) {
        self.transport.add_route(
            self.endpoint.catalog_url(),
            HttpResponse::json(fixtures::catalog(names).into_bytes()),
        );
    }

    pub fn request_count(&self) -> usize {
        self.transport.request_count()
    }

    pub fn builder(&self) -> PipelineBuilder {
        PipelineBuilder::new()
            .with_transport(self.transport.clone())
            .with_proxy_url(PROXY)
            .with_upstream_domain(UPSTREAM)
            .with_retry_policy(fast_retry())
            .with_concurrency(4)
    }

    pub fn pipeline(&self, sheet: SheetConfig) -> SheetPipeline {
        self.builder()
            .with_sheet_config(sheet)
            .build()
            .expect("pipeline builds")
    }

    pub fn pipeline_with_cache(&self, sheet: SheetConfig, cache: Arc<ImageCache>) -> SheetPipeline {
        self.builder()
            .with_sheet_config(sheet)
            .with_cache(cache)
            .build()
            .expect("pipeline builds")
    }
}

/// Holds every request for `delay` before answering from the wrapped
/// transport, and records the most requests ever in flight at once.
#[derive(Debug)]
pub struct SlowTransport {
    inner: Arc<InMemoryTransport>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowTransport {
    pub fn new(inner: Arc<InMemoryTransport>, delay: Duration) -> Self {
        Self {
            inner,
            delay: Some(delay),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Accepts requests and never answers them.
    pub fn stalled(inner: Arc<InMemoryTransport>) -> Self {
        Self {
            delay: None,
            ..Self::new(inner, Duration::ZERO)
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for SlowTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
        let response = self.inner.get(url).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    fn name(&self) -> &'static str {
        "SlowTransport"
    }
}

/// Retries quickly so failing fetches do not slow the suite down.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        backoff_ms: 1,
        timeout_ms: 2_000,
    }
}

/// A 2x4 grid at a low DPI; small bitmaps keep the tests fast.
pub fn small_sheet(rows: u32, cols: u32) -> SheetConfig {
    SheetConfig {
        rows,
        cols,
        dpi: 60,
        ..Default::default()
    }
}
