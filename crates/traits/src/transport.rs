//! HttpTransport trait for abstracting network access.
//!
//! The resolver and image fetcher only ever issue GET requests. Hiding them
//! behind this trait lets the pipeline run against the real proxy, a scripted
//! in-memory upstream, or anything else that can answer a URL.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

/// Error type for transport-level failures (no HTTP status was received).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection to '{url}' failed: {message}")]
    Connect { url: String, message: String },

    #[error("Failed to read response body from '{url}': {message}")]
    Body { url: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Shared response body (reference-counted bytes).
pub type SharedBody = Arc<Vec<u8>>;

/// A fully buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: SharedBody,
    pub content_type: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: Arc::new(body.into()),
            content_type: None,
        }
    }

    /// A 200 response carrying a JSON document.
    pub fn json(body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: Some("application/json".to_string()),
            ..Self::new(200, body)
        }
    }

    pub fn not_found() -> Self {
        Self::new(404, Vec::new())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A trait for issuing GET requests.
///
/// Implementations must not retry or time out on their own; the fetch layer
/// owns that policy.
///
/// # Implementations
///
/// - `ReqwestTransport` (cardsheet-resource): real HTTP
/// - `InMemoryTransport`: scripted responses, always available
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    /// Fetch `url` and buffer the whole body.
    ///
    /// Non-2xx statuses are returned as `Ok` responses; only failures to get
    /// any response at all are errors.
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// Returns a human-readable name for this transport (for logging/debugging).
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
struct ScriptedRoute {
    response: HttpResponse,
    failures_remaining: usize,
}

/// A transport answering from a table of scripted routes.
///
/// Unknown URLs answer `404`. Every request is recorded so callers can
/// assert on exactly what went over the wire.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    routes: RwLock<HashMap<String, ScriptedRoute>>,
    requests: Mutex<Vec<String>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `response` from now on, replacing any earlier route.
    pub fn add_route(&self, url: impl Into<String>, response: HttpResponse) {
        self.add_flaky_route(url, response, 0);
    }

    /// Like [`add_route`](Self::add_route), but the first `failures` requests
    /// fail with a connection error before the response is served.
    pub fn add_flaky_route(&self, url: impl Into<String>, response: HttpResponse, failures: usize) {
        if let Ok(mut routes) = self.routes.write() {
            routes.insert(
                url.into(),
                ScriptedRoute {
                    response,
                    failures_remaining: failures,
                },
            );
        }
    }

    /// All requested URLs, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of requests made so far. Returns 0 if the log lock is poisoned.
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Number of requests made for one exact URL.
    pub fn requests_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .map(|r| r.iter().filter(|u| u.as_str() == url).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl HttpTransport for InMemoryTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(url.to_string());
        }

        let mut routes = self
            .routes
            .write()
            .map_err(|_| TransportError::Connect {
                url: url.to_string(),
                message: "route table lock poisoned".to_string(),
            })?;

        match routes.get_mut(url) {
            Some(route) if route.failures_remaining > 0 => {
                route.failures_remaining -= 1;
                Err(TransportError::Connect {
                    url: url.to_string(),
                    message: "scripted failure".to_string(),
                })
            }
            Some(route) => Ok(route.response.clone()),
            None => Ok(HttpResponse::not_found()),
        }
    }

    fn name(&self) -> &'static str {
        "InMemoryTransport"
    }
}
