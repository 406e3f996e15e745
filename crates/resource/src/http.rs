//! `reqwest`-backed transport for native platforms.

use async_trait::async_trait;
use cardsheet_traits::{HttpResponse, HttpTransport, TransportError};
use log::{debug, trace};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;

/// A transport issuing real GET requests through a shared connection pool.
///
/// No timeout is configured on the client: the fetch layer wraps each
/// attempt in its own deadline and owns the retry policy.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default client.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("cardsheet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Connect {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client, e.g. one configured with a proxy or custom TLS.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn classify(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::InvalidUrl(url.to_string())
    } else {
        TransportError::Connect {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        trace!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| classify(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await.map_err(|e| TransportError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(HttpResponse {
            status,
            body: Arc::new(body.to_vec()),
            content_type,
        })
    }

    fn name(&self) -> &'static str {
        "ReqwestTransport"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_malformed_url_is_invalid_url() {
        let transport = ReqwestTransport::new().unwrap();
        let err = transport.get("not a url").await.unwrap_err();
        assert_eq!(err, TransportError::InvalidUrl("not a url".to_string()));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connect_error() {
        let transport = ReqwestTransport::new().unwrap();
        // Port 9 (discard) on loopback is closed in any sane test environment.
        let err = transport.get("http://127.0.0.1:9/cards").await.unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[test]
    fn test_transport_name() {
        let transport = ReqwestTransport::with_client(Client::new());
        assert_eq!(transport.name(), "ReqwestTransport");
    }
}
