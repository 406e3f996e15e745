//! Image retrieval with retries and two-level caching.

use crate::cache::{ImageCache, SharedBitmap};
use crate::proxy::ProxyEndpoint;
use crate::retry::{RetryPolicy, retry};
use crate::FetchError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cardsheet_traits::{HttpTransport, SharedBody};
use cardsheet_types::{CardImage, ResolvedCard};
use image::DynamicImage;
use log::{debug, trace};
use std::sync::Arc;

/// Decodes an image body. Bodies that are not an image but base64 text
/// (optionally a `data:` URL) are unwrapped and decoded again.
pub fn decode_image(url: &str, bytes: &[u8]) -> Result<DynamicImage, FetchError> {
    let direct = match image::load_from_memory(bytes) {
        Ok(img) => return Ok(img),
        Err(e) => e,
    };

    let decoded = std::str::from_utf8(bytes).ok().and_then(|text| {
        let text = text.trim();
        let payload = match text.split_once(";base64,") {
            Some((prefix, payload)) if prefix.starts_with("data:") => payload,
            _ => text,
        };
        STANDARD.decode(payload).ok()
    });

    match decoded {
        Some(raw) => {
            trace!("[FETCH] {} carried a base64 body ({} bytes)", url, raw.len());
            image::load_from_memory(&raw).map_err(|e| FetchError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
        }
        None => Err(FetchError::Decode {
            url: url.to_string(),
            message: direct.to_string(),
        }),
    }
}

/// Fetches and decodes card artwork.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    transport: Arc<dyn HttpTransport>,
    endpoint: Arc<ProxyEndpoint>,
    cache: Arc<ImageCache>,
    policy: RetryPolicy,
}

impl ImageFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        endpoint: Arc<ProxyEndpoint>,
        cache: Arc<ImageCache>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            endpoint,
            cache,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The URL the artwork of `card` is requested from.
    pub fn image_url(&self, card: &ResolvedCard) -> Result<String, FetchError> {
        match &card.image {
            CardImage::Printing { set_code, number } => Ok(self.endpoint.card_image_url(set_code, number)),
            CardImage::Direct(url) => self.endpoint.route_image(url),
        }
    }

    /// Raw bytes of `url`, from the cache or the network under the retry policy.
    pub async fn fetch_bytes(&self, url: &str) -> Result<SharedBody, FetchError> {
        if let Some(body) = self.cache.raw(url) {
            debug!("[FETCH] Raw cache hit for {}", url);
            return Ok(body);
        }

        let transport = &self.transport;
        let label = format!("[FETCH] {url}");
        let body = retry(&self.policy, &label, |attempt| async move {
            trace!("[FETCH] GET {} (attempt {})", url, attempt);
            let response = transport.get(url).await?;
            if response.is_success() {
                Ok(response.body)
            } else {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: response.status,
                })
            }
        })
        .await?;

        self.cache.insert_raw(url, body.clone());
        Ok(body)
    }

    /// Fetches, decodes and caches the bitmap of `card` under its requested name.
    pub async fn fetch_image(&self, card: &ResolvedCard) -> Result<SharedBitmap, FetchError> {
        let url = self.image_url(card)?;
        let bytes = self.fetch_bytes(&url).await?;
        let bitmap: SharedBitmap = Arc::new(decode_image(&url, &bytes)?);
        debug!(
            "[FETCH] Decoded {:?} ({}x{})",
            card.requested_name,
            bitmap.width(),
            bitmap.height()
        );
        self.cache.insert_bitmap(&card.requested_name, bitmap.clone());
        Ok(bitmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsheet_traits::{HttpResponse, InMemoryTransport};
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn setup() -> (Arc<InMemoryTransport>, Arc<ImageCache>, ImageFetcher) {
        let _ = env_logger::builder().is_test(true).try_init();
        let transport = Arc::new(InMemoryTransport::new());
        let endpoint = Arc::new(ProxyEndpoint::new("http://proxy.test/swu", "swu-db.com").unwrap());
        let cache = Arc::new(ImageCache::new());
        let fetcher = ImageFetcher::new(transport.clone(), endpoint, cache.clone(), RetryPolicy::default());
        (transport, cache, fetcher)
    }

    fn printing(name: &str, set_code: &str, number: &str) -> ResolvedCard {
        ResolvedCard {
            requested_name: name.to_string(),
            display_name: name.to_string(),
            image: CardImage::Printing {
                set_code: set_code.to_string(),
                number: number.to_string(),
            },
        }
    }

    #[test]
    fn test_decode_plain_and_base64_bodies() {
        let png = png_bytes(3, 2);
        assert_eq!(decode_image("u", &png).unwrap().width(), 3);

        let b64 = STANDARD.encode(&png);
        assert_eq!(decode_image("u", b64.as_bytes()).unwrap().height(), 2);

        let data_url = format!("data:image/png;base64,{b64}");
        assert_eq!(decode_image("u", data_url.as_bytes()).unwrap().width(), 3);

        assert!(matches!(decode_image("u", b"not an image"), Err(FetchError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_fetch_image_caches_bytes_and_bitmap() {
        let (transport, cache, fetcher) = setup();
        let card = printing("Luke Skywalker", "sor", "5");
        let url = fetcher.image_url(&card).unwrap();
        assert!(url.contains("path=%2Fcards%2FSOR%2F005"));
        transport.add_route(url.clone(), HttpResponse::new(200, png_bytes(4, 4)));

        let bitmap = fetcher.fetch_image(&card).await.unwrap();
        assert_eq!(bitmap.width(), 4);
        assert!(cache.raw(&url).is_some());
        assert!(Arc::ptr_eq(&cache.bitmap("luke skywalker").unwrap(), &bitmap));

        fetcher.fetch_image(&card).await.unwrap();
        assert_eq!(transport.requests_for(&url), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_transient_failures() {
        let (transport, _cache, fetcher) = setup();
        let card = printing("Darth Vader", "SOR", "10");
        let url = fetcher.image_url(&card).unwrap();
        transport.add_flaky_route(url.clone(), HttpResponse::new(200, png_bytes(2, 2)), 3);

        assert!(fetcher.fetch_image(&card).await.is_ok());
        assert_eq!(transport.requests_for(&url), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_gives_up_after_four_attempts() {
        let (transport, cache, fetcher) = setup();
        let card = printing("Darth Vader", "SOR", "10");
        let url = fetcher.image_url(&card).unwrap();
        transport.add_route(url.clone(), HttpResponse::new(500, Vec::new()));

        let err = fetcher.fetch_image(&card).await.unwrap_err();
        assert_eq!(err, FetchError::Status { url: url.clone(), status: 500 });
        assert_eq!(transport.requests_for(&url), 4);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_direct_images_on_upstream_domain_go_through_proxy() {
        let (transport, _cache, fetcher) = setup();
        let card = ResolvedCard {
            requested_name: "Boba Fett".to_string(),
            display_name: "Boba Fett".to_string(),
            image: CardImage::Direct("https://cdn.swu-db.com/boba.png".to_string()),
        };
        let url = fetcher.image_url(&card).unwrap();
        assert!(url.starts_with("http://proxy.test/swu?url="));
        transport.add_route(url.clone(), HttpResponse::new(200, STANDARD.encode(png_bytes(2, 3))));

        let bitmap = fetcher.fetch_image(&card).await.unwrap();
        assert_eq!(bitmap.height(), 3);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_not_retried() {
        let (transport, _cache, fetcher) = setup();
        let card = printing("Han Solo", "SOR", "1");
        let url = fetcher.image_url(&card).unwrap();
        transport.add_route(url.clone(), HttpResponse::new(200, b"<html>oops</html>".to_vec()));

        assert!(matches!(fetcher.fetch_image(&card).await, Err(FetchError::Decode { .. })));
        assert_eq!(transport.requests_for(&url), 1);
    }
}
