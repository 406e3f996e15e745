use crate::cache::{ImageCache, SharedBitmap};
use crate::fetcher::ImageFetcher;
use crate::proxy::ProxyEndpoint;
use crate::resolver::CardResolver;
use crate::retry::RetryPolicy;
use crate::CardError;
use cardsheet_traits::HttpTransport;
use log::debug;
use std::sync::Arc;

/// Name in, bitmap out: the per-card unit of work of a sheet build.
#[derive(Debug)]
pub struct CardLoader {
    resolver: CardResolver,
    fetcher: ImageFetcher,
    cache: Arc<ImageCache>,
}

impl CardLoader {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        endpoint: ProxyEndpoint,
        cache: Arc<ImageCache>,
        policy: RetryPolicy,
    ) -> Self {
        let endpoint = Arc::new(endpoint);
        Self {
            resolver: CardResolver::new(transport.clone(), endpoint.clone(), policy.timeout()),
            fetcher: ImageFetcher::new(transport, endpoint, cache.clone(), policy),
            cache,
        }
    }

    /// Returns the bitmap for `name`. A name already in the bitmap cache
    /// costs no network traffic at all.
    pub async fn load(&self, name: &str) -> Result<SharedBitmap, CardError> {
        if let Some(bitmap) = self.cache.bitmap(name) {
            debug!("[FETCH] Bitmap cache hit for {:?}", name);
            return Ok(bitmap);
        }
        let resolved = self.resolver.resolve(name).await?;
        Ok(self.fetcher.fetch_image(&resolved).await?)
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }
}
