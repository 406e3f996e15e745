// src/pipeline/builder.rs
use super::api::{BuildProgress, ProgressCallback};
use super::config::PipelineConfig;
use super::orchestrator::SheetPipeline;
use crate::error::PipelineError;
use cardsheet_core::traits::HttpTransport;
use cardsheet_core::{CardLoader, ImageCache, ProxyEndpoint, RetryPolicy};
use cardsheet_layout::SheetConfig;
use cardsheet_resource::ReqwestTransport;
use std::path::Path;
use std::sync::Arc;

/// A builder for creating a `SheetPipeline`.
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    cache: Option<Arc<ImageCache>>,
    progress: Option<ProgressCallback>,
}

impl PipelineBuilder {
    /// Creates a new `PipelineBuilder` with default settings.
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the configuration from a JSON file.
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, PipelineError> {
        self.config = PipelineConfig::from_json_file(path)?;
        Ok(self)
    }

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.config.proxy_url = url.into();
        self
    }

    pub fn with_upstream_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.upstream_domain = domain.into();
        self
    }

    /// Maximum number of cards loaded at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn with_sheet_config(mut self, sheet: SheetConfig) -> Self {
        self.config.sheet = sheet;
        self
    }

    /// Uses `transport` for all network access instead of real HTTP.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Shares an existing cache, so separate pipelines reuse each other's downloads.
    pub fn with_cache(mut self, cache: Arc<ImageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Called once per distinct card as its load finishes.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BuildProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Consumes the builder and creates the `SheetPipeline`.
    ///
    /// Configuration is validated here, so a pipeline that builds can always
    /// compute its geometry.
    pub fn build(self) -> Result<SheetPipeline, PipelineError> {
        let config = self.config;
        config.sheet.validate()?;
        if config.concurrency == 0 {
            return Err(PipelineError::Config("concurrency must be at least 1".to_string()));
        }
        let endpoint = ProxyEndpoint::new(&config.proxy_url, config.upstream_domain.as_str())?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::new().map_err(|e| PipelineError::Config(e.to_string()))?,
            ),
        };
        log::info!(
            "Pipeline: proxy {} for {} via {}, {} workers, {} attempts per image.",
            endpoint.base(),
            endpoint.upstream_domain(),
            transport.name(),
            config.concurrency,
            config.retry.attempts()
        );

        let cache = self.cache.unwrap_or_default();
        let loader = Arc::new(CardLoader::new(transport, endpoint, cache, config.retry));
        Ok(SheetPipeline::new(loader, config.sheet, config.concurrency, self.progress))
    }
}
