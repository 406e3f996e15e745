use crate::error::PipelineError;
use cardsheet_core::RetryPolicy;
use cardsheet_layout::SheetConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

pub const DEFAULT_PROXY_URL: &str = "http://localhost:8888/.netlify/functions/swu";
pub const DEFAULT_UPSTREAM_DOMAIN: &str = "swu-db.com";

/// In-flight card loads: one per CPU, but never fewer than 4 or more than 8.
pub fn default_concurrency() -> usize {
    num_cpus::get().clamp(4, 8)
}

/// Everything a sheet build needs besides the card list.
///
/// Loaded from JSON; every field is optional and falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub proxy_url: String,
    /// Direct image URLs on this domain (or its subdomains) are fetched through the proxy.
    pub upstream_domain: String,
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub sheet: SheetConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            upstream_domain: DEFAULT_UPSTREAM_DOMAIN.to_string(),
            concurrency: default_concurrency(),
            retry: RetryPolicy::default(),
            sheet: SheetConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path_ref = path.as_ref();
        let source = fs::read_to_string(path_ref).map_err(|e| {
            PipelineError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read config from '{}': {}", path_ref.display(), e),
            ))
        })?;
        Self::from_json_str(&source)
    }
}
