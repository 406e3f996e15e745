//! Name → card resolution against the upstream search and catalog.

use crate::proxy::ProxyEndpoint;
use crate::record::{CardRecord, parse_catalog, parse_list};
use crate::ResolutionError;
use cardsheet_traits::{HttpResponse, HttpTransport};
use cardsheet_types::ResolvedCard;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Lower-cases `name`, then upper-cases every letter that starts a word.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for ch in name.to_lowercase().chars() {
        if !in_word && ch.is_ascii_lowercase() {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
        in_word = ch.is_ascii_alphanumeric() || ch == '_';
    }
    out
}

/// Best catalog entry for `name`: case-insensitive exact match first, then
/// the first entry containing it.
pub fn match_catalog<'a>(catalog: &'a [String], name: &str) -> Option<&'a str> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    catalog
        .iter()
        .find(|entry| entry.to_lowercase() == needle)
        .or_else(|| catalog.iter().find(|entry| entry.to_lowercase().contains(&needle)))
        .map(String::as_str)
}

enum CatalogFailure {
    /// The proxy answered but not with a catalog; treated as an empty one.
    Unavailable(u16),
    Error(ResolutionError),
}

/// Resolves card names to printings or image URLs.
///
/// The card-name catalog is downloaded at most once per resolver and only
/// kept when the download succeeded. Every request is bounded by `timeout`.
#[derive(Debug)]
pub struct CardResolver {
    transport: Arc<dyn HttpTransport>,
    endpoint: Arc<ProxyEndpoint>,
    timeout: Duration,
    catalog: OnceCell<Arc<Vec<String>>>,
}

impl CardResolver {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: Arc<ProxyEndpoint>, timeout: Duration) -> Self {
        Self {
            transport,
            endpoint,
            timeout,
            catalog: OnceCell::new(),
        }
    }

    /// GET with the resolver deadline. Errors are attributed to `name`.
    async fn get(&self, url: &str, name: &str) -> Result<HttpResponse, ResolutionError> {
        match tokio::time::timeout(self.timeout, self.transport.get(url)).await {
            Ok(result) => result.map_err(|source| ResolutionError::Upstream {
                name: name.to_string(),
                source,
            }),
            Err(_) => {
                warn!("[RESOLVER] {} did not answer within {:?}", url, self.timeout);
                Err(ResolutionError::Timeout {
                    name: name.to_string(),
                    after: self.timeout,
                })
            }
        }
    }

    pub async fn resolve(&self, name: &str) -> Result<ResolvedCard, ResolutionError> {
        let hit = match self.search(name, name).await? {
            Some(hit) => hit,
            None => {
                debug!("[RESOLVER] No exact hit for {:?}, consulting catalog", name);
                let catalog = self.catalog(name).await?;
                let guess = match match_catalog(&catalog, name) {
                    Some(entry) => {
                        debug!("[RESOLVER] Catalog suggests {:?} for {:?}", entry, name);
                        entry.to_string()
                    }
                    None => {
                        let guess = title_case(name);
                        debug!("[RESOLVER] No catalog match for {:?}, guessing {:?}", name, guess);
                        guess
                    }
                };
                if guess == name {
                    return Err(ResolutionError::NoMatch(name.to_string()));
                }
                self.search(&guess, name)
                    .await?
                    .ok_or_else(|| ResolutionError::NoMatch(name.to_string()))?
            }
        };

        let record = CardRecord::from_value(&hit).ok_or_else(|| ResolutionError::Malformed {
            name: name.to_string(),
            message: "search hit is not an object".to_string(),
        })?;
        let resolved = record.into_resolved(name)?;
        debug!("[RESOLVER] {:?} -> {:?}", name, resolved.image);
        Ok(resolved)
    }

    /// First hit of an exact-name search for `query`. Errors are attributed to `name`.
    async fn search(&self, query: &str, name: &str) -> Result<Option<Value>, ResolutionError> {
        let url = self.endpoint.search_url(query);
        let response = self.get(&url, name).await?;

        if !response.is_success() {
            debug!("[RESOLVER] Search for {:?} answered {}", query, response.status);
            return Ok(None);
        }

        let items = parse_list(&response.body).map_err(|e| ResolutionError::Malformed {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(items.into_iter().next())
    }

    async fn catalog(&self, name: &str) -> Result<Arc<Vec<String>>, ResolutionError> {
        let loaded = self
            .catalog
            .get_or_try_init(|| async {
                let url = self.endpoint.catalog_url();
                let response = self.get(&url, name).await.map_err(CatalogFailure::Error)?;
                if !response.is_success() {
                    return Err(CatalogFailure::Unavailable(response.status));
                }
                let names = parse_catalog(&response.body).map_err(|e| {
                    CatalogFailure::Error(ResolutionError::Malformed {
                        name: name.to_string(),
                        message: format!("catalog: {e}"),
                    })
                })?;
                info!("[RESOLVER] Loaded catalog of {} card names", names.len());
                Ok(Arc::new(names))
            })
            .await;

        match loaded {
            Ok(catalog) => Ok(catalog.clone()),
            Err(CatalogFailure::Unavailable(status)) => {
                debug!("[RESOLVER] Catalog unavailable (HTTP {}), continuing without it", status);
                Ok(Arc::new(Vec::new()))
            }
            Err(CatalogFailure::Error(e)) => Err(e),
        }
    }
}
