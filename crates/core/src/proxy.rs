//! URL construction for the CORS proxy in front of the card database.
//!
//! Every upstream request goes through a single proxy endpoint:
//!
//! - `?path=/cards/search&q=name:"..."` for metadata (JSON)
//! - `?path=/cards/SOR/010&format=image` for a printing's artwork
//! - `?url=https://...` to pass through an image hosted on the upstream's domain

use crate::FetchError;
use log::trace;
use url::Url;

/// Width numeric collector numbers are zero-padded to in image paths.
const NUMBER_WIDTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    base: Url,
    upstream_domain: String,
}

impl ProxyEndpoint {
    pub fn new(base: &str, upstream_domain: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?,
            upstream_domain: upstream_domain.into().to_ascii_lowercase(),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn upstream_domain(&self) -> &str {
        &self.upstream_domain
    }

    fn with_query(&self, pairs: &[(&str, &str)]) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut().extend_pairs(pairs);
        url.into()
    }

    /// Exact-name search: `name:"<name>"` as the query filter. Double quotes
    /// inside the name would end the filter early and are dropped.
    pub fn search_url(&self, name: &str) -> String {
        let query = format!("name:\"{}\"", name.replace('"', "").trim());
        self.with_query(&[("path", "/cards/search"), ("q", &query)])
    }

    /// The full list of known card names.
    pub fn catalog_url(&self) -> String {
        self.with_query(&[("path", "/catalog/card-names")])
    }

    /// Artwork of one printing, answered as image bytes.
    pub fn card_image_url(&self, set_code: &str, number: &str) -> String {
        let path = card_image_path(set_code, number);
        self.with_query(&[("path", &path), ("format", "image")])
    }

    /// Opaque pass-through fetch of `target`.
    pub fn passthrough_url(&self, target: &str) -> String {
        self.with_query(&[("url", target)])
    }

    /// True when `host` is the upstream domain or one of its subdomains.
    pub fn is_upstream_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.upstream_domain
            || host
                .strip_suffix(&self.upstream_domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Where to fetch a direct image URL from: through the proxy for the
    /// upstream's own hosts, straight from the source otherwise.
    pub fn route_image(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        match parsed.host_str() {
            Some(host) if self.is_upstream_host(host) => {
                trace!("[FETCH] routing {} through proxy", url);
                Ok(self.passthrough_url(parsed.as_str()))
            }
            Some(_) => Ok(parsed.into()),
            None => Err(FetchError::InvalidUrl(url.to_string())),
        }
    }
}

/// `/cards/{SET}/{NNN}`: upper-cased set code, numeric numbers padded to three digits.
pub fn card_image_path(set_code: &str, number: &str) -> String {
    let number = number.trim();
    let number = if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
        format!("{:0>width$}", number, width = NUMBER_WIDTH)
    } else {
        number.to_string()
    };
    format!("/cards/{}/{}", set_code.trim().to_uppercase(), number)
}
