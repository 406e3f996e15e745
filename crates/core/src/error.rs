//! Error types for resolution and fetching. Both are per-card: the sheet
//! builder turns them into failure markers instead of aborting a build.

use cardsheet_traits::TransportError;
use std::time::Duration;
use thiserror::Error;

/// No image reference could be derived for a requested name.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("No card matches \"{0}\"")]
    NoMatch(String),
    #[error("Card \"{0}\" has neither a set/number nor an image URL")]
    NoImage(String),
    #[error("Upstream request for \"{name}\" failed: {source}")]
    Upstream {
        name: String,
        #[source]
        source: TransportError,
    },
    #[error("Malformed upstream response for \"{name}\": {message}")]
    Malformed { name: String, message: String },
    #[error("Lookup of \"{name}\" timed out after {after:?}")]
    Timeout { name: String, after: Duration },
}

/// An image could not be retrieved or decoded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("'{url}' answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Could not decode image from '{url}': {message}")]
    Decode { url: String, message: String },
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Timeouts, HTTP errors and connection failures are worth another
    /// attempt. Bad URLs and undecodable bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Status { .. } => true,
            FetchError::Transport(TransportError::InvalidUrl(_)) => false,
            FetchError::Transport(_) => true,
            FetchError::Decode { .. } | FetchError::InvalidUrl(_) => false,
        }
    }
}

/// Everything that can go wrong while turning one name into a bitmap.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CardError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The load was cut short before it produced a result.
    #[error("Loading was interrupted before it finished")]
    Interrupted,
}
