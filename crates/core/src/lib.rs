//! # cardsheet-core
//!
//! Turns card names into decoded artwork:
//! - **resolver**: name → printing or image URL, via exact search then catalog fallback
//! - **fetcher**: resolved card → bitmap, with retries and decoding
//! - **cache**: session-lifetime raw-byte and bitmap caches
//! - **retry**: the declarative retry policy shared by every fetch
//! - **proxy**: URL construction for the CORS proxy
//!
//! All network access goes through the `HttpTransport` trait, so nothing in
//! this crate depends on a particular HTTP client.

// Re-export foundation crates
pub use cardsheet_traits as traits;
pub use cardsheet_types as types;

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod loader;
pub mod proxy;
pub mod record;
pub mod resolver;
pub mod retry;

pub use cache::{ImageCache, SharedBitmap, name_key};
pub use error::{CardError, FetchError, ResolutionError};
pub use fetcher::{ImageFetcher, decode_image};
pub use loader::CardLoader;
pub use proxy::ProxyEndpoint;
pub use record::CardRecord;
pub use resolver::CardResolver;
pub use retry::{RetryPolicy, RetryableError, retry};
