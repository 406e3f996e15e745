//! Transport implementations for the cardsheet pipeline.
//!
//! This crate provides the network-backed implementation of the
//! `HttpTransport` trait from cardsheet-traits.
//!
//! ## Available Transports
//!
//! - [`ReqwestTransport`]: Real HTTP through a pooled `reqwest::Client`
//!
//! ## Re-exports
//!
//! For convenience, we also re-export the scripted transport from cardsheet-traits:
//! - [`InMemoryTransport`]: Pre-populated routes, used by tests and offline runs

mod http;

pub use http::ReqwestTransport;

pub use cardsheet_traits::InMemoryTransport;
