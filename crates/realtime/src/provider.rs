//! # Provider
//!
//! Capabilities the host supplies to the gateway core: outbound HTTP and
//! configuration lookup.

use anyhow::Result;
use bytes::Bytes;
use http::{Request, Response};

/// The `HttpRequest` trait defines the behavior for fetching data from a source.
pub trait HttpRequest: Send + Sync {
    /// Make outbound HTTP request.
    fn fetch(&self, request: Request<Vec<u8>>)
    -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

/// The `Config` trait is used by implementers to provide configuration from
/// the host to dependent crates.
pub trait Config: Send + Sync {
    /// Request configuration setting. An error means the setting is not
    /// available.
    fn get(&self, key: &str) -> impl Future<Output = Result<String>> + Send;
}
