//! # Provider
//!
//! Provider defines external data interfaces for the crate.

pub use realtime::{Config, HttpRequest};

/// Provider entry point implemented by the host application.
pub trait Provider: HttpRequest + Config {}

impl<T> Provider for T where T: HttpRequest + Config {}
