//! # Realtime Core
//!
//! Core error types and host capability traits shared by the gateway crates.

mod error;
mod provider;

pub use crate::error::*;
pub use crate::provider::*;
