//! # Transit Gateway
//!
//! Host wiring for the transit aggregator: a real HTTP client and
//! environment-backed configuration behind the core's provider traits, cache
//! settings from the environment, and logging setup.

pub mod config;
mod provider;

use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;
use transit_aggregator::{Aggregator, ResultCache, TransitService};

pub use self::provider::HostProvider;

/// The cached transit service as deployed.
pub type Gateway = TransitService<HostProvider>;

/// Install the global `fmt` subscriber, filtered by `RUST_LOG` (default
/// `info`). Calling it again is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::trace!("tracing subscriber already installed");
    }
}

/// Build a gateway whose cache TTLs come from the environment.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be built.
pub fn gateway() -> Result<Gateway> {
    let config = config::get_cache_config();
    tracing::info!(
        cache_ttl = config.default_ttl.as_secs(),
        vehicle_cache_ttl = config.vehicle_ttl.as_secs(),
        "starting transit gateway"
    );

    let cache = Arc::new(ResultCache::new(config));
    Ok(TransitService::new(Aggregator::new(HostProvider::new()?), cache))
}

/// Build a gateway and start its cache sweeper on the current tokio runtime.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be built.
pub fn start() -> Result<(Arc<Gateway>, JoinHandle<()>)> {
    let gateway = gateway()?;
    let sweeper = gateway.cache().spawn_sweeper();
    Ok((Arc::new(gateway), sweeper))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn start_runs_sweeper() {
        init_tracing();
        init_tracing();

        let (gateway, sweeper) = start().expect("should start");
        assert!(gateway.cache().is_empty());
        assert!(gateway.cache().config().sweep_interval() >= Duration::from_secs(1));
        assert!(!sweeper.is_finished());
        sweeper.abort();
    }
}
