//! # Aggregator
//!
//! Resolves stops for a city by geocoding it, trying each stop source in
//! priority order, and falling back to synthetic stops. The first source with
//! a non-empty answer wins and its stops are returned as-is.
//!
//! Vehicles are always derived from the resolved stops: there is no live
//! vehicle feed yet.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::geocoder;
use crate::model::{Coordinate, Mode, Stop, Vehicle};
use crate::provider::Provider;
use crate::sources::{self, StopSource};
use crate::synthetic;

pub struct Aggregator<P: Provider> {
    provider: P,
    sources: Vec<Box<dyn StopSource<P>>>,
    rng: Mutex<StdRng>,
}

impl<P: Provider> Aggregator<P> {
    /// Create an aggregator using the default source chain.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            sources: sources::default_sources(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the source chain. Sources are tried in the given order.
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<Box<dyn StopSource<P>>>) -> Self {
        self.sources = sources;
        self
    }

    /// Seed the synthetic-data generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Stops for `city`. Never empty: provider failures are logged and
    /// recovered from, and synthetic stops are the last resort.
    pub async fn stops_for_city(&self, city: &str, mode: Mode) -> Vec<Stop> {
        let center = geocoder::resolve_center_or_default(city, &self.provider).await;
        self.stops_near(city, center, mode).await
    }

    /// Vehicles for `city`, placed near the stops [`Self::stops_for_city`]
    /// resolves.
    pub async fn vehicles_for_city(&self, city: &str, mode: Mode) -> Vec<Vehicle> {
        let stops = self.stops_for_city(city, mode).await;
        let mut rng = self.rng();
        synthetic::vehicles(city, mode, &stops, &mut *rng)
    }

    async fn stops_near(&self, city: &str, center: Coordinate, mode: Mode) -> Vec<Stop> {
        for source in &self.sources {
            match source.fetch_stops(&self.provider, center, mode).await {
                Ok(stops) if !stops.is_empty() => {
                    tracing::debug!(
                        provider = source.name(),
                        count = stops.len(),
                        "stops resolved"
                    );
                    return stops;
                }
                Ok(_) => {
                    tracing::debug!(provider = source.name(), city = %city, "no stops returned");
                }
                Err(err) => {
                    tracing::warn!(
                        monotonic_counter.stop_source_failures = 1,
                        provider = source.name(),
                        error = %err,
                        "stops fetch failed"
                    );
                }
            }
        }

        tracing::info!(monotonic_counter.synthetic_fallbacks = 1, city = %city, mode = %mode);
        let mut rng = self.rng();
        synthetic::stops(city, center, &mut *rng)
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: Provider> fmt::Debug for Aggregator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|source| source.name()).collect();
        f.debug_struct("Aggregator").field("sources", &names).finish_non_exhaustive()
    }
}
