//! Cached front for the aggregator: the entry point used by request handlers.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::aggregator::Aggregator;
use crate::cache::{Clock, ResultCache, SystemClock};
use crate::model::{CityQuery, Stop, Vehicle};
use crate::provider::Provider;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Source {
    #[serde(rename = "cache")]
    Cache,
    #[serde(rename = "transit_aggregator")]
    Aggregator,
}

/// Response data tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub source: Source,
    pub data: Arc<[T]>,
}

pub struct TransitService<P: Provider, C: Clock = SystemClock> {
    aggregator: Aggregator<P>,
    cache: Arc<ResultCache<C>>,
}

impl<P: Provider, C: Clock> TransitService<P, C> {
    #[must_use]
    pub const fn new(aggregator: Aggregator<P>, cache: Arc<ResultCache<C>>) -> Self {
        Self { aggregator, cache }
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<ResultCache<C>> {
        &self.cache
    }

    /// Stops for the query, from the cache when still fresh.
    pub async fn stops(&self, query: &CityQuery) -> Sourced<Stop> {
        let (city, mode) = (query.city(), query.mode());

        if let Some(data) = self.cache.get_stops(city, mode) {
            tracing::debug!(
                monotonic_counter.cache_hits = 1, kind = "stops", city = %city, mode = %mode
            );
            return Sourced { source: Source::Cache, data };
        }

        let data: Arc<[Stop]> = self.aggregator.stops_for_city(city, mode).await.into();
        self.cache.set_stops(city, mode, Arc::clone(&data));
        Sourced { source: Source::Aggregator, data }
    }

    /// Vehicles for the query, from the cache when still fresh.
    pub async fn vehicles(&self, query: &CityQuery) -> Sourced<Vehicle> {
        let (city, mode) = (query.city(), query.mode());

        if let Some(data) = self.cache.get_vehicles(city, mode) {
            tracing::debug!(
                monotonic_counter.cache_hits = 1, kind = "vehicles", city = %city, mode = %mode
            );
            return Sourced { source: Source::Cache, data };
        }

        let data: Arc<[Vehicle]> = self.aggregator.vehicles_for_city(city, mode).await.into();
        self.cache.set_vehicles(city, mode, Arc::clone(&data));
        Sourced { source: Source::Aggregator, data }
    }
}

impl<P: Provider, C: Clock> fmt::Debug for TransitService<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitService")
            .field("aggregator", &self.aggregator)
            .field("cache", &self.cache)
            .finish()
    }
}
