//! # Stop sources
//!
//! Adapters for the external stop-search services, tried in priority order by
//! the aggregator. Each adapter normalizes its provider's payload into
//! [`Stop`] records and drops any record without a finite coordinate.
//!
//! The requested [`Mode`] is accepted but not forwarded as a filter: neither
//! upstream supports it reliably, so stops of any mode may be returned.

mod transitland;
mod transport_rest;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use self::transitland::Transitland;
pub use self::transport_rest::TransportRest;
use crate::model::{Coordinate, Mode, Stop};
use crate::provider::Provider;
use crate::upstream::number;

/// Search radius around the city center, in meters.
pub const SEARCH_RADIUS_METERS: u32 = 5_000;

/// A provider of stops near a coordinate.
#[async_trait]
pub trait StopSource<P: Provider>: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch stops near `center`. An empty result is not an error.
    async fn fetch_stops(&self, provider: &P, center: Coordinate, mode: Mode) -> Result<Vec<Stop>>;
}

/// The default source chain: transport.rest, then Transitland.
#[must_use]
pub fn default_sources<P: Provider>() -> Vec<Box<dyn StopSource<P>>> {
    vec![Box::new(TransportRest), Box::new(Transitland)]
}

// GeoJSON point: `{"geometry": {"coordinates": [lon, lat]}}`.
fn geometry_point(record: &Value) -> Option<Coordinate> {
    let coords = record.get("geometry")?.get("coordinates")?.as_array()?;
    let lon = number(coords.first()?)?;
    let lat = number(coords.get(1)?)?;
    Coordinate::new(lat, lon)
}

fn point(lat: Option<&Value>, lon: Option<&Value>) -> Option<Coordinate> {
    Coordinate::new(number(lat?)?, number(lon?)?)
}
