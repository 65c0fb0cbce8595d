//! # Geocoder
//!
//! Resolves a free-text city name to a coordinate using a Nominatim-compatible
//! place search.

use std::time::Duration;

use anyhow::{Context, Result};
use realtime::{Config, Error, HttpRequest, not_found};
use serde::Deserialize;
use serde_json::Value;
use urlencoding::encode;

use crate::model::Coordinate;
use crate::upstream::{self, number};

const UPSTREAM: &str = "geocoder";
const DEFAULT_URL: &str = "https://nominatim.openstreetmap.org/search";
const TIMEOUT: Duration = Duration::from_secs(8);

/// Center used whenever a city cannot be geocoded (Munich).
pub const DEFAULT_CENTER: Coordinate = Coordinate { latitude: 48.1351, longitude: 11.5820 };

#[derive(Deserialize)]
struct Place {
    #[serde(default)]
    lat: Value,
    #[serde(default)]
    lon: Value,
}

/// Look up the center of `city`.
///
/// # Errors
///
/// Returns an error when the search service is unreachable, times out, finds
/// nothing, or reports a non-finite coordinate.
pub async fn resolve_center<P>(city: &str, provider: &P) -> Result<Coordinate>
where
    P: Config + HttpRequest,
{
    let base = upstream::setting(provider, "GEOCODER_URL", DEFAULT_URL).await;
    let url = format!("{base}?q={}&format=json&addressdetails=0&limit=1", encode(city));

    let places: Vec<Place> = upstream::get_json(provider, UPSTREAM, &url, TIMEOUT).await?;
    let Some(place) = places.into_iter().next() else {
        return Err(not_found!("could not geocode city: {city}").into());
    };

    let center = number(&place.lat)
        .zip(number(&place.lon))
        .and_then(|(lat, lon)| Coordinate::new(lat, lon))
        .ok_or_else(|| Error::InvalidFormat(format!("no usable coordinate for {city}")))
        .context("reading geocoder match")?;

    Ok(center)
}

/// Look up the center of `city`, substituting [`DEFAULT_CENTER`] on any
/// failure.
pub async fn resolve_center_or_default<P>(city: &str, provider: &P) -> Coordinate
where
    P: Config + HttpRequest,
{
    match resolve_center(city, provider).await {
        Ok(center) => center,
        Err(err) => {
            tracing::warn!(
                monotonic_counter.geocode_failures = 1,
                provider = UPSTREAM,
                city = %city,
                error = %err,
                "using default center"
            );
            DEFAULT_CENTER
        }
    }
}
