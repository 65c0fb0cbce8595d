//! Stop, vehicle and query types shared by every stage of the aggregation.

use std::fmt;
use std::str::FromStr;

use realtime::{Error, bad_request};
use serde::{Deserialize, Serialize};

const MIN_CITY_CHARS: usize = 2;

/// A finite latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl Coordinate {
    /// Returns `None` unless both values are finite.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if latitude.is_finite() && longitude.is_finite() {
            Some(Self { latitude, longitude })
        } else {
            None
        }
    }

    /// Shift the coordinate by the given number of degrees.
    #[must_use]
    pub fn offset(self, d_lat: f64, d_lon: f64) -> Self {
        Self { latitude: self.latitude + d_lat, longitude: self.longitude + d_lon }
    }
}

/// A transit stop, as reported by a provider or synthesized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub location: Coordinate,
}

/// An approximate vehicle position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    #[serde(flatten)]
    pub location: Coordinate,
    /// Heading in whole degrees, `0..360`.
    pub bearing: u16,
    pub speed: f64,
    pub route: String,
    pub delay_seconds: i32,
}

/// Transport mode requested by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Bus,
    Metro,
    Tram,
    Sbahn,
    Bikeshare,
    Taxi,
}

impl Mode {
    pub const ALL: [Self; 6] =
        [Self::Bus, Self::Metro, Self::Tram, Self::Sbahn, Self::Bikeshare, Self::Taxi];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bus => "bus",
            Self::Metro => "metro",
            Self::Tram => "tram",
            Self::Sbahn => "sbahn",
            Self::Bikeshare => "bikeshare",
            Self::Taxi => "taxi",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| bad_request!("unsupported mode {s:?}"))
    }
}

/// Validated client query: the only external input shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery {
    city: String,
    mode: Mode,
}

impl CityQuery {
    /// Validate a raw city name and optional mode. A missing mode defaults to
    /// [`Mode::Bus`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] when the city is shorter than two
    /// characters or the mode is not recognised.
    pub fn new(city: &str, mode: Option<&str>) -> realtime::Result<Self> {
        if city.chars().count() < MIN_CITY_CHARS {
            return Err(bad_request!("city must be at least {MIN_CITY_CHARS} characters long"));
        }
        let mode = mode.map(str::parse::<Mode>).transpose()?.unwrap_or_default();
        Ok(Self { city: city.to_string(), mode })
    }

    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }
}
