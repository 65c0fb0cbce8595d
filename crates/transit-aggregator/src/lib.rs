//! # Transit Aggregator
//!
//! Resolves stops and approximate vehicle positions for a city. Stops come
//! from the first external provider that answers, with synthetic data as a
//! guaranteed fallback; results are cached with separate TTLs for stops and
//! vehicles.

mod aggregator;
mod service;
mod upstream;

pub mod cache;
pub mod geocoder;
pub mod model;
pub mod provider;
pub mod sources;
pub mod synthetic;

pub use self::aggregator::Aggregator;
pub use self::cache::{CacheConfig, ResultCache};
pub use self::model::{CityQuery, Coordinate, Mode, Stop, Vehicle};
pub use self::provider::Provider;
pub use self::service::{Source, Sourced, TransitService};
pub use self::upstream::CLIENT_ID;
