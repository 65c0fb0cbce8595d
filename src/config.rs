use std::time::Duration;

use transit_aggregator::CacheConfig;

// Anything longer is treated as a misconfiguration.
const MAX_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Cache TTLs from `CACHE_TTL` and `VEHICLE_CACHE_TTL`, in whole seconds.
#[must_use]
pub fn get_cache_config() -> CacheConfig {
    let defaults = CacheConfig::default();
    CacheConfig {
        default_ttl: get_ttl("CACHE_TTL", defaults.default_ttl),
        vehicle_ttl: get_ttl("VEHICLE_CACHE_TTL", defaults.vehicle_ttl),
    }
}

fn get_ttl(key: &str, default: Duration) -> Duration {
    parse_ttl(key, std::env::var(key).ok().as_deref(), default)
}

fn parse_ttl(key: &str, value: Option<&str>, default: Duration) -> Duration {
    let Some(value) = value else {
        tracing::trace!("{key} not set, using default: {}s", default.as_secs());
        return default;
    };

    match value.trim().parse::<u64>().map(Duration::from_secs) {
        Ok(ttl) if ttl <= MAX_TTL => ttl,
        Ok(_) => {
            tracing::warn!("{key} exceeds {}s: {value:?}, using default", MAX_TTL.as_secs());
            default
        }
        Err(_) => {
            tracing::warn!("{key} is not a whole number of seconds: {value:?}, using default");
            default
        }
    }
}
