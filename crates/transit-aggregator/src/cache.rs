//! # Result cache
//!
//! Short-lived, in-process store in front of the aggregator. Entries are keyed
//! by query kind, lower-cased city and mode. Stop entries use the default TTL;
//! vehicle entries are written with a much shorter TTL because positions go
//! stale quickly. Expired entries read as misses and are removed by
//! [`ResultCache::sweep`].

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::model::{Mode, Stop, Vehicle};

const DEFAULT_TTL: Duration = Duration::from_secs(300);
const VEHICLE_TTL: Duration = Duration::from_secs(10);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Source of the current time, replaceable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// TTL settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for entries written without an override (stops).
    pub default_ttl: Duration,
    /// TTL override used for vehicle entries.
    pub vehicle_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { default_ttl: DEFAULT_TTL, vehicle_ttl: VEHICLE_TTL }
    }
}

impl CacheConfig {
    /// Sweep at least twice per shortest TTL, and at least once a minute.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        (self.default_ttl.min(self.vehicle_ttl) / 2).clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Stops,
    Vehicles,
}

impl QueryKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stops => "stops",
            Self::Vehicles => "vehicles",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: QueryKind,
    city: String,
    mode: Mode,
}

impl CacheKey {
    /// Build a key; the city is lower-cased so lookups are case-insensitive.
    #[must_use]
    pub fn new(kind: QueryKind, city: &str, mode: Mode) -> Self {
        Self { kind, city: city.to_lowercase(), mode }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind.as_str(), self.city, self.mode)
    }
}

/// A cached result. Clones share the underlying allocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Stops(Arc<[Stop]>),
    Vehicles(Arc<[Vehicle]>),
}

struct Entry {
    payload: Payload,
    // `None` when the TTL runs past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

pub struct ResultCache<C: Clock = SystemClock> {
    entries: DashMap<CacheKey, Entry>,
    config: CacheConfig,
    clock: C,
}

impl ResultCache<SystemClock> {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for ResultCache<SystemClock> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<C: Clock> ResultCache<C> {
    #[must_use]
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self { entries: DashMap::new(), config, clock }
    }

    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a live entry.
    pub fn get(&self, key: &CacheKey) -> Option<Payload> {
        let now = self.clock.now();
        {
            let entry = self.entries.get(key)?;
            if entry.is_live(now) {
                return Some(entry.payload.clone());
            }
        }

        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    /// Store `payload`, expiring after `ttl` or the default TTL. A TTL too
    /// large to represent never expires.
    pub fn set(&self, key: CacheKey, payload: Payload, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let expires_at = self.clock.now().checked_add(ttl);
        self.entries.insert(key, Entry { payload, expires_at });
    }

    pub fn get_stops(&self, city: &str, mode: Mode) -> Option<Arc<[Stop]>> {
        match self.get(&CacheKey::new(QueryKind::Stops, city, mode))? {
            Payload::Stops(stops) => Some(stops),
            Payload::Vehicles(_) => None,
        }
    }

    pub fn get_vehicles(&self, city: &str, mode: Mode) -> Option<Arc<[Vehicle]>> {
        match self.get(&CacheKey::new(QueryKind::Vehicles, city, mode))? {
            Payload::Vehicles(vehicles) => Some(vehicles),
            Payload::Stops(_) => None,
        }
    }

    /// Stops are written with the default TTL.
    pub fn set_stops(&self, city: &str, mode: Mode, stops: Arc<[Stop]>) {
        self.set(CacheKey::new(QueryKind::Stops, city, mode), Payload::Stops(stops), None);
    }

    /// Vehicles are written with the short vehicle TTL.
    pub fn set_vehicles(&self, city: &str, mode: Mode, vehicles: Arc<[Vehicle]>) {
        let key = CacheKey::new(QueryKind::Vehicles, city, mode);
        self.set(key, Payload::Vehicles(vehicles), Some(self.config.vehicle_ttl));
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = entry.is_live(now);
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    /// Number of stored entries, including expired but unswept ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Clock + 'static> ResultCache<C> {
    /// Sweep expired entries every [`CacheConfig::sweep_interval`] on the
    /// current tokio runtime. The task ends once the cache is dropped.
    #[must_use]
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        let period = self.config.sweep_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.sweep();
                if removed > 0 {
                    tracing::debug!(
                        removed,
                        remaining = cache.len(),
                        "swept expired cache entries"
                    );
                }
            }
        })
    }
}

impl<C: Clock> fmt::Debug for ResultCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Coordinate;

    #[derive(Clone)]
    struct ManualClock {
        now: Arc<Mutex<Instant>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self { now: Arc::new(Mutex::new(Instant::now())) }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().expect("should lock") += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().expect("should lock")
        }
    }

    // Follows tokio's paused clock.
    struct TokioClock;

    impl Clock for TokioClock {
        fn now(&self) -> Instant {
            tokio::time::Instant::now().into_std()
        }
    }

    fn sample_stops() -> Arc<[Stop]> {
        Arc::from(vec![Stop {
            id: "mock-stop-0".to_string(),
            name: "Munich Stop 1".to_string(),
            location: Coordinate { latitude: 48.13, longitude: 11.58 },
        }])
    }

    fn sample_vehicles() -> Arc<[Vehicle]> {
        Arc::from(vec![Vehicle {
            id: "veh-bus-0".to_string(),
            location: Coordinate { latitude: 48.13, longitude: 11.58 },
            bearing: 90,
            speed: 12.0,
            route: "R1".to_string(),
            delay_seconds: -15,
        }])
    }

    #[test]
    fn key_is_case_insensitive() {
        let key = CacheKey::new(QueryKind::Stops, "MuNiCh", Mode::Bus);
        assert_eq!(key, CacheKey::new(QueryKind::Stops, "munich", Mode::Bus));
        assert_eq!(key.to_string(), "stops:munich:bus");
        assert_ne!(key, CacheKey::new(QueryKind::Stops, "munich", Mode::Tram));
        assert_ne!(key, CacheKey::new(QueryKind::Vehicles, "munich", Mode::Bus));
    }

    #[test]
    fn hit_returns_same_allocation() {
        let cache = ResultCache::default();
        let stops = sample_stops();
        cache.set_stops("Munich", Mode::Bus, Arc::clone(&stops));

        let cached = cache.get_stops("munich", Mode::Bus).expect("should hit");
        assert!(Arc::ptr_eq(&cached, &stops));
    }

    #[test]
    fn stops_and_vehicles_expire_independently() {
        let clock = ManualClock::new();
        let cache = ResultCache::with_clock(CacheConfig::default(), clock.clone());
        cache.set_stops("Berlin", Mode::Bus, sample_stops());
        cache.set_vehicles("Berlin", Mode::Bus, sample_vehicles());

        clock.advance(Duration::from_secs(9));
        assert!(cache.get_vehicles("Berlin", Mode::Bus).is_some());

        clock.advance(Duration::from_secs(2));
        assert!(cache.get_vehicles("Berlin", Mode::Bus).is_none());
        assert!(cache.get_stops("Berlin", Mode::Bus).is_some());

        clock.advance(Duration::from_secs(300));
        assert!(cache.get_stops("Berlin", Mode::Bus).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn explicit_ttl_overrides_default() {
        let clock = ManualClock::new();
        let cache = ResultCache::with_clock(CacheConfig::default(), clock.clone());
        let key = CacheKey::new(QueryKind::Stops, "Paris", Mode::Metro);
        cache.set(key.clone(), Payload::Stops(sample_stops()), Some(Duration::from_secs(1)));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn zero_ttl_never_hits() {
        let config = CacheConfig { default_ttl: Duration::ZERO, vehicle_ttl: Duration::ZERO };
        let cache = ResultCache::new(config);
        cache.set_stops("Vienna", Mode::Tram, sample_stops());
        assert!(cache.get_stops("Vienna", Mode::Tram).is_none());
    }

    #[test]
    fn huge_ttl_never_expires() {
        let clock = ManualClock::new();
        let config = CacheConfig { default_ttl: Duration::MAX, vehicle_ttl: Duration::MAX };
        let cache = ResultCache::with_clock(config, clock.clone());
        cache.set_stops("Munich", Mode::Bus, sample_stops());
        cache.set_vehicles("Munich", Mode::Bus, sample_vehicles());

        clock.advance(Duration::from_secs(86_400 * 365));
        assert!(cache.get_stops("munich", Mode::Bus).is_some());
        assert!(cache.get_vehicles("munich", Mode::Bus).is_some());
        assert_eq!(cache.sweep(), 0);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let clock = ManualClock::new();
        let cache = ResultCache::with_clock(CacheConfig::default(), clock.clone());
        cache.set_stops("Hamburg", Mode::Sbahn, sample_stops());
        cache.set_vehicles("Hamburg", Mode::Sbahn, sample_vehicles());

        clock.advance(Duration::from_secs(30));
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_stops("hamburg", Mode::Sbahn).is_some());
    }

    #[test]
    fn sweep_interval_tracks_shortest_ttl() {
        assert_eq!(CacheConfig::default().sweep_interval(), Duration::from_secs(5));

        let long = CacheConfig {
            default_ttl: Duration::from_secs(3_600),
            vehicle_ttl: Duration::from_secs(600),
        };
        assert_eq!(long.sweep_interval(), Duration::from_secs(60));

        let tiny = CacheConfig { default_ttl: Duration::from_secs(1), vehicle_ttl: Duration::ZERO };
        assert_eq!(tiny.sweep_interval(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_stops_with_cache() {
        let cache = Arc::new(ResultCache::default());
        let handle = cache.spawn_sweeper();
        drop(cache);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_removes_expired_entries() {
        let cache = Arc::new(ResultCache::with_clock(CacheConfig::default(), TokioClock));
        let handle = cache.spawn_sweeper();
        cache.set_vehicles("Munich", Mode::Bus, sample_vehicles());
        cache.set_stops("Munich", Mode::Bus, sample_stops());
        assert_eq!(cache.len(), 2);

        // vehicle TTL (10s) plus one sweep interval (5s)
        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(cache.len(), 1);

        handle.abort();
    }
}
