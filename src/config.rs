//! Configuration Module
//!
//! Cache sizing and expiry settings, loadable from environment variables.

use std::env;
use std::time::Duration;

/// Default maximum number of cached results
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// Default time-to-live of a cached result, in seconds
pub const DEFAULT_CACHE_TTL: u64 = 10;

/// Default interval between background sweeps, in seconds
pub const DEFAULT_CLEANUP_INTERVAL: u64 = 1;

/// Caching layer configuration.
///
/// Missing, unparsable or zero values always fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Lifetime of an entry, measured from insertion
    pub ttl: Duration,
    /// Interval between background expired-entry sweeps
    pub cleanup_interval: Duration,
}

impl CacheConfig {
    /// Creates a config from optional size and TTL (seconds).
    ///
    /// `None` or `0` selects the default for that field.
    pub fn new(cache_size: Option<usize>, cache_ttl: Option<u64>) -> Self {
        Self {
            capacity: positive(cache_size).unwrap_or(DEFAULT_CACHE_SIZE),
            ttl: Duration::from_secs(positive(cache_ttl).unwrap_or(DEFAULT_CACHE_TTL)),
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL),
        }
    }

    /// Sets the sweep interval; zero keeps the current value.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.cleanup_interval = interval;
        }
        self
    }

    /// Replaces zero fields with their defaults.
    ///
    /// Applied to every config handed to the caching layer, so a struct
    /// literal with zero values behaves like [`CacheConfig::new`].
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            capacity: positive(Some(self.capacity)).unwrap_or(defaults.capacity),
            ttl: positive(Some(self.ttl)).unwrap_or(defaults.ttl),
            cleanup_interval: positive(Some(self.cleanup_interval))
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FLAG_CACHE_SIZE` - Maximum cache entries (default: 100)
    /// - `FLAG_CACHE_TTL` - Entry lifetime in seconds (default: 10)
    /// - `FLAG_CACHE_CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`CacheConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_u64 = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        let cache_size = lookup("FLAG_CACHE_SIZE").and_then(|v| v.trim().parse::<usize>().ok());
        let cache_ttl = parse_u64("FLAG_CACHE_TTL");
        let cleanup = positive(parse_u64("FLAG_CACHE_CLEANUP_INTERVAL"))
            .unwrap_or(DEFAULT_CLEANUP_INTERVAL);

        Self::new(cache_size, cache_ttl).with_cleanup_interval(Duration::from_secs(cleanup))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_SIZE,
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL),
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL),
        }
    }
}

fn positive<T: Default + PartialOrd>(value: Option<T>) -> Option<T> {
    value.filter(|v| *v > T::default())
}
