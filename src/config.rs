//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

/// Smallest Entry Store capacity; lower values are clamped up to it.
pub const MIN_ENTRY_CAPACITY: usize = 10;

/// Longest TTL or stale window honoured; larger values are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Default upper bound for a result stored in the Entry Store
pub const DEFAULT_MAX_ACCEPTED_BYTES: usize = 1024 * 1024; // 1 MB

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Run with the response cache
    pub cache_enabled: bool,
    /// Maximum number of items in the Entry Store
    pub entry_max_size: usize,
    /// Entry TTL in seconds
    pub entry_ttl: u64,
    /// Maximum number of items in the Negative Store
    pub negative_max_size: usize,
    /// Negative entry TTL in seconds
    pub negative_ttl: u64,
    /// Largest result (bytes) accepted into the Entry Store
    pub max_accepted_bytes: usize,
    /// Items evicted per prune, 0 = capacity / 20 + 1
    pub prune_batch: usize,
    /// Seconds a stale entry may still be served before the sweep drops it
    pub max_stale: u64,
    /// Refresh queue bound
    pub refresh_queue_capacity: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Seconds to wait for in-flight computations on shutdown
    pub shutdown_timeout: u64,
    /// Request parameter bounds
    pub limits: ParameterLimits,
}

/// Bounds applied when validating request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterLimits {
    /// Maximum value for `nbOne` and `nbTwo`
    pub max_nb: u64,
    /// Maximum value for `limit`
    pub max_limit: u64,
    /// Maximum byte length of `strOne` and `strTwo`
    pub max_str_chars: usize,
}

impl Default for ParameterLimits {
    fn default() -> Self {
        Self {
            max_nb: 100_000,
            max_limit: 100_000,
            max_str_chars: 100,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CACHE_ENABLED` - Enable the response cache (default: true)
    /// - `CACHE_ENTRY_MAX_SIZE` - Entry Store capacity (default: 1000, min 10)
    /// - `CACHE_ENTRY_TTL` - Entry TTL in seconds (default: 300)
    /// - `CACHE_NEGATIVE_MAX_SIZE` - Negative Store capacity (default: 1000)
    /// - `CACHE_NEGATIVE_TTL` - Negative TTL in seconds (default: 60)
    /// - `CACHE_MAX_ACCEPTED_BYTES` - Largest cached result (default: 1 MB)
    /// - `CACHE_PRUNE_BATCH` - Items evicted per prune (default: 0 = auto)
    /// - `CACHE_MAX_STALE` - Stale serving window in seconds (default: 3600)
    /// - `REFRESH_QUEUE_CAPACITY` - Refresh queue bound (default: 1000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 30)
    /// - `SHUTDOWN_TIMEOUT` - Drain timeout in seconds (default: 5)
    /// - `MAX_NB`, `MAX_LIMIT`, `MAX_STR_CHARS` - Parameter bounds
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache_enabled: env_or("CACHE_ENABLED", defaults.cache_enabled),
            entry_max_size: env_or("CACHE_ENTRY_MAX_SIZE", defaults.entry_max_size),
            entry_ttl: env_or("CACHE_ENTRY_TTL", defaults.entry_ttl),
            negative_max_size: env_or("CACHE_NEGATIVE_MAX_SIZE", defaults.negative_max_size),
            negative_ttl: env_or("CACHE_NEGATIVE_TTL", defaults.negative_ttl),
            max_accepted_bytes: env_or("CACHE_MAX_ACCEPTED_BYTES", defaults.max_accepted_bytes),
            prune_batch: env_or("CACHE_PRUNE_BATCH", defaults.prune_batch),
            max_stale: env_or("CACHE_MAX_STALE", defaults.max_stale),
            refresh_queue_capacity: env_or(
                "REFRESH_QUEUE_CAPACITY",
                defaults.refresh_queue_capacity,
            ),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            shutdown_timeout: env_or("SHUTDOWN_TIMEOUT", defaults.shutdown_timeout),
            limits: ParameterLimits {
                max_nb: env_or("MAX_NB", defaults.limits.max_nb),
                max_limit: env_or("MAX_LIMIT", defaults.limits.max_limit),
                max_str_chars: env_or("MAX_STR_CHARS", defaults.limits.max_str_chars),
            },
        }
    }

    /// The cache section of the configuration.
    pub fn cache(&self) -> CacheConfig {
        CacheConfig {
            entry_max_size: self.entry_max_size,
            entry_ttl: Duration::from_secs(self.entry_ttl),
            negative_max_size: self.negative_max_size,
            negative_ttl: Duration::from_secs(self.negative_ttl),
            max_accepted_bytes: self.max_accepted_bytes,
            prune_batch: self.prune_batch,
            max_stale: Duration::from_secs(self.max_stale),
            refresh_queue_capacity: self.refresh_queue_capacity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            cache_enabled: true,
            entry_max_size: 1000,
            entry_ttl: 300,
            negative_max_size: 1000,
            negative_ttl: 60,
            max_accepted_bytes: DEFAULT_MAX_ACCEPTED_BYTES,
            prune_batch: 0,
            max_stale: 3600,
            refresh_queue_capacity: 1000,
            cleanup_interval: 30,
            shutdown_timeout: 5,
            limits: ParameterLimits::default(),
        }
    }
}

// == Cache Config ==
/// Size limits and TTLs of the response cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub entry_max_size: usize,
    pub entry_ttl: Duration,
    pub negative_max_size: usize,
    pub negative_ttl: Duration,
    pub max_accepted_bytes: usize,
    /// 0 picks capacity / 20 + 1 for each store
    pub prune_batch: usize,
    pub max_stale: Duration,
    pub refresh_queue_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Config::default().cache()
    }
}

fn positive<T: PartialEq + Default>(name: &'static str, value: T) -> Result<(), ConfigError> {
    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn capped(name: &str, value: Duration) -> Duration {
    if value > MAX_TTL {
        warn!("{} of {}s above maximum, using {}s", name, value.as_secs(), MAX_TTL.as_secs());
        return MAX_TTL;
    }
    value
}

impl CacheConfig {
    /// Checks the configuration and applies clamping.
    ///
    /// The Entry Store capacity is raised to [`MIN_ENTRY_CAPACITY`] and
    /// durations are capped at [`MAX_TTL`].
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        positive("entry_ttl", self.entry_ttl)?;
        positive("negative_ttl", self.negative_ttl)?;
        positive("negative_max_size", self.negative_max_size)?;
        positive("max_accepted_bytes", self.max_accepted_bytes)?;
        positive("refresh_queue_capacity", self.refresh_queue_capacity)?;

        self.entry_ttl = capped("entry_ttl", self.entry_ttl);
        self.negative_ttl = capped("negative_ttl", self.negative_ttl);
        self.max_stale = capped("max_stale", self.max_stale);

        if self.entry_max_size < MIN_ENTRY_CAPACITY {
            warn!(
                "entry_max_size {} below minimum, using {}",
                self.entry_max_size, MIN_ENTRY_CAPACITY
            );
            self.entry_max_size = MIN_ENTRY_CAPACITY;
        }

        Ok(self)
    }

    /// Items evicted per prune for a store of `capacity` items.
    pub fn prune_batch_for(&self, capacity: usize) -> usize {
        let batch = if self.prune_batch == 0 {
            capacity / 20 + 1
        } else {
            self.prune_batch
        };
        batch.clamp(1, capacity.max(1))
    }
}
