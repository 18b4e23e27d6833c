//! Cache Statistics Module
//!
//! Tracks how fetches were served: fresh, stale, negative, coalesced or
//! computed.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Lock-free counters updated on the fetch path.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    negative_hits: AtomicU64,
    bypasses: AtomicU64,
    misses: AtomicU64,
    coalesced_waits: AtomicU64,
    computations: AtomicU64,
    compute_failures: AtomicU64,
    refresh_enqueued: AtomicU64,
    refresh_dropped: AtomicU64,
}

macro_rules! recorder {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            pub fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    recorder! {
        record_hit => hits,
        record_stale_hit => stale_hits,
        record_negative_hit => negative_hits,
        record_bypass => bypasses,
        record_miss => misses,
        record_coalesced_wait => coalesced_waits,
        record_computation => computations,
        record_compute_failure => compute_failures,
        record_refresh_enqueued => refresh_enqueued,
        record_refresh_dropped => refresh_dropped,
    }

    /// Copies the counters into a snapshot; store-level figures are
    /// filled in by the caller.
    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        StatsSnapshot {
            hits: load(&self.hits),
            stale_hits: load(&self.stale_hits),
            negative_hits: load(&self.negative_hits),
            bypasses: load(&self.bypasses),
            misses: load(&self.misses),
            coalesced_waits: load(&self.coalesced_waits),
            computations: load(&self.computations),
            compute_failures: load(&self.compute_failures),
            refresh_enqueued: load(&self.refresh_enqueued),
            refresh_dropped: load(&self.refresh_dropped),
            ..StatsSnapshot::default()
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time view of the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Fresh Entry Store hits
    pub hits: u64,
    /// Expired entries served while a refresh was requested
    pub stale_hits: u64,
    /// Empty results served from the Negative Store
    pub negative_hits: u64,
    /// Oversized results recomputed without caching
    pub bypasses: u64,
    pub misses: u64,
    /// Fetches that waited on another request's computation
    pub coalesced_waits: u64,
    /// Compute function invocations through the cache
    pub computations: u64,
    pub compute_failures: u64,
    pub refresh_enqueued: u64,
    pub refresh_dropped: u64,
    /// Items evicted from both stores under capacity pressure
    pub evictions: u64,
    pub entries: usize,
    pub negative_entries: usize,
    pub in_flight: usize,
    pub pending_refreshes: usize,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Share of lookups answered from the cache (fresh, stale or negative).
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits + self.negative_hits;
        let total = served + self.bypasses + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}
