//! Response Cache Module
//!
//! The fetch surface used by the request handler. Orchestrates the Entry
//! Store, the Negative Store, the coalescing gate and the refresh queue.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::{
    BoundedStore, CacheKey, CacheStats, CoalescingGate, ComputeFn, Lookup, NegativeResult,
    OwnershipGuard, RefreshQueue, StatsSnapshot,
};
use crate::config::CacheConfig;
use crate::error::{ComputeError, ConfigError};

/// Both stores behind one lock, so a key can never be seen in both.
#[derive(Debug)]
struct Stores {
    entries: BoundedStore<Bytes>,
    negatives: BoundedStore<NegativeResult>,
}

#[derive(Debug)]
struct CacheInner {
    config: CacheConfig,
    stores: Mutex<Stores>,
    gate: CoalescingGate,
    queue: RefreshQueue,
    stats: CacheStats,
}

/// Outcome of a store lookup on the fetch path.
enum Cached {
    Hit(Bytes),
    /// Oversized result on record: recompute, never serve the stored bytes
    Bypass,
    Miss,
}

// == Response Cache ==
/// Per-key memoization with request coalescing, negative caching and
/// stale-while-revalidate refreshes.
///
/// Cheap to clone; all clones share the same state.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Arc<CacheInner>,
}

impl ResponseCache {
    // == Constructor ==
    /// Builds the cache from a configuration, validating it first.
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;

        let entries = BoundedStore::new(
            config.entry_max_size,
            config.prune_batch_for(config.entry_max_size),
            config.entry_ttl,
        );
        let negatives = BoundedStore::new(
            config.negative_max_size,
            config.prune_batch_for(config.negative_max_size),
            config.negative_ttl,
        );

        Ok(Self {
            inner: Arc::new(CacheInner {
                queue: RefreshQueue::new(config.refresh_queue_capacity),
                stores: Mutex::new(Stores { entries, negatives }),
                gate: CoalescingGate::new(),
                stats: CacheStats::new(),
                config,
            }),
        })
    }

    fn stores(&self) -> MutexGuard<'_, Stores> {
        self.inner
            .stores
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // == Fetch ==
    /// Returns the body for `key`, computing it with `compute` if needed.
    ///
    /// Decision order: fresh entry, stale entry (served while a refresh is
    /// queued), negative entry, then a coalesced computation. An error is
    /// returned only when the computation itself fails.
    pub async fn fetch(&self, key: &CacheKey, compute: &ComputeFn) -> Result<Bytes, ComputeError> {
        match self.lookup(key) {
            Cached::Hit(value) => return Ok(value),
            Cached::Bypass => return self.compute_uncached(key, compute).await,
            Cached::Miss => {}
        }

        self.inner.stats.record_miss();

        if let Some(owner) = self.inner.gate.try_acquire(key.as_str()) {
            // A previous owner may have stored the result after our lookup
            return match self.lookup(key) {
                Cached::Hit(value) => Ok(value),
                Cached::Bypass => {
                    drop(owner);
                    self.compute_uncached(key, compute).await
                }
                Cached::Miss => self.compute_as_owner(key, compute, owner).await,
            };
        }

        self.inner.stats.record_coalesced_wait();
        debug!(cache_key = %key, "Waiting for in-flight computation");
        self.inner.gate.wait_released(key.as_str()).await;

        match self.lookup(key) {
            Cached::Hit(value) => Ok(value),
            // Owner failed or produced an oversized result
            Cached::Bypass | Cached::Miss => self.compute_uncached(key, compute).await,
        }
    }

    /// Store lookup for the fetch path; records stats and queues refreshes.
    fn lookup(&self, key: &CacheKey) -> Cached {
        let k = key.as_str();

        let (entry, negative) = {
            let mut stores = self.stores();
            match stores.entries.get(k) {
                Some(entry) => (Some(entry), None),
                None => match stores.negatives.get(k) {
                    Some(Lookup { expired: true, .. }) => {
                        stores.negatives.delete(k);
                        (None, None)
                    }
                    negative => (None, negative.map(|n| n.value)),
                },
            }
        };

        if let Some(Lookup { value, expired }) = entry {
            if expired {
                self.inner.stats.record_stale_hit();
                debug!(cache_key = %key, "Cache HIT (stale), requesting refresh");
                self.request_refresh(key);
            } else {
                self.inner.stats.record_hit();
                debug!(cache_key = %key, "Cache HIT");
            }
            return Cached::Hit(value);
        }

        match negative {
            Some(NegativeResult {
                ignore_cache: true, ..
            }) => {
                self.inner.stats.record_bypass();
                debug!(cache_key = %key, "Oversized result on record, recomputing");
                Cached::Bypass
            }
            Some(NegativeResult { payload, .. }) => {
                self.inner.stats.record_negative_hit();
                debug!(cache_key = %key, "Cache HIT (negative)");
                Cached::Hit(payload)
            }
            None => Cached::Miss,
        }
    }

    fn request_refresh(&self, key: &CacheKey) {
        // The current owner is already producing a fresh value
        if self.inner.gate.is_in_flight(key.as_str()) {
            return;
        }

        if self.inner.queue.enqueue(key) {
            self.inner.stats.record_refresh_enqueued();
        } else {
            self.inner.stats.record_refresh_dropped();
        }
    }

    /// Runs the computation on the blocking pool, stores the result and
    /// releases ownership.
    ///
    /// The work lives in its own task: if the caller stops waiting, the
    /// computation and store write still complete.
    async fn compute_as_owner(
        &self,
        key: &CacheKey,
        compute: &ComputeFn,
        owner: OwnershipGuard,
    ) -> Result<Bytes, ComputeError> {
        let cache = self.clone();
        let key = key.clone();
        let compute = Arc::clone(compute);

        let task = tokio::task::spawn_blocking(move || {
            let result = cache.run(&key, &compute);
            if let Ok(value) = &result {
                cache.set(&key, value.clone());
            }
            drop(owner);
            result
        });

        task.await
            .map_err(|e| ComputeError::Aborted(e.to_string()))?
    }

    /// Computes without touching the stores.
    async fn compute_uncached(
        &self,
        key: &CacheKey,
        compute: &ComputeFn,
    ) -> Result<Bytes, ComputeError> {
        let cache = self.clone();
        let key = key.clone();
        let compute = Arc::clone(compute);

        tokio::task::spawn_blocking(move || cache.run(&key, &compute))
            .await
            .map_err(|e| ComputeError::Aborted(e.to_string()))?
    }

    fn run(&self, key: &CacheKey, compute: &ComputeFn) -> Result<Bytes, ComputeError> {
        self.inner.stats.record_computation();

        match compute(key.params()) {
            Ok(value) => {
                debug!(cache_key = %key, bytes = value.len(), "Computed");
                Ok(Bytes::from(value))
            }
            Err(e) => {
                self.inner.stats.record_compute_failure();
                warn!(cache_key = %key, error = %e, "Computation failed");
                Err(e)
            }
        }
    }

    // == Refresh ==
    /// Recomputes `key` under coalescing ownership and replaces its entry.
    ///
    /// Returns `Ok(false)` without computing if the key is already in flight.
    /// On failure the stale entry is left untouched.
    pub async fn refresh(&self, key: &CacheKey, compute: &ComputeFn) -> Result<bool, ComputeError> {
        let Some(owner) = self.inner.gate.try_acquire(key.as_str()) else {
            return Ok(false);
        };
        self.compute_as_owner(key, compute, owner).await.map(|_| true)
    }

    /// Waits for the next key due for a background refresh.
    pub async fn next_refresh(&self) -> Option<CacheKey> {
        self.inner.queue.dequeue().await
    }

    // == Get ==
    /// Reads the servable value for `key` without computing, refreshing or
    /// recording stats. Stale entries are returned too.
    pub fn get(&self, key: &CacheKey) -> Option<Bytes> {
        let k = key.as_str();
        let mut stores = self.stores();

        if let Some(entry) = stores.entries.get(k) {
            return Some(entry.value);
        }
        match stores.negatives.get(k) {
            Some(Lookup {
                value: NegativeResult {
                    payload,
                    ignore_cache: false,
                },
                expired: false,
            }) => Some(payload),
            _ => None,
        }
    }

    // == Set ==
    /// Stores a computed value, classified by size.
    ///
    /// `0 < len <= max_accepted_bytes` goes to the Entry Store. Empty and
    /// oversized values go to the Negative Store, oversized ones flagged
    /// `ignore_cache`. The other store's item for the key is removed.
    pub fn set(&self, key: &CacheKey, value: Bytes) {
        let k = key.as_str();
        let size = value.len();
        let max_accepted = self.inner.config.max_accepted_bytes;
        let mut stores = self.stores();

        if size == 0 || size > max_accepted {
            let negative = if size == 0 {
                NegativeResult::empty()
            } else {
                NegativeResult::oversized(value)
            };
            debug!(cache_key = %key, bytes = size, ignore_cache = negative.ignore_cache, "Storing negative result");
            stores.entries.delete(k);
            stores.negatives.set(k, negative, None);
        } else {
            stores.negatives.delete(k);
            stores.entries.set(k, value, None);
        }
    }

    // == Invalidate ==
    /// Removes `key` from both stores. Returns true if anything was removed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let mut stores = self.stores();
        let removed_entry = stores.entries.delete(key.as_str());
        let removed_negative = stores.negatives.delete(key.as_str());
        removed_entry || removed_negative
    }

    // == Purge Expired ==
    /// Drops expired negative items and entries stale for longer than
    /// `max_stale`. Returns the number of items removed.
    pub fn purge_expired(&self) -> usize {
        let max_stale = self.inner.config.max_stale;
        let mut stores = self.stores();
        stores.entries.purge_expired(max_stale) + stores.negatives.purge_expired(Duration::ZERO)
    }

    // == Drain ==
    /// Waits up to `timeout` for in-flight computations to finish.
    ///
    /// Returns false if some were still running when the timeout elapsed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.inner.gate.wait_idle())
            .await
            .is_ok()
    }

    // == Stats ==
    pub fn stats(&self) -> StatsSnapshot {
        let mut snapshot = self.inner.stats.snapshot();
        {
            let stores = self.stores();
            snapshot.entries = stores.entries.len();
            snapshot.negative_entries = stores.negatives.len();
            snapshot.evictions = stores.entries.evictions() + stores.negatives.evictions();
        }
        snapshot.in_flight = self.inner.gate.in_flight_count();
        snapshot.pending_refreshes = self.inner.queue.pending();
        snapshot
    }

    /// Whether `key` currently has a negative record, and its `ignore_cache` flag.
    pub fn negative_flag(&self, key: &CacheKey) -> Option<bool> {
        self.stores()
            .negatives
            .get(key.as_str())
            .map(|lookup| lookup.value.ignore_cache)
    }

    pub fn is_queued(&self, key: &CacheKey) -> bool {
        self.inner.queue.is_queued(key)
    }
}
