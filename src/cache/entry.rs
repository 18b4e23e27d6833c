//! Cache Entry Module
//!
//! Defines stored items with absolute expiry, and the two value kinds the
//! response cache keeps: positive bodies and negative results.

use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::config::MAX_TTL;

// == Cache Entry ==
/// A stored value with its absolute expiration time.
///
/// Immutable once created: a refresh replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration time
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` from now.
    ///
    /// TTLs are capped at [`MAX_TTL`] so the expiry never overflows `Instant`.
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now),
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Staleness ==
    /// How long the entry has been expired, zero while it is still fresh.
    pub fn stale_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.expires_at)
    }

    // == Time To Live ==
    /// Remaining time before expiry, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

// == Negative Result ==
/// A computed result that is not a normal cacheable body.
///
/// Empty results are served from the cache. Oversized results carry
/// `ignore_cache = true`: only their existence is remembered and the bytes
/// are never served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegativeResult {
    pub payload: Bytes,
    pub ignore_cache: bool,
}

impl NegativeResult {
    pub fn empty() -> Self {
        Self {
            payload: Bytes::new(),
            ignore_cache: false,
        }
    }

    pub fn oversized(payload: Bytes) -> Self {
        Self {
            payload,
            ignore_cache: true,
        }
    }
}

/// Entry Store item
pub type Entry = CacheEntry<Bytes>;

/// Negative Store item
pub type NegativeEntry = CacheEntry<NegativeResult>;
