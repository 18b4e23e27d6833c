//! Cache Module
//!
//! Response cache for computed bodies: bounded Entry and Negative stores
//! with TTL and batch LRU eviction, request coalescing, and a background
//! refresh queue for stale entries.

mod entry;
mod facade;
mod gate;
mod key;
mod lru;
mod queue;
mod stats;
mod store;


use std::sync::Arc;

use crate::error::ComputeError;
use crate::fizzbuzz::FizzBuzzParams;

// Re-export public types
pub use entry::{CacheEntry, Entry, NegativeEntry, NegativeResult};
pub use facade::ResponseCache;
pub use gate::{CoalescingGate, OwnershipGuard};
pub use key::CacheKey;
pub use lru::LruTracker;
pub use queue::RefreshQueue;
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{BoundedStore, Lookup};

/// Produces the body for a set of parameters.
///
/// Must be side-effect free: it may run concurrently for different keys
/// and again for the same key after a failure or expiry.
pub type ComputeFn =
    Arc<dyn Fn(&FizzBuzzParams) -> Result<Vec<u8>, ComputeError> + Send + Sync>;

/// Wraps a closure or function as a [`ComputeFn`].
pub fn compute_fn<F>(f: F) -> ComputeFn
where
    F: Fn(&FizzBuzzParams) -> Result<Vec<u8>, ComputeError> + Send + Sync + 'static,
{
    Arc::new(f)
}
