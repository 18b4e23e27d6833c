//! Refresh Worker
//!
//! Background task draining the refresh queue: every stale key it receives
//! is recomputed under coalescing ownership and its entry replaced.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{ComputeFn, ResponseCache};

/// Spawns the worker that recomputes stale entries queued by `fetch`.
///
/// Keys already being computed by a request are skipped. A failed refresh
/// leaves the stale entry in place; the next stale hit queues it again.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
pub fn spawn_refresh_worker(cache: ResponseCache, compute: ComputeFn) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting refresh worker");

        while let Some(key) = cache.next_refresh().await {
            match cache.refresh(&key, &compute).await {
                Ok(true) => debug!(cache_key = %key, "Refreshed stale entry"),
                Ok(false) => debug!(cache_key = %key, "Refresh skipped, key already in flight"),
                Err(e) => warn!(cache_key = %key, error = %e, "Refresh failed, keeping stale entry"),
            }
        }

        info!("Refresh queue closed, worker exiting");
    })
}
