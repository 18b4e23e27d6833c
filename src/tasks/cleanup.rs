//! Expiry Sweep Task
//!
//! Background task that periodically drops expired negative results and
//! entries that have been stale for too long to be served.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResponseCache;

/// Spawns a background task that periodically purges expired cache items.
///
/// Stale entries are kept for `max_stale` past their expiry so they can be
/// served while a refresh runs; the sweep removes them after that.
///
/// # Arguments
/// * `cache` - Shared handle to the response cache
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(cache: ResponseCache, cleanup_interval_secs: u64) -> JoinHandle<()> {
    spawn_cleanup_every(cache, Duration::from_secs(cleanup_interval_secs.max(1)))
}

fn spawn_cleanup_every(cache: ResponseCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired items", removed);
            } else {
                debug!("Expiry sweep: no expired items found");
            }
        }
    })
}
