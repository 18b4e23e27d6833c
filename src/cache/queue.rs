//! Refresh Queue Module
//!
//! Bounded, non-blocking queue of stale keys waiting for background
//! recomputation. Best effort: a dropped request only delays freshness.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::cache::CacheKey;

// == Refresh Queue ==
/// Deduplicated refresh queue: a key is queued at most once while pending.
#[derive(Debug)]
pub struct RefreshQueue {
    sender: mpsc::Sender<CacheKey>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<CacheKey>>,
    /// Keys currently sitting in the channel
    queued: Mutex<HashSet<String>>,
}

impl RefreshQueue {
    // == Constructor ==
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
            queued: Mutex::new(HashSet::new()),
        }
    }

    fn queued(&self) -> MutexGuard<'_, HashSet<String>> {
        self.queued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // == Enqueue ==
    /// Queues `key` for refresh without blocking.
    ///
    /// Returns false if the key is already queued or the queue is full.
    pub fn enqueue(&self, key: &CacheKey) -> bool {
        // Held across try_send so a concurrent dequeue cannot observe the
        // key in the channel before it is in the set.
        let mut queued = self.queued();
        if queued.contains(key.as_str()) {
            return false;
        }

        match self.sender.try_send(key.clone()) {
            Ok(()) => {
                queued.insert(key.as_str().to_string());
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(cache_key = %key, "Refresh queue full, dropping refresh");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    // == Dequeue ==
    /// Waits for the next key to refresh and clears its queued mark.
    ///
    /// Returns `None` once the queue is closed.
    pub async fn dequeue(&self) -> Option<CacheKey> {
        let key = self.receiver.lock().await.recv().await?;
        self.queued().remove(key.as_str());
        Some(key)
    }

    /// Non-blocking variant of [`dequeue`](Self::dequeue).
    pub fn try_dequeue(&self) -> Option<CacheKey> {
        let key = self.receiver.try_lock().ok()?.try_recv().ok()?;
        self.queued().remove(key.as_str());
        Some(key)
    }

    pub fn is_queued(&self, key: &CacheKey) -> bool {
        self.queued().contains(key.as_str())
    }

    /// Number of keys waiting for a refresh.
    pub fn pending(&self) -> usize {
        self.queued().len()
    }
}
