//! Coalescing Gate Module
//!
//! In-flight registry ensuring at most one computation per key runs at a
//! time. Other requests for the same key wait until the owner releases it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct GateState {
    /// Keys currently being computed. Only mutated under this lock.
    in_flight: Mutex<HashSet<String>>,
    /// Broadcast on every release
    released: Notify,
}

// == Coalescing Gate ==
/// Single-flight registry with a release broadcast.
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct CoalescingGate {
    state: Arc<GateState>,
}

impl CoalescingGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked.
        self.state
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // == Try Become Owner ==
    /// Registers the caller as the computation owner for `key`.
    ///
    /// Returns `None` if someone else already owns it. The returned guard
    /// releases ownership when dropped, including on panic or cancellation.
    pub fn try_acquire(&self, key: &str) -> Option<OwnershipGuard> {
        if self.registry().insert(key.to_string()) {
            Some(OwnershipGuard {
                gate: self.clone(),
                key: key.to_string(),
            })
        } else {
            None
        }
    }

    /// Removes `key` from the registry and wakes every waiter.
    fn release(&self, key: &str) {
        self.registry().remove(key);
        self.state.released.notify_waiters();
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.registry().contains(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.registry().len()
    }

    // == Wait Until Released ==
    /// Waits until `key` is no longer in flight.
    ///
    /// A wake-up only means *some* key was released; the registry is
    /// re-checked every time. Dropping the future simply stops waiting.
    pub async fn wait_released(&self, key: &str) {
        self.wait_until(|registry| !registry.contains(key)).await;
    }

    /// Waits until no computation is in flight.
    pub async fn wait_idle(&self) {
        self.wait_until(|registry| registry.is_empty()).await;
    }

    async fn wait_until<P>(&self, done: P)
    where
        P: Fn(&HashSet<String>) -> bool,
    {
        loop {
            let notified = self.state.released.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between is not lost
            notified.as_mut().enable();

            let finished = {
                let registry = self.registry();
                done(&registry)
            };
            if finished {
                return;
            }

            notified.await;
        }
    }
}

// == Ownership Guard ==
/// Proof of ownership of an in-flight key; releases it on drop.
#[derive(Debug)]
pub struct OwnershipGuard {
    gate: CoalescingGate,
    key: String,
}

impl OwnershipGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for OwnershipGuard {
    fn drop(&mut self) {
        self.gate.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_single_owner_per_key() {
        let gate = CoalescingGate::new();

        let owner = gate.try_acquire("a");
        assert!(owner.is_some());
        assert!(gate.try_acquire("a").is_none());
        assert!(gate.try_acquire("b").is_some_and(|g| g.key() == "b"));

        drop(owner);
        assert!(!gate.is_in_flight("a"));
        assert!(gate.try_acquire("a").is_some());
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_not_in_flight() {
        let gate = CoalescingGate::new();
        tokio::time::timeout(Duration::from_millis(100), gate.wait_released("a"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_release() {
        let gate = CoalescingGate::new();
        let owner = gate.try_acquire("a").unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_released("a").await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(owner);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_unrelated_release_does_not_finish_wait() {
        let gate = CoalescingGate::new();
        let owner_a = gate.try_acquire("a").unwrap();
        let owner_b = gate.try_acquire("b").unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_released("a").await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(owner_b);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(owner_a);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_waiter_leaves_registry_intact() {
        let gate = CoalescingGate::new();
        let owner = gate.try_acquire("a").unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_released("a").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        waiter.abort();

        assert!(gate.is_in_flight("a"));
        drop(owner);
        assert_eq!(gate.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle() {
        let gate = CoalescingGate::new();
        let owner = gate.try_acquire("a").unwrap();

        let idle = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_idle().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(owner);
        tokio::time::timeout(Duration::from_secs(1), idle)
            .await
            .unwrap()
            .unwrap();
    }
}
