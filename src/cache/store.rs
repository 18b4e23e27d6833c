//! Cache Store Module
//!
//! Bounded key-value storage combining a HashMap with LRU tracking,
//! absolute expiry and batch pruning. Used for both the Entry Store and
//! the Negative Store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, LruTracker};

// == Lookup ==
/// Result of a store read: the value and whether it has expired.
///
/// Expired-but-not-evicted items are still returned so callers can serve
/// them while a refresh is scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup<V> {
    pub value: V,
    pub expired: bool,
}

// == Bounded Store ==
/// Capacity-bounded store with batch LRU eviction and TTL support.
#[derive(Debug)]
pub struct BoundedStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of items allowed
    max_items: usize,
    /// Number of items evicted at once when the store is full
    prune_batch: usize,
    /// TTL applied when `set` is called without one
    default_ttl: Duration,
    /// Items evicted under capacity pressure
    evictions: u64,
}

impl<V: Clone> BoundedStore<V> {
    // == Constructor ==
    /// Creates a new store.
    ///
    /// `max_items` and `prune_batch` are raised to at least one; the batch
    /// never exceeds the capacity.
    pub fn new(max_items: usize, prune_batch: usize, default_ttl: Duration) -> Self {
        let max_items = max_items.max(1);
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_items,
            prune_batch: prune_batch.clamp(1, max_items),
            default_ttl,
            evictions: 0,
        }
    }

    // == Set ==
    /// Stores a value, replacing any previous item for the key.
    ///
    /// Inserting a new key into a full store first evicts the
    /// `prune_batch` least recently used items.
    pub fn set(&mut self, key: &str, value: V, ttl: Option<Duration>) {
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_items {
            self.prune();
        }

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl));
        self.entries.insert(key.to_string(), entry);
        self.lru.touch(key);
    }

    // == Get ==
    /// Reads a value and marks it as recently used.
    pub fn get(&mut self, key: &str) -> Option<Lookup<V>> {
        let entry = self.entries.get(key)?;
        let lookup = Lookup {
            value: entry.value.clone(),
            expired: entry.is_expired(),
        };
        self.lru.touch(key);
        Some(lookup)
    }

    // == Delete ==
    /// Removes an item. Returns true if it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            true
        } else {
            false
        }
    }

    // == Purge Expired ==
    /// Removes every item that has been expired for longer than `grace`.
    ///
    /// Returns the number of items removed.
    pub fn purge_expired(&mut self, grace: Duration) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now) && entry.stale_for(now) >= grace)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        expired_keys.len()
    }

    fn prune(&mut self) {
        for key in self.lru.evict_oldest(self.prune_batch) {
            if self.entries.remove(&key).is_some() {
                self.evictions += 1;
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    #[allow(dead_code)]
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn prune_batch(&self) -> usize {
        self.prune_batch
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const TTL: Duration = Duration::from_secs(300);

    fn store(max_items: usize, prune_batch: usize) -> BoundedStore<String> {
        BoundedStore::new(max_items, prune_batch, TTL)
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(100, 5);

        store.set("key1", "value1".to_string(), None);
        let lookup = store.get("key1").unwrap();

        assert_eq!(lookup.value, "value1");
        assert!(!lookup.expired);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(100, 5);
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_delete() {
        let mut store = store(100, 5);

        store.set("key1", "value1".to_string(), None);
        assert!(store.delete("key1"));
        assert!(!store.delete("key1"));

        assert!(store.is_empty());
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = store(100, 5);

        store.set("key1", "value1".to_string(), None);
        store.set("key1", "value2".to_string(), None);

        assert_eq!(store.get("key1").unwrap().value, "value2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_expired_item_is_still_returned() {
        let mut store = store(100, 5);

        store.set("key1", "value1".to_string(), Some(Duration::from_millis(50)));
        assert!(!store.get("key1").unwrap().expired);

        sleep(Duration::from_millis(80));

        let lookup = store.get("key1").unwrap();
        assert_eq!(lookup.value, "value1");
        assert!(lookup.expired);
    }

    #[test]
    fn test_store_prunes_a_batch_when_full() {
        let mut store = store(10, 3);

        for i in 0..10 {
            store.set(&format!("key{}", i), i.to_string(), None);
        }
        assert_eq!(store.len(), 10);

        store.set("key10", "10".to_string(), None);

        // 3 oldest evicted, then the new key inserted
        assert_eq!(store.len(), 8);
        assert_eq!(store.evictions(), 3);
        for i in 0..3 {
            assert!(!store.contains(&format!("key{}", i)));
        }
        assert!(store.contains("key3"));
        assert!(store.contains("key10"));
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = store(3, 1);

        store.set("key1", "value1".to_string(), None);
        store.set("key2", "value2".to_string(), None);
        store.set("key3", "value3".to_string(), None);

        store.get("key1").unwrap();
        store.set("key4", "value4".to_string(), None);

        assert!(store.contains("key1"));
        assert!(!store.contains("key2"));
    }

    #[test]
    fn test_store_overwrite_when_full_does_not_prune() {
        let mut store = store(2, 1);

        store.set("key1", "a".to_string(), None);
        store.set("key2", "b".to_string(), None);
        store.set("key1", "c".to_string(), None);

        assert_eq!(store.len(), 2);
        assert_eq!(store.evictions(), 0);
    }

    #[test]
    fn test_store_purge_expired_respects_grace() {
        let mut store = store(100, 5);

        store.set("short", "v".to_string(), Some(Duration::from_millis(20)));
        store.set("long", "v".to_string(), Some(Duration::from_secs(10)));

        sleep(Duration::from_millis(50));

        assert_eq!(store.purge_expired(Duration::from_secs(60)), 0);
        assert_eq!(store.purge_expired(Duration::ZERO), 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains("long"));
    }

    #[test]
    fn test_store_batch_is_clamped() {
        let store = store(4, 50);
        assert_eq!(store.prune_batch(), 4);

        let store: BoundedStore<String> = BoundedStore::new(0, 0, TTL);
        assert_eq!(store.max_items(), 1);
        assert_eq!(store.prune_batch(), 1);
    }
}
