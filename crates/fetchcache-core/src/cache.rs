//! Bounded, time-expiring key/value cache
//!
//! Entries expire `max_age` after their last successful read (sliding
//! expiration). When full, the oldest entry by insertion order is evicted
//! (not LRU).

use crate::config::CacheConfig;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// A single cached value with its bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    /// Insertion time, reset on every hit and on overwrite
    pub stored_at: Instant,
    pub hit_count: u64,
    /// Insertion sequence number, used for oldest-first eviction
    seq: u64,
}

/// Snapshot of cache occupancy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub total_hits: u64,
    /// `size / total_hits * 100`, not a conventional hit ratio
    pub hit_rate: f64,
}

/// Bounded cache with sliding expiry
#[derive(Debug)]
pub struct DataCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// seq -> key, iterated in insertion order
    order: BTreeMap<u64, String>,
    next_seq: u64,
    max_age: Duration,
    max_size: usize,
}

impl<V: Clone> DataCache<V> {
    pub fn new(max_age: Duration, max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            max_age,
            max_size,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_age(), config.max_size)
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order (expired entries included until swept)
    pub fn keys(&self) -> Vec<String> {
        self.order.values().cloned().collect()
    }

    /// Insert or overwrite `key`
    ///
    /// A new key arriving at capacity evicts the oldest-inserted entry first.
    /// Overwriting keeps the key's original insertion position.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = Instant::now();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.stored_at = now;
            trace!(key = %key, "Cache entry refreshed");
            return;
        }

        if self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                hit_count: 0,
                seq,
            },
        );
    }

    /// Look up `key`, sliding its expiry on hit
    ///
    /// Expired entries are removed and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = Instant::now();
        if self.expire_if_stale(key, now) {
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.hit_count += 1;
        entry.stored_at = now;
        trace!(key = %key, hits = entry.hit_count, "Cache hit");
        Some(entry.value.clone())
    }

    /// Same expiry check as [`get`](Self::get) without counting a hit
    pub fn has(&mut self, key: &str) -> bool {
        if self.expire_if_stale(key, Instant::now()) {
            return false;
        }
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn cleanup(&mut self) -> usize {
        let now = Instant::now();
        let max_age = self.max_age;
        let stale: Vec<(String, u64)> = self
            .entries
            .iter()
            .filter(|(_, e)| now.duration_since(e.stored_at) > max_age)
            .map(|(k, e)| (k.clone(), e.seq))
            .collect();

        for (key, seq) in &stale {
            self.entries.remove(key);
            self.order.remove(seq);
        }

        if !stale.is_empty() {
            debug!(removed = stale.len(), remaining = self.entries.len(), "Cache sweep");
        }
        stale.len()
    }

    pub fn stats(&self) -> CacheStats {
        let size = self.entries.len();
        let total_hits: u64 = self.entries.values().map(|e| e.hit_count).sum();
        let hit_rate = if size > 0 && total_hits > 0 {
            (size as f64 / total_hits as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            size,
            max_size: self.max_size,
            total_hits,
            hit_rate,
        }
    }

    /// Returns true if the entry existed and was removed for being stale
    fn expire_if_stale(&mut self, key: &str, now: Instant) -> bool {
        let stale = match self.entries.get(key) {
            Some(entry) => now.duration_since(entry.stored_at) > self.max_age,
            None => return false,
        };
        if stale {
            self.remove(key);
            trace!(key = %key, "Cache entry expired");
        }
        stale
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.order.pop_first() {
            self.entries.remove(&key);
            debug!(key = %key, max_size = self.max_size, "Evicted oldest cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_age_ms: u64, max_size: usize) -> DataCache<i32> {
        DataCache::new(Duration::from_millis(max_age_ms), max_size)
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_then_get_returns_value() {
        let mut c = cache(1000, 10);
        c.set("k", 7);
        assert_eq!(c.get("k"), Some(7));
        assert!(c.has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_removed_on_get() {
        let mut c = cache(1000, 10);
        c.set("k", 1);

        tokio::time::advance(Duration::from_millis(1001)).await;

        assert_eq!(c.get("k"), None);
        assert_eq!(c.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_removed_on_has() {
        let mut c = cache(1000, 10);
        c.set("k", 1);

        tokio::time::advance(Duration::from_millis(1500)).await;

        assert!(!c.has("k"));
        assert!(c.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_at_exact_max_age_is_live() {
        let mut c = cache(1000, 10);
        c.set("k", 1);

        tokio::time::advance(Duration::from_millis(1000)).await;

        assert_eq!(c.get("k"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_slides_expiry() {
        let mut c = cache(1000, 10);
        c.set("k", 1);

        tokio::time::advance(Duration::from_millis(800)).await;
        assert_eq!(c.get("k"), Some(1));

        // 1600ms after insertion but only 800ms after the last hit
        tokio::time::advance(Duration::from_millis(800)).await;
        assert_eq!(c.get("k"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_has_does_not_slide_or_count() {
        let mut c = cache(1000, 10);
        c.set("k", 1);

        tokio::time::advance(Duration::from_millis(800)).await;
        assert!(c.has("k"));
        assert_eq!(c.stats().total_hits, 0);

        tokio::time::advance(Duration::from_millis(800)).await;
        assert!(!c.has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_drops_oldest_inserted() {
        let mut c = cache(1000, 2);
        c.set("a", 1);
        c.set("b", 2);
        c.get("a");
        c.set("c", 3);

        assert_eq!(c.len(), 2);
        assert!(!c.has("a"));
        assert!(c.has("b"));
        assert!(c.has("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_size_never_exceeds_max() {
        let mut c = cache(1000, 5);
        for i in 0..20 {
            c.set(format!("key-{i}"), i);
        }
        assert_eq!(c.len(), 5);
        assert_eq!(
            c.keys(),
            vec!["key-15", "key-16", "key-17", "key-18", "key-19"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_at_capacity_does_not_evict() {
        let mut c = cache(1000, 2);
        c.set("a", 1);
        c.set("b", 2);
        c.set("a", 10);

        assert_eq!(c.len(), 2);
        assert_eq!(c.get("a"), Some(10));
        assert_eq!(c.keys(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_removes_only_expired() {
        let mut c = cache(1000, 10);
        c.set("old", 1);
        tokio::time::advance(Duration::from_millis(600)).await;
        c.set("new", 2);
        tokio::time::advance(Duration::from_millis(600)).await;

        assert_eq!(c.cleanup(), 1);
        assert_eq!(c.keys(), vec!["new"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_removes_everything() {
        let mut c = cache(1000, 10);
        c.set("a", 1);
        c.set("b", 2);
        c.clear();
        assert!(c.is_empty());
        assert!(c.keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_hit_rate_formula() {
        let mut c = cache(1000, 10);
        c.set("a", 1);
        c.set("b", 2);
        for _ in 0..3 {
            c.get("a");
        }
        c.get("b");

        let stats = c.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_size, 10);
        assert_eq!(stats.total_hits, 4);
        assert_eq!(stats.hit_rate, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_zero_without_hits() {
        let mut c = cache(1000, 10);
        c.set("a", 1);
        assert_eq!(c.stats().hit_rate, 0.0);

        let empty = cache(1000, 10);
        assert_eq!(empty.stats().hit_rate, 0.0);
    }
}
