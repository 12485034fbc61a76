//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheStats, LruTracker};

// == Cache Store ==
/// Bounded key/value storage with LRU eviction and insertion-time TTL.
///
/// Not synchronized; callers share it behind a lock.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<CacheKey, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<CacheKey>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Lifetime of every entry
    ttl: Duration,
    /// Advanced on every invalidation
    clock: u64,
    /// Keys with a fill in flight, stamped with their last invalidation
    pending: HashMap<CacheKey, u64>,
}

/// Snapshot taken when a miss starts filling `key`.
///
/// Redeemed with [`CacheStore::complete_fill`] once the value is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket(u64);

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and TTL.
    ///
    /// `capacity` must be non-zero; callers normalize their config first.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        debug_assert!(capacity > 0, "cache capacity must be non-zero");
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity,
            ttl,
            clock: 0,
            pending: HashMap::new(),
        }
    }

    // == Get ==
    /// Returns a clone of the live value for `key`, marking it recently used.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                self.lru.touch(key);
                Some(value)
            }
            Some(_) => {
                self.remove_entry(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Insert ==
    /// Stores `value` under `key` with a fresh TTL.
    ///
    /// If the key is new and the cache is at capacity, the least recently
    /// used entry is evicted first.
    pub fn insert(&mut self, key: CacheKey, value: V) {
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.capacity {
                match self.lru.evict_oldest() {
                    Some(evicted) => {
                        debug!(key = %evicted, "Evicting least recently used entry");
                        self.entries.remove(&evicted);
                        self.stats.record_eviction();
                    }
                    None => break,
                }
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, self.ttl));
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Fills ==
    /// Registers a fill of `key` that is about to ask the backing store.
    pub fn begin_fill(&mut self, key: &CacheKey) -> FillTicket {
        self.pending.entry(key.clone()).or_insert(0);
        FillTicket(self.clock)
    }

    /// Stores the result of a fill unless `key` was invalidated after
    /// `ticket` was issued.
    ///
    /// The first fill to finish settles the key; overlapping fills that
    /// finish later are dropped. Returns whether the value was stored.
    pub fn complete_fill(&mut self, key: CacheKey, value: V, ticket: FillTicket) -> bool {
        match self.pending.remove(&key) {
            Some(invalidated_at) if invalidated_at <= ticket.0 => {
                self.insert(key, value);
                true
            }
            _ => false,
        }
    }

    /// Forgets a fill that produced no value.
    pub fn abandon_fill(&mut self, key: &CacheKey) {
        self.pending.remove(key);
    }

    /// Number of keys with a fill in flight.
    pub fn pending_fills(&self) -> usize {
        self.pending.len()
    }

    // == Invalidate ==
    /// Removes `key` if present. Absent keys are a no-op.
    ///
    /// A fill of `key` already in flight will not be stored.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.clock += 1;
        if let Some(invalidated_at) = self.pending.get_mut(key) {
            *invalidated_at = self.clock;
        }

        let removed = self.remove_entry(key);
        if removed {
            self.stats.record_invalidation();
        }
        removed
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.clock += 1;
        self.pending.clear();
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }

    /// Whether a live entry exists, without touching LRU order or stats.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn remove_entry(&mut self, key: &CacheKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }
}
