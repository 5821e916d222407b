//! Cache Store Module
//!
//! Main cache engine combining a HashMap index with an arena-backed recency
//! list and TTL expiration.
//!
//! `CacheStore` itself is single-threaded (`&mut self`); share it through
//! [`SharedCache`](crate::cache::SharedCache), which serializes access.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Clock, LruList, MonotonicClock, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

/// How many entries, counted from the LRU tail, are checked for an expired
/// candidate before a live entry is evicted to make room.
pub const EXPIRED_PROBE_WINDOW: usize = 8;

// == Eviction Reason ==
/// Why an entry left the cache without being deleted or overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// Least recently used entry dropped to make room for a new key
    Capacity,
    /// TTL elapsed; purged lazily on access, opportunistically on insert or by a sweep
    Expired,
}

/// Callback invoked for every eviction.
///
/// Runs while the store is borrowed mutably (and, behind `SharedCache`, while
/// the lock is held), so it must not call back into the cache.
pub type EvictionListener<V> = Box<dyn Fn(&str, &V, EvictionReason) + Send + Sync>;

// == Sweep Progress ==
/// Outcome of scanning one batch of arena slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepProgress {
    /// Expired entries purged in this batch
    pub removed: usize,
    /// Slot to resume from, None once the end of the arena is reached
    pub next_cursor: Option<usize>,
}

// == Cache Store ==
/// Bounded key/value store with LRU eviction and per-entry TTL.
///
/// `index` and `recency` are only ever mutated together, so every key in the
/// index has exactly one node in the recency list and vice versa.
pub struct CacheStore<V> {
    /// Key to recency-list slot
    index: HashMap<String, usize>,
    /// Entries ordered from most to least recently used
    recency: LruList<CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    clock: Arc<dyn Clock>,
    listener: Option<EvictionListener<V>>,
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .field("stats", &self.stats)
            .field("clock", &self.clock)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a store holding at most `capacity` entries, timed by a
    /// monotonic clock.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_clock(capacity, Arc::new(MonotonicClock::new()))
    }

    /// Creates a store that reads time from `clock`.
    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidConfiguration(
                "cache capacity must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            index: HashMap::with_capacity(capacity),
            recency: LruList::with_capacity(capacity),
            stats: CacheStats::new(capacity),
            capacity,
            clock,
            listener: None,
        })
    }

    /// Installs the callback notified of capacity evictions and expirations.
    pub fn set_eviction_listener<F>(&mut self, listener: F)
    where
        F: Fn(&str, &V, EvictionReason) + Send + Sync + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    // == Set ==
    /// Stores a key-value pair.
    ///
    /// An existing live key is updated in place: new value, TTL restarted from
    /// now, moved to most recently used. A new key (or one whose entry has
    /// expired) is inserted at the front, first making room if the store is
    /// full. `ttl_seconds <= 0` means the entry never expires.
    ///
    /// # Errors
    /// `InvalidArgument` if the key is empty or longer than `MAX_KEY_LENGTH`.
    pub fn set(&mut self, key: String, value: V, ttl_seconds: i64) -> Result<()> {
        validate_key(&key)?;
        let now = self.clock.now_ms();

        if let Some(&idx) = self.index.get(&key) {
            if self.is_live(idx, now) {
                if let Some(entry) = self.recency.get_mut(idx) {
                    entry.refresh(value, ttl_seconds, now);
                }
                self.recency.move_to_front(idx);
                return Ok(());
            }
            self.expire_slot(idx);
        }

        if self.index.len() >= self.capacity {
            self.make_room(now);
        }

        let idx = self
            .recency
            .push_front(CacheEntry::new(key.clone(), value, ttl_seconds, now));
        self.index.insert(key, idx);
        self.stats.set_total_entries(self.index.len());

        Ok(())
    }

    // == Peek ==
    /// Reads a live value without refreshing its recency or touching stats.
    pub fn peek(&self, key: &str) -> Option<&V> {
        let now = self.clock.now_ms();
        let idx = *self.index.get(key)?;
        self.recency
            .get(idx)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| &entry.value)
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns true if a live entry was removed. Absent keys are a no-op;
    /// expired ones are purged and reported as absent.
    pub fn delete(&mut self, key: &str) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        let now = self.clock.now_ms();
        if !self.is_live(idx, now) {
            self.expire_slot(idx);
            return false;
        }
        self.remove_slot(idx).is_some()
    }

    // == TTL ==
    /// Remaining lifetime of a live entry.
    ///
    /// `None` if the key is absent or expired, `Some(None)` if it never
    /// expires, `Some(Some(secs))` otherwise.
    pub fn ttl(&self, key: &str) -> Option<Option<u64>> {
        let now = self.clock.now_ms();
        let idx = *self.index.get(key)?;
        self.recency
            .get(idx)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.ttl_remaining_at(now))
    }

    // == Sweep ==
    /// Purges expired entries among at most `batch_size` arena slots starting
    /// at `cursor`.
    ///
    /// Callers walk the whole arena by feeding `next_cursor` back in until it
    /// comes back `None`.
    pub fn sweep_batch(&mut self, cursor: usize, batch_size: usize) -> SweepProgress {
        let now = self.clock.now_ms();
        let slots = self.recency.slot_count();
        let end = cursor.saturating_add(batch_size.max(1)).min(slots);

        let mut removed = 0;
        for idx in cursor..end {
            let expired = self
                .recency
                .get(idx)
                .is_some_and(|entry| entry.is_expired_at(now));
            if expired {
                self.expire_slot(idx);
                removed += 1;
            }
        }

        SweepProgress {
            removed,
            next_cursor: (end < slots).then_some(end),
        }
    }

    /// Purges every expired entry in one pass. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        self.sweep_batch(0, usize::MAX).removed
    }

    // == Clear ==
    /// Drops all entries without notifying the eviction listener.
    pub fn clear(&mut self) {
        self.index.clear();
        self.recency.clear();
        self.stats.set_total_entries(0);
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.index.len());
        stats
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Internal ==
    fn is_live(&self, idx: usize, now: u64) -> bool {
        self.recency
            .get(idx)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Frees one slot, preferring an expired entry near the tail over the
    /// least recently used live one.
    fn make_room(&mut self, now: u64) {
        let mut cursor = self.recency.back();
        let mut probed = 0;
        while let Some(idx) = cursor {
            if probed == EXPIRED_PROBE_WINDOW {
                break;
            }
            if !self.is_live(idx, now) {
                self.expire_slot(idx);
                return;
            }
            cursor = self.recency.prev(idx);
            probed += 1;
        }

        if let Some(idx) = self.recency.back() {
            if let Some(entry) = self.remove_slot(idx) {
                self.stats.record_eviction();
                debug!(key = %entry.key, "evicted least recently used entry");
                self.notify(&entry, EvictionReason::Capacity);
            }
        }
    }

    fn expire_slot(&mut self, idx: usize) {
        if let Some(entry) = self.remove_slot(idx) {
            self.stats.record_expirations(1);
            debug!(key = %entry.key, "purged expired entry");
            self.notify(&entry, EvictionReason::Expired);
        }
    }

    /// The single removal path: unlinks the node and drops its index entry.
    fn remove_slot(&mut self, idx: usize) -> Option<CacheEntry<V>> {
        let entry = self.recency.remove(idx)?;
        self.index.remove(&entry.key);
        self.stats.set_total_entries(self.index.len());
        Some(entry)
    }

    fn notify(&self, entry: &CacheEntry<V>, reason: EvictionReason) {
        if let Some(listener) = &self.listener {
            listener(entry.key.as_str(), &entry.value, reason);
        }
    }

    /// Checks that the index and recency list describe the same key set.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> std::result::Result<(), String> {
        use std::collections::HashSet;

        if self.index.len() > self.capacity {
            return Err(format!(
                "{} entries exceed capacity {}",
                self.index.len(),
                self.capacity
            ));
        }
        if self.index.len() != self.recency.len() {
            return Err(format!(
                "index has {} keys but recency list has {}",
                self.index.len(),
                self.recency.len()
            ));
        }
        let mut seen = HashSet::new();
        for (idx, entry) in self.recency.iter() {
            if !seen.insert(entry.key.as_str()) {
                return Err(format!("key '{}' appears twice in recency list", entry.key));
            }
            if self.index.get(&entry.key) != Some(&idx) {
                return Err(format!("key '{}' indexed at wrong slot", entry.key));
            }
        }
        if seen.len() != self.index.len() {
            return Err("recency list is shorter than its length".to_string());
        }
        Ok(())
    }

    /// Keys from most to least recently used.
    #[cfg(test)]
    pub(crate) fn keys_by_recency(&self) -> Vec<String> {
        self.recency.iter().map(|(_, e)| e.key.clone()).collect()
    }
}

impl<V: Clone> CacheStore<V> {
    // == Get ==
    /// Retrieves a value by key, marking it most recently used.
    ///
    /// Absent and expired keys both yield None; an expired entry is purged
    /// on the way out.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let Some(&idx) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        let now = self.clock.now_ms();
        if !self.is_live(idx, now) {
            self.expire_slot(idx);
            self.stats.record_miss();
            return None;
        }

        self.recency.move_to_front(idx);
        self.stats.record_hit();
        self.recency.get(idx).map(|entry| entry.value.clone())
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "Key cannot be empty".to_string(),
        ));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidArgument(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
