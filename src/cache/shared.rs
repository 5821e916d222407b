//! Shared Cache Module
//!
//! Thread-safe handle over a single `CacheStore`.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{CacheStats, CacheStore, EvictionReason, SweepProgress};
use crate::error::Result;

// == Shared Cache ==
/// Cloneable, thread-safe handle to one cache store.
///
/// Every method takes the lock for exactly one logical operation, so lookup,
/// recency update, eviction and insertion are never observed half-done. The
/// store is not reachable any other way.
#[derive(Debug)]
pub struct SharedCache<V> {
    inner: Arc<Mutex<CacheStore<V>>>,
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> SharedCache<V> {
    /// Creates a handle over a fresh store of the given capacity.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::from_store(CacheStore::new(capacity)?))
    }

    /// Wraps an already configured store.
    pub fn from_store(store: CacheStore<V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl_seconds: i64) -> Result<()> {
        self.inner.lock().set(key.into(), value, ttl_seconds)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().delete(key)
    }

    pub fn ttl(&self, key: &str) -> Option<Option<u64>> {
        self.inner.lock().ttl(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Scans one bounded batch for expired entries; see [`CacheStore::sweep_batch`].
    pub fn sweep_batch(&self, cursor: usize, batch_size: usize) -> SweepProgress {
        self.inner.lock().sweep_batch(cursor, batch_size)
    }

    pub fn set_eviction_listener<F>(&self, listener: F)
    where
        F: Fn(&str, &V, EvictionReason) + Send + Sync + 'static,
    {
        self.inner.lock().set_eviction_listener(listener);
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> std::result::Result<(), String> {
        self.inner.lock().check_invariants()
    }
}

impl<V: Clone> SharedCache<V> {
    /// Returns a copy of the live value for `key`, refreshing its recency.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key)
    }
}
