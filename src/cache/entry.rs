//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// A single cached item and its expiry metadata.
///
/// Timestamps are milliseconds on the owning store's clock.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Key the entry is indexed under
    pub key: String,
    /// The stored value
    pub value: V,
    /// Time of the last insert or update
    pub created_at: u64,
    /// Expiration time, None = no expiration
    pub expires_at: Option<u64>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry written at `now`.
    ///
    /// A `ttl_seconds` of zero or less means the entry never expires.
    pub fn new(key: String, value: V, ttl_seconds: i64, now: u64) -> Self {
        Self {
            key,
            value,
            created_at: now,
            expires_at: expiry_for(ttl_seconds, now),
        }
    }

    // == Refresh ==
    /// Replaces the value and restarts the TTL from `now`.
    pub fn refresh(&mut self, value: V, ttl_seconds: i64, now: u64) {
        self.value = value;
        self.created_at = now;
        self.expires_at = expiry_for(ttl_seconds, now);
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so it
    /// is dead the moment its TTL has fully elapsed.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining_ms_at(&self, now: u64) -> Option<u64> {
        self.expires_at.map(|expires| expires.saturating_sub(now))
    }

    /// Remaining TTL in whole seconds, rounded up so a live entry never reports 0.
    pub fn ttl_remaining_at(&self, now: u64) -> Option<u64> {
        self.ttl_remaining_ms_at(now).map(|ms| ms.div_ceil(1000))
    }
}

fn expiry_for(ttl_seconds: i64, now: u64) -> Option<u64> {
    if ttl_seconds > 0 {
        Some(now.saturating_add((ttl_seconds as u64).saturating_mul(1000)))
    } else {
        None
    }
}
