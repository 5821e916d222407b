//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod clock;
mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use entry::CacheEntry;
pub use lru::LruList;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::{
    CacheStore, EvictionListener, EvictionReason, SweepProgress, EXPIRED_PROBE_WINDOW,
};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes, measured as serialized JSON
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
