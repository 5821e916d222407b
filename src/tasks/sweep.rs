//! TTL Sweep Task
//!
//! Background task that periodically purges expired cache entries.
//!
//! Each pass walks the store's arena in fixed-size batches, taking the cache
//! lock once per batch and yielding between batches so foreground `get`/`set`
//! calls are never stalled behind a full scan.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::SharedCache;
use crate::config::Config;

/// Sweep scheduling parameters.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    /// Time between the start of consecutive passes
    pub interval: Duration,
    /// Arena slots scanned per lock acquisition
    pub batch_size: usize,
}

impl From<&Config> for SweepConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.sweep_interval(),
            batch_size: config.sweep_batch_size,
        }
    }
}

/// Handle to a running sweep task.
///
/// Dropping the handle also stops the task, since the shutdown channel closes.
#[derive(Debug)]
pub struct SweepHandle {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Signals the task to stop after any in-flight pass and waits for it.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                warn!(error = %e, "sweep task ended abnormally");
            }
        }
    }

    /// Cancels the task at its next await point without waiting.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns a background task that periodically purges expired cache entries.
///
/// # Example
/// ```ignore
/// let cache = SharedCache::new(1024)?;
/// let sweeper = spawn_sweep_task(cache.clone(), SweepConfig::from(&config));
/// // Later, during shutdown:
/// sweeper.shutdown().await;
/// ```
pub fn spawn_sweep_task<V>(cache: SharedCache<V>, config: SweepConfig) -> SweepHandle
where
    V: Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(async move {
        info!(
            interval_ms = config.interval.as_millis() as u64,
            batch_size = config.batch_size,
            "Starting TTL sweep task"
        );

        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("TTL sweep task stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = sweep_expired(&cache, config.batch_size).await;
                    if removed > 0 {
                        info!("TTL sweep: removed {} expired entries", removed);
                    } else {
                        debug!("TTL sweep: no expired entries found");
                    }
                }
            }
        }
    });

    SweepHandle {
        shutdown_tx,
        handle,
    }
}

/// Runs one full pass over the cache, one batch per lock acquisition.
///
/// Returns the number of entries purged.
pub async fn sweep_expired<V>(cache: &SharedCache<V>, batch_size: usize) -> usize {
    let mut removed = 0;
    let mut cursor = 0;
    loop {
        let progress = cache.sweep_batch(cursor, batch_size);
        removed += progress.removed;
        match progress.next_cursor {
            Some(next) => {
                cursor = next;
                tokio::task::yield_now().await;
            }
            None => break,
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, ManualClock};
    use std::sync::Arc;

    fn cache_with_clock(capacity: usize) -> (SharedCache<String>, ManualClock) {
        let clock = ManualClock::new();
        let store = CacheStore::with_clock(capacity, Arc::new(clock.clone())).unwrap();
        (SharedCache::from_store(store), clock)
    }

    fn fast_sweep() -> SweepConfig {
        SweepConfig {
            interval: Duration::from_millis(20),
            batch_size: 4,
        }
    }

    #[tokio::test]
    async fn test_sweep_expired_covers_every_batch() {
        let (cache, clock) = cache_with_clock(64);
        for i in 0..50 {
            let ttl = if i % 5 == 0 { 0 } else { 1 };
            cache.set(format!("k{i}"), "v".to_string(), ttl).unwrap();
        }
        clock.advance_secs(1);

        let removed = sweep_expired(&cache, 3).await;

        assert_eq!(removed, 40);
        assert_eq!(cache.len(), 10);
        cache.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let (cache, clock) = cache_with_clock(100);
        cache
            .set("expire_soon", "value".to_string(), 1)
            .unwrap();

        let sweeper = spawn_sweep_task(cache.clone(), fast_sweep());
        clock.advance_secs(2);

        // Give the task a few ticks to run
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.is_empty(), "expired entry should have been swept");
        assert_eq!(cache.stats().expirations, 1);

        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let (cache, clock) = cache_with_clock(100);
        cache.set("long_lived", "value".to_string(), 3600).unwrap();
        cache.set("forever", "value".to_string(), 0).unwrap();

        let sweeper = spawn_sweep_task(cache.clone(), fast_sweep());
        clock.advance_secs(60);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get("long_lived"), Some("value".to_string()));
        assert_eq!(cache.get("forever"), Some("value".to_string()));

        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let (cache, _) = cache_with_clock(10);
        let sweeper = spawn_sweep_task(cache, fast_sweep());

        tokio::time::timeout(Duration::from_secs(1), sweeper.shutdown())
            .await
            .expect("sweep task should stop promptly");
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let (cache, _) = cache_with_clock(10);
        let sweeper = spawn_sweep_task(cache, fast_sweep());

        sweeper.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(sweeper.is_finished(), "Task should be finished after abort");
    }

    #[test]
    fn test_sweep_config_from_config() {
        let config = Config {
            sweep_interval_ms: 500,
            sweep_batch_size: 32,
            ..Config::default()
        };
        let sweep = SweepConfig::from(&config);
        assert_eq!(sweep.interval, Duration::from_millis(500));
        assert_eq!(sweep.batch_size, 32);
    }
}
