//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of live entries the cache can hold
    pub max_entries: usize,
    /// TTL in seconds applied when a request carries none (0 = never expires)
    pub default_ttl: i64,
    /// HTTP server port
    pub server_port: u16,
    /// Interval between active expiration sweeps, in milliseconds
    pub sweep_interval_ms: u64,
    /// Maximum number of slots scanned per lock acquisition during a sweep
    pub sweep_batch_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1024)
    /// - `DEFAULT_TTL` - Default TTL in seconds, 0 disables expiry (default: 0)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `SWEEP_INTERVAL_MS` - Active sweep period in milliseconds (default: 1000)
    /// - `SWEEP_BATCH_SIZE` - Slots scanned per sweep batch (default: 256)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            sweep_interval_ms: env_or("SWEEP_INTERVAL_MS", defaults.sweep_interval_ms),
            sweep_batch_size: env_or("SWEEP_BATCH_SIZE", defaults.sweep_batch_size),
        }
    }

    // == Validate ==
    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfiguration(
                "MAX_ENTRIES must be greater than zero".to_string(),
            ));
        }
        if self.default_ttl < 0 {
            return Err(CacheError::InvalidConfiguration(
                "DEFAULT_TTL must not be negative".to_string(),
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(CacheError::InvalidConfiguration(
                "SWEEP_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }
        if self.sweep_batch_size == 0 {
            return Err(CacheError::InvalidConfiguration(
                "SWEEP_BATCH_SIZE must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Sweep period as a Duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            default_ttl: 0,
            server_port: 8080,
            sweep_interval_ms: 1000,
            sweep_batch_size: 256,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
