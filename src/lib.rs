//! LRU Cache Server - an in-memory key/value cache service
//!
//! Bounded-capacity storage with per-entry TTL, least-recently-used eviction
//! and a background expiration sweep, served over a small JSON HTTP API.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::SharedCache;
pub use config::Config;
pub use tasks::{spawn_sweep_task, SweepConfig, SweepHandle};
