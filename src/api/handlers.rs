//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;
use tracing::debug;

use crate::cache::SharedCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The cache handle serializes access internally, so the state is cheap to
/// clone into every request.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: SharedCache<Value>,
    /// TTL in seconds applied when a request omits one
    pub default_ttl: i64,
}

impl AppState {
    /// Creates a new AppState whose entries never expire by default.
    pub fn new(cache: SharedCache<Value>) -> Self {
        Self {
            cache,
            default_ttl: 0,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = SharedCache::new(config.max_entries)?;
        Ok(Self {
            cache,
            default_ttl: config.default_ttl,
        })
    }
}

/// Handler for POST /cache
///
/// Stores a key-value pair with optional TTL. Any body that does not parse
/// into a `SetRequest` is a 400, including a non-integer `ttl`.
pub async fn set_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SetRequest>, JsonRejection>,
) -> Result<Json<SetResponse>> {
    let Json(req) = payload.map_err(|rejection| {
        CacheError::InvalidArgument(rejection.body_text())
    })?;

    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidArgument(error_msg));
    }

    let ttl = req.ttl.unwrap_or(state.default_ttl);
    state.cache.set(req.key.clone(), req.value, ttl)?;
    debug!(key = %req.key, ttl, "value set");

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.delete(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
