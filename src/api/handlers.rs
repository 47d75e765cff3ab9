//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::cache::MemoCache;
use crate::error::{CacheError, Result};
use crate::models::{CacheInfoResponse, ClearQuery, ClearResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// Holds a handle to the memo cache; clones share the same entries.
#[derive(Clone)]
pub struct AppState {
    pub cache: MemoCache,
}

impl AppState {
    /// Creates a new AppState around the given cache handle.
    pub fn new(cache: MemoCache) -> Self {
        Self { cache }
    }

    /// Creates a new AppState backed by the process-wide cache.
    ///
    /// The global cache is created with the configured default TTL unless
    /// something already touched it.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(crate::cache::init_global(config.default_ttl()).clone())
    }
}

/// Handler for GET /cache/info
pub async fn info_handler(State(state): State<AppState>) -> Json<CacheInfoResponse> {
    Json(state.cache.info().await.into())
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    let info = state.cache.info().await;

    Json(StatsResponse::new(&stats, info))
}

/// Handler for DELETE /cache
///
/// Clears one namespace when `prefix` is given, otherwise everything.
pub async fn clear_handler(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<ClearResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let scope = query.scope();
    let removed = state.cache.clear(scope).await;

    Ok(Json(ClearResponse::new(scope, removed)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
