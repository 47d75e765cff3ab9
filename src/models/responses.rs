//! Response DTOs for the cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::cache::{CacheInfo, CacheStats};

/// Formats a timestamp as ISO-8601 UTC with millisecond precision.
fn to_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Response body for the freshness endpoint (GET /cache/info)
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfoResponse {
    /// When the cache was last written, null after a clear
    pub last_updated_at: Option<String>,
}

impl From<CacheInfo> for CacheInfoResponse {
    fn from(info: CacheInfo) -> Self {
        Self {
            last_updated_at: info.last_updated_at.map(to_iso),
        }
    }
}

/// Response body for the stats endpoint (GET /cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of lookups served from cache
    pub hits: u64,
    /// Number of lookups that ran the compute function
    pub misses: u64,
    /// Number of compute failures
    pub failures: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// When the cache was last written
    pub last_updated_at: Option<String>,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics and freshness info
    pub fn new(stats: &CacheStats, info: CacheInfo) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            failures: stats.failures,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            last_updated_at: info.last_updated_at.map(to_iso),
        }
    }
}

/// Response body for the CLEAR operation (DELETE /cache)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// The cleared namespace, null for a full clear
    pub prefix: Option<String>,
    /// Number of entries removed
    pub removed: usize,
}

impl ClearResponse {
    /// Creates a new ClearResponse
    pub fn new(prefix: Option<&str>, removed: usize) -> Self {
        let message = match prefix {
            Some(prefix) => format!("Cleared {} entries under '{}'", removed, prefix),
            None => format!("Cleared all {} entries", removed),
        };
        Self {
            message,
            prefix: prefix.map(str::to_owned),
            removed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
