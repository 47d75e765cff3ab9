//! API Module
//!
//! HTTP handlers and routing for the cache admin surface.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cache/info` - When the cache was last written
//! - `GET /cache/stats` - Hit/miss counters and freshness
//! - `DELETE /cache` - Clear everything, or one namespace with `?prefix=`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
