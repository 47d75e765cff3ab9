//! Worlds Cache - In-process memoization for expensive catalog queries
//!
//! Derives structural cache keys, expires values by TTL and invalidates whole
//! namespaces on demand. A small admin API reports freshness and clears
//! entries.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{global, KeyPart, MemoCache};
pub use config::Config;
