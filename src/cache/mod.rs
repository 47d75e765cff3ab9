//! Cache Module
//!
//! In-process memoization with structural keys, TTL expiration and
//! prefix-scoped invalidation.
//!
//! ```ignore
//! use worlds_cache::cache::{global, KeyPart};
//!
//! let stats = global()
//!     .get_or_compute("worlds:timeline:stats", &[KeyPart::from(2024)], || async {
//!         load_timeline_stats(2024).await
//!     })
//!     .await?;
//!
//! // After a write elsewhere:
//! global().clear(Some("worlds:timeline:stats")).await;
//! ```

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::{derive_key, namespace_of, CanonicalId, KeyPart, KEY_DELIMITER};
pub use stats::{CacheStats, StatsCounters};
pub use store::{global, init_global, CacheInfo, MemoCache, DEFAULT_TTL};
