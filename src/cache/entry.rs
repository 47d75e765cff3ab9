//! Cache Entry Module
//!
//! Defines a single memoized value together with its expiry time.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A type-erased memoized value with an absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value, recovered by downcasting on read
    value: Arc<dyn Any + Send + Sync>,
    /// Expiration instant, None = the TTL overflowed the clock and never expires
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that stays valid for `ttl` after `stored_at`.
    pub fn new<T>(value: T, stored_at: Instant, ttl: Duration) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            value: Arc::new(value),
            expires_at: stored_at.checked_add(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry is stale at `now`.
    ///
    /// An entry is only valid while `expires_at > now`; at the exact expiry
    /// instant it is already stale.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Value ==
    /// Returns a clone of the stored value if it holds a `T`.
    pub fn value<T>(&self) -> Option<T>
    where
        T: Clone + 'static,
    {
        self.value.downcast_ref::<T>().cloned()
    }
}
