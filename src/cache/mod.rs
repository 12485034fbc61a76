//! Cache Module
//!
//! Bounded in-memory caching with TTL expiration and LRU eviction.

mod entry;
mod key;
mod lru;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::Mutex;

// Re-export public types
pub use entry::CacheEntry;
pub use key::{CacheKey, Operation};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{CacheStore, FillTicket};

/// A cache shared between a caching store and its background sweep.
pub type SharedCache<V> = Arc<Mutex<CacheStore<V>>>;
