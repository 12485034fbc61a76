//! Flag Cache - read-through caching for feature-flag stores
//!
//! Wraps any [`FeatureStore`] in a [`CachingStore`] that serves reads from a
//! bounded cache with TTL expiration and LRU eviction, and invalidates the
//! affected entries on every write.
//!
//! ```no_run
//! use std::sync::Arc;
//! use flag_cache::{CacheConfig, CachingStore, FeatureStore, MemoryFeatureStore};
//!
//! # async fn demo() -> flag_cache::error::Result<()> {
//! let store = CachingStore::with_config(
//!     Arc::new(MemoryFeatureStore::new()),
//!     CacheConfig::from_env(),
//! );
//! let features = store.fetch_group_features("payments").await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod caching;
pub mod config;
pub mod error;
pub mod store;
pub mod tasks;

pub use caching::{CachedValue, CachingStore};
pub use config::CacheConfig;
pub use error::{Result, StoreError};
pub use store::{Feature, FeatureData, FeatureStore, Group, MemoryFeatureStore};
pub use tasks::spawn_cleanup_task;
