//! Caching Store
//!
//! Read-through caching decorator for any [`FeatureStore`]. Reads are served
//! from a bounded TTL/LRU cache; writes drop the entries they can affect and
//! are then forwarded unchanged.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::cache::{CacheKey, CacheStats, CacheStore, SharedCache};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::store::{Feature, FeatureData, FeatureStore, Group};
use crate::tasks::spawn_cleanup_task;

// == Cached Value ==
/// Results of the cached read operations.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Group(Group),
    Groups(Vec<Group>),
    Features(Vec<Feature>),
    Feature(Feature),
}

/// Conversion between a read result and its cached form.
trait Cacheable: Clone + Sized {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Self>;
}

impl Cacheable for Group {
    fn into_cached(self) -> CachedValue {
        CachedValue::Group(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Group(group) => Some(group),
            _ => None,
        }
    }
}

impl Cacheable for Vec<Group> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Groups(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Groups(groups) => Some(groups),
            _ => None,
        }
    }
}

impl Cacheable for Vec<Feature> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Features(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Features(features) => Some(features),
            _ => None,
        }
    }
}

impl Cacheable for Feature {
    fn into_cached(self) -> CachedValue {
        CachedValue::Feature(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Feature(feature) => Some(feature),
            _ => None,
        }
    }
}

/// Keys affected by writing the feature `group`/`name`.
fn feature_keys(group: &str, name: &str) -> [CacheKey; 2] {
    [
        CacheKey::fetch_feature(group, name),
        CacheKey::fetch_group_features(group),
    ]
}

// == Caching Store ==
/// Caching decorator around a shared feature store.
///
/// The cache is owned by this value; the delegate is shared with the caller.
/// Only successful reads are cached, and no lock is held while the delegate
/// runs, so concurrent misses on the same key may each reach the delegate.
pub struct CachingStore<S: FeatureStore> {
    delegate: Arc<S>,
    cache: SharedCache<CachedValue>,
    config: CacheConfig,
}

impl<S: FeatureStore> CachingStore<S> {
    /// Wraps `delegate` with the default capacity (100) and TTL (10s).
    pub fn new(delegate: Arc<S>) -> Self {
        Self::with_config(delegate, CacheConfig::default())
    }

    /// Wraps `delegate` with explicit cache settings.
    ///
    /// Zero fields fall back to their defaults.
    pub fn with_config(delegate: Arc<S>, config: CacheConfig) -> Self {
        let config = config.normalized();
        let store = CacheStore::new(config.capacity, config.ttl);
        info!(
            capacity = store.capacity(),
            ttl_secs = config.ttl.as_secs_f64(),
            "Feature cache initialized"
        );

        Self {
            delegate,
            cache: Arc::new(Mutex::new(store)),
            config,
        }
    }

    /// The wrapped store.
    pub fn delegate(&self) -> &Arc<S> {
        &self.delegate
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    /// Number of entries currently held, including not-yet-swept expired ones.
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    /// Drops every cached result.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
        debug!("Feature cache cleared");
    }

    /// Starts the periodic sweep of expired entries at the configured interval.
    ///
    /// Must be called from within a tokio runtime. Abort the handle to stop it.
    pub fn spawn_cleanup_task(&self) -> JoinHandle<()> {
        spawn_cleanup_task(self.cache.clone(), self.config.cleanup_interval)
    }

    /// Like [`spawn_cleanup_task`](Self::spawn_cleanup_task) with an explicit interval.
    ///
    /// A zero interval uses the configured one.
    pub fn spawn_cleanup_task_every(&self, interval: Duration) -> JoinHandle<()> {
        let interval = if interval.is_zero() {
            self.config.cleanup_interval
        } else {
            interval
        };
        spawn_cleanup_task(self.cache.clone(), interval)
    }

    // == Read Through ==
    /// Serves `key` from the cache or fills it from `fetch`.
    ///
    /// Errors from `fetch` are returned as-is and never cached. A fill is
    /// skipped when `key` was invalidated while `fetch` was running.
    async fn read_through<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let ticket = {
            let mut cache = self.cache.lock().await;
            if let Some(cached) = cache.get(&key) {
                let value = T::from_cached(cached);
                debug_assert!(value.is_some(), "cache key {key} holds a mismatched value");
                if let Some(value) = value {
                    debug!(key = %key, "Cache hit");
                    return Ok(value);
                }
            }
            cache.begin_fill(&key)
        };

        debug!(key = %key, "Cache miss");
        let value = match fetch().await {
            Ok(value) => value,
            Err(err) => {
                self.cache.lock().await.abandon_fill(&key);
                debug!(
                    key = %key,
                    not_found = err.is_not_found(),
                    error = %err,
                    "Read failed, not cached"
                );
                return Err(err);
            }
        };

        let stored = self
            .cache
            .lock()
            .await
            .complete_fill(key.clone(), value.clone().into_cached(), ticket);
        if !stored {
            debug!(key = %key, "Skipped cache fill overlapping an invalidation");
        }

        Ok(value)
    }

    // == Invalidate ==
    /// Runs `write` between two invalidations of `keys`.
    ///
    /// The first pass guarantees no stale hit once the write starts; the
    /// second drops anything a concurrent miss stored while it was running.
    async fn invalidate_around<T, Fut>(&self, keys: BTreeSet<CacheKey>, write: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.invalidate(&keys).await;
        let result = write.await;
        self.invalidate(&keys).await;
        result
    }

    async fn invalidate(&self, keys: &BTreeSet<CacheKey>) {
        let mut cache = self.cache.lock().await;
        for key in keys {
            let removed = cache.invalidate(key);
            trace!(key = %key, removed, "Invalidated cache key");
        }
    }
}

#[async_trait]
impl<S: FeatureStore + 'static> FeatureStore for CachingStore<S> {
    type AuditContext = S::AuditContext;

    async fn find_group(&self, name: &str) -> Result<Group> {
        self.read_through(CacheKey::find_group(name), || self.delegate.find_group(name))
            .await
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        self.read_through(CacheKey::fetch_groups(), || self.delegate.fetch_groups())
            .await
    }

    async fn fetch_group_features(&self, group: &str) -> Result<Vec<Feature>> {
        self.read_through(CacheKey::fetch_group_features(group), || {
            self.delegate.fetch_group_features(group)
        })
        .await
    }

    async fn fetch_feature(&self, group: &str, feature_name: &str) -> Result<Feature> {
        self.read_through(CacheKey::fetch_feature(group, feature_name), || {
            self.delegate.fetch_feature(group, feature_name)
        })
        .await
    }

    async fn add_group(&self, audit_context: &Self::AuditContext, group: &str) -> Result<Group> {
        let keys = BTreeSet::from([CacheKey::find_group(group), CacheKey::fetch_groups()]);
        self.invalidate_around(keys, self.delegate.add_group(audit_context, group))
            .await
    }

    async fn add_feature(
        &self,
        audit_context: &Self::AuditContext,
        data: FeatureData,
    ) -> Result<Feature> {
        // The feature's group may be created implicitly, changing the group list.
        let mut keys: BTreeSet<CacheKey> = feature_keys(&data.group, &data.name).into();
        keys.insert(CacheKey::fetch_groups());
        self.invalidate_around(keys, self.delegate.add_feature(audit_context, data))
            .await
    }

    async fn add_features(
        &self,
        audit_context: &Self::AuditContext,
        features: Vec<FeatureData>,
    ) -> Result<Vec<Feature>> {
        let mut keys: BTreeSet<CacheKey> = features
            .iter()
            .flat_map(|data| feature_keys(&data.group, &data.name))
            .collect();
        if !features.is_empty() {
            keys.insert(CacheKey::fetch_groups());
        }
        self.invalidate_around(keys, self.delegate.add_features(audit_context, features))
            .await
    }

    async fn remove_feature(
        &self,
        audit_context: &Self::AuditContext,
        group: &str,
        feature_name: &str,
    ) -> Result<()> {
        let keys = feature_keys(group, feature_name).into();
        self.invalidate_around(
            keys,
            self.delegate
                .remove_feature(audit_context, group, feature_name),
        )
        .await
    }

    async fn update_feature(
        &self,
        audit_context: &Self::AuditContext,
        group: &str,
        feature_name: &str,
        data: FeatureData,
    ) -> Result<Feature> {
        let mut keys: BTreeSet<CacheKey> = feature_keys(group, feature_name).into();
        if data.group != group || data.name != feature_name {
            keys.extend(feature_keys(&data.group, &data.name));
            keys.insert(CacheKey::fetch_groups());
        }
        self.invalidate_around(
            keys,
            self.delegate
                .update_feature(audit_context, group, feature_name, data),
        )
        .await
    }
}
