//! Feature Store Module
//!
//! The read/write contract every feature-flag backend implements, the domain
//! models it exchanges, and an in-memory implementation.

mod memory;
mod models;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::{AuditAction, AuditRecord, MemoryFeatureStore};
pub use models::{Feature, FeatureData, Group};

/// Read/write operations of a feature-flag store.
///
/// Implemented by concrete backends and by
/// [`CachingStore`](crate::CachingStore), which can stand in for any of them.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Caller identity attached to mutations. Opaque to wrappers.
    type AuditContext: Send + Sync;

    async fn find_group(&self, name: &str) -> Result<Group>;

    async fn fetch_groups(&self) -> Result<Vec<Group>>;

    async fn fetch_group_features(&self, group: &str) -> Result<Vec<Feature>>;

    async fn fetch_feature(&self, group: &str, feature_name: &str) -> Result<Feature>;

    /// Creates the group if it does not exist yet.
    async fn add_group(&self, audit_context: &Self::AuditContext, group: &str) -> Result<Group>;

    /// Creates or replaces a feature.
    async fn add_feature(&self, audit_context: &Self::AuditContext, data: FeatureData)
        -> Result<Feature>;

    async fn add_features(
        &self,
        audit_context: &Self::AuditContext,
        features: Vec<FeatureData>,
    ) -> Result<Vec<Feature>>;

    async fn remove_feature(
        &self,
        audit_context: &Self::AuditContext,
        group: &str,
        feature_name: &str,
    ) -> Result<()>;

    /// Replaces a feature. `data` may name a different group or name.
    async fn update_feature(
        &self,
        audit_context: &Self::AuditContext,
        group: &str,
        feature_name: &str,
        data: FeatureData,
    ) -> Result<Feature>;
}
