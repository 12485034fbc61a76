//! In-memory feature store
//!
//! Keeps groups and features in ordered maps and records an audit trail of
//! every successful mutation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::{Feature, FeatureData, FeatureStore, Group};

/// Kind of mutation recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditAction {
    AddGroup { group: String },
    AddFeature { group: String, name: String },
    RemoveFeature { group: String, name: String },
    UpdateFeature { group: String, name: String },
}

/// One audit trail entry.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Who performed the mutation
    pub actor: String,
    #[serde(flatten)]
    pub action: AuditAction,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    groups: BTreeMap<String, BTreeMap<String, Feature>>,
    audit: Vec<AuditRecord>,
}

impl State {
    fn record(&mut self, actor: &str, action: AuditAction) {
        self.audit.push(AuditRecord {
            actor: actor.to_string(),
            action,
            at: Utc::now(),
        });
    }

    fn upsert(&mut self, actor: &str, data: FeatureData) -> Feature {
        let feature = data.into_feature();

        if !self.groups.contains_key(&feature.group) {
            self.groups.insert(feature.group.clone(), BTreeMap::new());
            self.record(
                actor,
                AuditAction::AddGroup {
                    group: feature.group.clone(),
                },
            );
        }

        if let Some(features) = self.groups.get_mut(&feature.group) {
            features.insert(feature.name.clone(), feature.clone());
        }
        self.record(
            actor,
            AuditAction::AddFeature {
                group: feature.group.clone(),
                name: feature.name.clone(),
            },
        );
        feature
    }
}

/// Feature store held entirely in process memory.
///
/// The audit context is the acting user's name.
#[derive(Debug, Default)]
pub struct MemoryFeatureStore {
    state: RwLock<State>,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the audit trail, oldest first.
    pub async fn audit_log(&self) -> Vec<AuditRecord> {
        self.state.read().await.audit.clone()
    }
}

fn validate_name(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{kind} name cannot be empty")));
    }
    Ok(())
}

fn validate_data(data: &FeatureData) -> Result<()> {
    validate_name("Group", &data.group)?;
    validate_name("Feature", &data.name)
}

#[async_trait]
impl FeatureStore for MemoryFeatureStore {
    type AuditContext = String;

    async fn find_group(&self, name: &str) -> Result<Group> {
        let state = self.state.read().await;
        if state.groups.contains_key(name) {
            Ok(Group::new(name))
        } else {
            Err(StoreError::GroupNotFound(name.to_string()))
        }
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.keys().map(Group::new).collect())
    }

    async fn fetch_group_features(&self, group: &str) -> Result<Vec<Feature>> {
        let state = self.state.read().await;
        state
            .groups
            .get(group)
            .map(|features| features.values().cloned().collect())
            .ok_or_else(|| StoreError::GroupNotFound(group.to_string()))
    }

    async fn fetch_feature(&self, group: &str, feature_name: &str) -> Result<Feature> {
        let state = self.state.read().await;
        let features = state
            .groups
            .get(group)
            .ok_or_else(|| StoreError::GroupNotFound(group.to_string()))?;

        features
            .get(feature_name)
            .cloned()
            .ok_or_else(|| StoreError::feature_not_found(group, feature_name))
    }

    async fn add_group(&self, audit_context: &String, group: &str) -> Result<Group> {
        validate_name("Group", group)?;

        let mut state = self.state.write().await;
        if !state.groups.contains_key(group) {
            state.groups.insert(group.to_string(), BTreeMap::new());
            state.record(
                audit_context,
                AuditAction::AddGroup {
                    group: group.to_string(),
                },
            );
            debug!(group, "Created group");
        }
        Ok(Group::new(group))
    }

    async fn add_feature(&self, audit_context: &String, data: FeatureData) -> Result<Feature> {
        validate_data(&data)?;

        let mut state = self.state.write().await;
        Ok(state.upsert(audit_context, data))
    }

    async fn add_features(
        &self,
        audit_context: &String,
        features: Vec<FeatureData>,
    ) -> Result<Vec<Feature>> {
        features.iter().try_for_each(validate_data)?;

        let mut state = self.state.write().await;
        Ok(features
            .into_iter()
            .map(|data| state.upsert(audit_context, data))
            .collect())
    }

    async fn remove_feature(
        &self,
        audit_context: &String,
        group: &str,
        feature_name: &str,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let removed = state
            .groups
            .get_mut(group)
            .and_then(|features| features.remove(feature_name));

        if removed.is_none() {
            return Err(StoreError::feature_not_found(group, feature_name));
        }

        state.record(
            audit_context,
            AuditAction::RemoveFeature {
                group: group.to_string(),
                name: feature_name.to_string(),
            },
        );
        Ok(())
    }

    async fn update_feature(
        &self,
        audit_context: &String,
        group: &str,
        feature_name: &str,
        data: FeatureData,
    ) -> Result<Feature> {
        validate_data(&data)?;

        let mut state = self.state.write().await;
        let exists = state
            .groups
            .get(group)
            .is_some_and(|features| features.contains_key(feature_name));
        if !exists {
            return Err(StoreError::feature_not_found(group, feature_name));
        }

        let moved = data.group != group || data.name != feature_name;
        if moved {
            let target_taken = state
                .groups
                .get(&data.group)
                .is_some_and(|features| features.contains_key(&data.name));
            if target_taken {
                return Err(StoreError::Validation(format!(
                    "Feature {}/{} already exists",
                    data.group, data.name
                )));
            }
            if let Some(features) = state.groups.get_mut(group) {
                features.remove(feature_name);
            }
            if !state.groups.contains_key(&data.group) {
                state.groups.insert(data.group.clone(), BTreeMap::new());
                state.record(
                    audit_context,
                    AuditAction::AddGroup {
                        group: data.group.clone(),
                    },
                );
            }
        }

        let feature = data.into_feature();
        if let Some(features) = state.groups.get_mut(&feature.group) {
            features.insert(feature.name.clone(), feature.clone());
        }
        state.record(
            audit_context,
            AuditAction::UpdateFeature {
                group: group.to_string(),
                name: feature_name.to_string(),
            },
        );
        Ok(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> String {
        "alice".to_string()
    }

    #[tokio::test]
    async fn test_find_group_missing() {
        let store = MemoryFeatureStore::new();

        let result = store.find_group("missing").await;
        assert_eq!(result, Err(StoreError::GroupNotFound("missing".to_string())));
    }

    #[tokio::test]
    async fn test_add_group_is_idempotent() {
        let store = MemoryFeatureStore::new();

        store.add_group(&actor(), "payments").await.unwrap();
        store.add_group(&actor(), "payments").await.unwrap();

        assert_eq!(store.fetch_groups().await.unwrap(), vec![Group::new("payments")]);
        assert_eq!(store.audit_log().await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_group_rejects_empty_name() {
        let store = MemoryFeatureStore::new();
        let result = store.add_group(&actor(), "  ").await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_feature_creates_group() {
        let store = MemoryFeatureStore::new();

        let feature = store
            .add_feature(&actor(), FeatureData::new("payments", "new-checkout").with_active(true))
            .await
            .unwrap();

        assert!(feature.active);
        assert_eq!(store.find_group("payments").await.unwrap(), Group::new("payments"));
        assert_eq!(
            store.fetch_feature("payments", "new-checkout").await.unwrap(),
            feature
        );

        let log = store.audit_log().await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].actor, "alice");
        assert_eq!(
            log[1].action,
            AuditAction::AddFeature {
                group: "payments".to_string(),
                name: "new-checkout".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_feature_errors() {
        let store = MemoryFeatureStore::new();
        store.add_group(&actor(), "payments").await.unwrap();

        assert_eq!(
            store.fetch_feature("nope", "x").await,
            Err(StoreError::GroupNotFound("nope".to_string()))
        );
        assert_eq!(
            store.fetch_feature("payments", "x").await,
            Err(StoreError::feature_not_found("payments", "x"))
        );
    }

    #[tokio::test]
    async fn test_add_features_is_all_or_nothing() {
        let store = MemoryFeatureStore::new();

        let result = store
            .add_features(
                &actor(),
                vec![FeatureData::new("a", "f1"), FeatureData::new("b", "")],
            )
            .await;

        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store.fetch_groups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_features() {
        let store = MemoryFeatureStore::new();

        let added = store
            .add_features(
                &actor(),
                vec![FeatureData::new("a", "f1"), FeatureData::new("b", "f2")],
            )
            .await
            .unwrap();

        assert_eq!(added.len(), 2);
        assert_eq!(store.fetch_groups().await.unwrap().len(), 2);
        assert_eq!(store.fetch_group_features("b").await.unwrap(), vec![added[1].clone()]);
    }

    #[tokio::test]
    async fn test_remove_feature() {
        let store = MemoryFeatureStore::new();
        store
            .add_feature(&actor(), FeatureData::new("a", "f1"))
            .await
            .unwrap();

        store.remove_feature(&actor(), "a", "f1").await.unwrap();

        assert!(store.fetch_group_features("a").await.unwrap().is_empty());
        assert_eq!(
            store.remove_feature(&actor(), "a", "f1").await,
            Err(StoreError::feature_not_found("a", "f1"))
        );
    }

    #[tokio::test]
    async fn test_update_feature_in_place() {
        let store = MemoryFeatureStore::new();
        store
            .add_feature(&actor(), FeatureData::new("a", "f1"))
            .await
            .unwrap();

        let updated = store
            .update_feature(&actor(), "a", "f1", FeatureData::new("a", "f1").with_active(true))
            .await
            .unwrap();

        assert!(updated.active);
        assert_eq!(store.fetch_feature("a", "f1").await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_feature_moves_between_groups() {
        let store = MemoryFeatureStore::new();
        store
            .add_feature(&actor(), FeatureData::new("a", "f1"))
            .await
            .unwrap();

        store
            .update_feature(&actor(), "a", "f1", FeatureData::new("b", "f2"))
            .await
            .unwrap();

        assert!(store.fetch_feature("a", "f1").await.is_err());
        assert_eq!(store.fetch_feature("b", "f2").await.unwrap().name, "f2");
    }

    #[tokio::test]
    async fn test_update_feature_rejects_taken_target() {
        let store = MemoryFeatureStore::new();
        store
            .add_features(
                &actor(),
                vec![FeatureData::new("a", "f1"), FeatureData::new("a", "f2")],
            )
            .await
            .unwrap();

        let result = store
            .update_feature(&actor(), "a", "f1", FeatureData::new("a", "f2"))
            .await;

        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store.fetch_feature("a", "f1").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_missing_feature() {
        let store = MemoryFeatureStore::new();
        let result = store
            .update_feature(&actor(), "a", "f1", FeatureData::new("a", "f1"))
            .await;
        assert_eq!(result, Err(StoreError::feature_not_found("a", "f1")));
    }

    #[tokio::test]
    async fn test_audit_record_serialize() {
        let store = MemoryFeatureStore::new();
        store.add_group(&actor(), "payments").await.unwrap();

        let json = serde_json::to_value(&store.audit_log().await[0]).unwrap();
        assert_eq!(json["actor"], "alice");
        assert_eq!(json["action"], "add_group");
        assert_eq!(json["group"], "payments");
        assert!(json.get("at").is_some());
    }
}
