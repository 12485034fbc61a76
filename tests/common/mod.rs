//! Shared test fixtures: a delegate store that records every call.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use flag_cache::{Feature, FeatureData, FeatureStore, Group, Result, StoreError};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

/// Audit context with enough structure to check verbatim forwarding.
#[derive(Debug, Clone, PartialEq)]
pub struct Audit {
    pub user: String,
    pub request_id: u32,
}

impl Audit {
    pub fn new(user: &str, request_id: u32) -> Self {
        Self {
            user: user.to_string(),
            request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FindGroup(String),
    FetchGroups,
    FetchGroupFeatures(String),
    FetchFeature(String, String),
    AddGroup(Audit, String),
    AddFeature(Audit, FeatureData),
    AddFeatures(Audit, Vec<FeatureData>),
    RemoveFeature(Audit, String, String),
    UpdateFeature(Audit, String, String, FeatureData),
}

impl Call {
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Call::FindGroup(_)
                | Call::FetchGroups
                | Call::FetchGroupFeatures(_)
                | Call::FetchFeature(..)
        )
    }
}

/// Delegate whose read results embed a revision number bumped by every write,
/// so a stale cached value is distinguishable from a fresh one.
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<Call>>,
    revision: AtomicU64,
    /// Makes every read fail with a storage error
    pub fail_reads: AtomicBool,
    /// Makes every write fail with a storage error
    pub fail_writes: AtomicBool,
    /// Makes `fetch_feature` wait on `release` after signalling `entered`
    pub hold_reads: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn read_count(&self) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.is_read()).count()
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn feature(&self, group: &str, name: &str) -> Feature {
        Feature {
            group: group.to_string(),
            name: name.to_string(),
            description: format!("rev {}", self.revision()),
            active: true,
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn read_result<T>(&self, value: impl FnOnce() -> Result<T>) -> Result<T> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Storage("read failed".to_string()));
        }
        value()
    }

    fn write_result<T>(&self, value: T) -> Result<T> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Storage("write failed".to_string()));
        }
        self.revision.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }
}

#[async_trait]
impl FeatureStore for RecordingStore {
    type AuditContext = Audit;

    async fn find_group(&self, name: &str) -> Result<Group> {
        self.record(Call::FindGroup(name.to_string()));
        self.read_result(|| {
            if name == "missing" {
                Err(StoreError::GroupNotFound(name.to_string()))
            } else {
                Ok(Group::new(name))
            }
        })
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        self.record(Call::FetchGroups);
        self.read_result(|| Ok(vec![Group::new(format!("rev-{}", self.revision()))]))
    }

    async fn fetch_group_features(&self, group: &str) -> Result<Vec<Feature>> {
        self.record(Call::FetchGroupFeatures(group.to_string()));
        self.read_result(|| Ok(vec![self.feature(group, "any")]))
    }

    async fn fetch_feature(&self, group: &str, feature_name: &str) -> Result<Feature> {
        self.record(Call::FetchFeature(group.to_string(), feature_name.to_string()));
        let snapshot = self.read_result(|| Ok(self.feature(group, feature_name)));

        if self.hold_reads.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        snapshot
    }

    async fn add_group(&self, audit_context: &Audit, group: &str) -> Result<Group> {
        self.record(Call::AddGroup(audit_context.clone(), group.to_string()));
        self.write_result(Group::new(format!("{group}-created")))
    }

    async fn add_feature(&self, audit_context: &Audit, data: FeatureData) -> Result<Feature> {
        self.record(Call::AddFeature(audit_context.clone(), data.clone()));
        self.write_result(data.with_description("added").into_feature())
    }

    async fn add_features(
        &self,
        audit_context: &Audit,
        features: Vec<FeatureData>,
    ) -> Result<Vec<Feature>> {
        self.record(Call::AddFeatures(audit_context.clone(), features.clone()));
        self.write_result(features.into_iter().map(FeatureData::into_feature).collect())
    }

    async fn remove_feature(
        &self,
        audit_context: &Audit,
        group: &str,
        feature_name: &str,
    ) -> Result<()> {
        self.record(Call::RemoveFeature(
            audit_context.clone(),
            group.to_string(),
            feature_name.to_string(),
        ));
        self.write_result(())
    }

    async fn update_feature(
        &self,
        audit_context: &Audit,
        group: &str,
        feature_name: &str,
        data: FeatureData,
    ) -> Result<Feature> {
        self.record(Call::UpdateFeature(
            audit_context.clone(),
            group.to_string(),
            feature_name.to_string(),
            data.clone(),
        ));
        self.write_result(data.with_description("updated").into_feature())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "flag_cache=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
