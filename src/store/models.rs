//! Feature-flag domain models
//!
//! Values exchanged with a [`FeatureStore`](super::FeatureStore). The caching
//! layer never interprets them beyond reading `group` and `name` to derive
//! invalidation keys.

use serde::{Deserialize, Serialize};

/// A named collection of features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A stored feature flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Owning group name
    pub group: String,
    /// Feature name, unique within its group
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Whether the flag is switched on
    pub active: bool,
}

/// Input for creating or updating a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureData {
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl FeatureData {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            description: None,
            active: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Builds the stored form of this data.
    pub fn into_feature(self) -> Feature {
        Feature {
            group: self.group,
            name: self.name,
            description: self.description.unwrap_or_default(),
            active: self.active,
        }
    }
}
