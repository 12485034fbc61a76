//! Error types for feature stores
//!
//! The caching layer adds no error kinds of its own: every variant here is
//! produced by a delegate store and passed through unchanged.

use thiserror::Error;

// == Store Error Enum ==
/// Unified error type returned by [`FeatureStore`](crate::store::FeatureStore) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Group does not exist
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Feature does not exist in the given group
    #[error("Feature not found: {group}/{name}")]
    FeatureNotFound { group: String, name: String },

    /// Input rejected by the store
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Backend failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Convenience constructor for [`StoreError::FeatureNotFound`].
    pub fn feature_not_found(group: impl Into<String>, name: impl Into<String>) -> Self {
        StoreError::FeatureNotFound {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Returns true for the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::GroupNotFound(_) | StoreError::FeatureNotFound { .. }
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for feature store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
