//! Cache Key Module
//!
//! Builds deterministic, collision-free keys from an operation name and its
//! ordered arguments, e.g. `fetchFeature:payments:new-checkout`.

use std::fmt;

/// Separator between the operation name and each argument.
const SEPARATOR: char = ':';
const ESCAPE: char = '\\';

// == Operation ==
/// Cached read operations. Each one owns a distinct key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindGroup,
    FetchGroups,
    FetchGroupFeatures,
    FetchFeature,
}

impl Operation {
    /// Name used as the key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FindGroup => "findGroup",
            Operation::FetchGroups => "fetchGroups",
            Operation::FetchGroupFeatures => "fetchGroupFeatures",
            Operation::FetchFeature => "fetchFeature",
        }
    }

    /// Number of arguments the operation's key embeds.
    pub fn arity(&self) -> usize {
        match self {
            Operation::FetchGroups => 0,
            Operation::FindGroup | Operation::FetchGroupFeatures => 1,
            Operation::FetchFeature => 2,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Cache Key ==
/// Immutable cache key.
///
/// Arguments have `\` and `:` escaped, so a separator inside an argument can
/// never be confused with the boundary between two arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for `operation` applied to `args`, in order.
    pub fn new(operation: Operation, args: &[&str]) -> Self {
        debug_assert_eq!(args.len(), operation.arity(), "wrong arity for {operation}");

        let capacity = operation.as_str().len() + args.iter().map(|a| a.len() + 1).sum::<usize>();
        let mut key = String::with_capacity(capacity);
        key.push_str(operation.as_str());

        for arg in args {
            key.push(SEPARATOR);
            for ch in arg.chars() {
                if ch == SEPARATOR || ch == ESCAPE {
                    key.push(ESCAPE);
                }
                key.push(ch);
            }
        }

        Self(key)
    }

    /// `findGroup:<name>`
    pub fn find_group(name: &str) -> Self {
        Self::new(Operation::FindGroup, &[name])
    }

    /// `fetchGroups`
    pub fn fetch_groups() -> Self {
        Self::new(Operation::FetchGroups, &[])
    }

    /// `fetchGroupFeatures:<group>`
    pub fn fetch_group_features(group: &str) -> Self {
        Self::new(Operation::FetchGroupFeatures, &[group])
    }

    /// `fetchFeature:<group>:<feature_name>`
    pub fn fetch_feature(group: &str, feature_name: &str) -> Self {
        Self::new(Operation::FetchFeature, &[group, feature_name])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
