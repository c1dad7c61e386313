//! Listing filter carried from the boundary into the file service.

use serde::{Deserialize, Serialize};

/// A single-attribute filter with an optional result limit.
///
/// `key` names the attribute (`name`, `mime`, `size`, `created`, ...),
/// `value` is the predicate argument, and a positive `limit` truncates the
/// filtered result. An empty key or value disables filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    /// Attribute to filter on.
    #[serde(default)]
    pub key: String,
    /// Predicate argument.
    #[serde(default)]
    pub value: String,
    /// Maximum number of results; `0` means unlimited.
    #[serde(default)]
    pub limit: usize,
}

impl FileFilter {
    /// Create a filter on `key` with `value` and no limit.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            limit: 0,
        }
    }

    /// Return a copy of this filter with the given limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether this filter selects a subset (both key and value present).
    pub fn is_active(&self) -> bool {
        !self.key.is_empty() && !self.value.is_empty()
    }
}
