//! Immutable difference between two states of a configuration section.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Items of one section partitioned by identity key.
///
/// The four key sets are pairwise disjoint. `added`, `modified` and
/// `unchanged` hold the new documents; `removed` holds the old ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigDiff<T = Value> {
    added: IndexMap<String, T>,
    removed: IndexMap<String, T>,
    modified: IndexMap<String, T>,
    unchanged: IndexMap<String, T>,
}

impl<T> ConfigDiff<T> {
    pub fn new(
        added: IndexMap<String, T>,
        removed: IndexMap<String, T>,
        modified: IndexMap<String, T>,
        unchanged: IndexMap<String, T>,
    ) -> Self {
        Self {
            added,
            removed,
            modified,
            unchanged,
        }
    }

    /// Diff with no items at all.
    pub fn empty() -> Self {
        Self::new(
            IndexMap::new(),
            IndexMap::new(),
            IndexMap::new(),
            IndexMap::new(),
        )
    }

    /// Items present only in the new state.
    pub fn added(&self) -> &IndexMap<String, T> {
        &self.added
    }

    /// Items present only in the old state.
    pub fn removed(&self) -> &IndexMap<String, T> {
        &self.removed
    }

    /// Items present in both states with different content.
    pub fn modified(&self) -> &IndexMap<String, T> {
        &self.modified
    }

    /// Items present in both states with equal content.
    pub fn unchanged(&self) -> &IndexMap<String, T> {
        &self.unchanged
    }

    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.modified.is_empty()
    }

    /// Number of added, removed and modified items.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            added: self.added.len(),
            removed: self.removed.len(),
            modified: self.modified.len(),
            unchanged: self.unchanged.len(),
        }
    }
}

impl<T> Default for ConfigDiff<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Item counts of a [`ConfigDiff`], used for logging and reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl DiffSummary {
    pub fn has_changes(&self) -> bool {
        self.added + self.removed + self.modified > 0
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_changes() {
            return write!(f, "no changes");
        }

        let mut parts = Vec::new();
        if self.added > 0 {
            parts.push(format!("{} added", self.added));
        }
        if self.removed > 0 {
            parts.push(format!("{} removed", self.removed));
        }
        if self.modified > 0 {
            parts.push(format!("{} modified", self.modified));
        }
        write!(f, "{}", parts.join(", "))
    }
}
