//! Set reconciliation between two snapshots of a configuration section.

use indexmap::IndexMap;
use serde_json::Value;

use super::ConfigDiff;
use super::identity::{identity_of, items_equal};
use crate::loader::ConfigDocument;

/// A managed section and the field that identifies its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpec {
    pub name: String,
    pub identity_key: String,
}

impl SectionSpec {
    pub fn new(name: impl Into<String>, identity_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_key: identity_key.into(),
        }
    }
}

/// Computes item-level diffs for the managed sections of a document.
#[derive(Debug, Clone)]
pub struct DiffCalculator {
    sections: Vec<SectionSpec>,
}

impl Default for DiffCalculator {
    /// `tools` and `prompts` keyed by `id`, `documents` keyed by `description`.
    fn default() -> Self {
        Self {
            sections: vec![
                SectionSpec::new("tools", "id"),
                SectionSpec::new("prompts", "id"),
                SectionSpec::new("documents", "description"),
            ],
        }
    }
}

impl DiffCalculator {
    pub fn new(sections: Vec<SectionSpec>) -> Self {
        Self { sections }
    }

    /// Manage an additional section, or change the identity key of an
    /// existing one.
    pub fn with_section(mut self, spec: SectionSpec) -> Self {
        match self.sections.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.sections.push(spec),
        }
        self
    }

    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    pub fn identity_key(&self, section: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .map(|s| s.identity_key.as_str())
    }

    /// Diff two item lists of one section.
    pub fn calculate(&self, old_items: &[Value], new_items: &[Value], identity_key: &str) -> ConfigDiff {
        let old_by_id = index_by_identity(old_items, identity_key);
        let new_by_id = index_by_identity(new_items, identity_key);

        let mut added = IndexMap::new();
        let mut modified = IndexMap::new();
        let mut unchanged = IndexMap::new();

        for (id, new_item) in &new_by_id {
            match old_by_id.get(id) {
                None => {
                    added.insert(id.clone(), (*new_item).clone());
                }
                Some(old_item) if items_equal(old_item, new_item) => {
                    unchanged.insert(id.clone(), (*new_item).clone());
                }
                Some(_) => {
                    modified.insert(id.clone(), (*new_item).clone());
                }
            }
        }

        let removed = old_by_id
            .iter()
            .filter(|(id, _)| !new_by_id.contains_key(*id))
            .map(|(id, item)| (id.clone(), (*item).clone()))
            .collect();

        ConfigDiff::new(added, removed, modified, unchanged)
    }

    /// Diff every managed section, keeping only sections with changes.
    pub fn calculate_all(&self, old: &ConfigDocument, new: &ConfigDocument) -> IndexMap<String, ConfigDiff> {
        let mut diffs = IndexMap::new();

        for spec in &self.sections {
            let diff = self.calculate(
                &old.items(&spec.name),
                &new.items(&spec.name),
                &spec.identity_key,
            );

            if diff.has_changes() {
                diffs.insert(spec.name.clone(), diff);
            }
        }

        diffs
    }
}

/// Index mapping items by identity. Non-mapping entries are ignored; when two
/// items share an identity the later one wins.
fn index_by_identity<'a>(items: &'a [Value], identity_key: &str) -> IndexMap<String, &'a Value> {
    let mut indexed = IndexMap::with_capacity(items.len());

    for item in items {
        if !item.is_object() {
            crate::debug_event!("diff", "skipped non-mapping item", "{item}");
            continue;
        }

        let id = identity_of(item, identity_key);
        if indexed.insert(id.clone(), item).is_some() {
            crate::debug_event!("diff", "duplicate identity", "{identity_key}={id}");
        }
    }

    indexed
}
