//! Generic configuration document: section name to item documents.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Section holding the list of imported configuration files.
pub const IMPORT_SECTION: &str = "import";

/// A parsed configuration document.
///
/// The document is treated opaquely except for the sections the watcher
/// manages; each managed section is read as an ordered list of item
/// documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    sections: Map<String, Value>,
}

impl ConfigDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a parsed value.
    ///
    /// Returns `None` when the root is not a mapping. `null` (an empty file)
    /// becomes an empty document.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(sections) => Some(Self { sections }),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }

    /// Add or replace a section holding a list of items.
    pub fn with_section(mut self, name: impl Into<String>, items: Vec<Value>) -> Self {
        self.sections.insert(name.into(), Value::Array(items));
        self
    }

    /// Add or replace a section with an arbitrary value.
    pub fn with_raw_section(mut self, name: impl Into<String>, value: Value) -> Self {
        self.sections.insert(name.into(), value);
        self
    }

    /// Item documents of a section, in document order.
    ///
    /// A list yields its elements, a mapping yields its values; a missing
    /// section or any other shape yields no items.
    pub fn items(&self, section: &str) -> Vec<Value> {
        match self.sections.get(section) {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(map)) => map.values().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Raw value of a section.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Files listed in the `import` section, resolved against `base_dir`.
    ///
    /// Entries are either plain strings or mappings with a `path` field.
    /// Wildcard and remote (`scheme://`) entries cannot be watched and are
    /// skipped.
    pub fn import_paths(&self, base_dir: &Path) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for entry in self.items(IMPORT_SECTION) {
            let raw = match &entry {
                Value::String(path) => path.as_str(),
                Value::Object(map) => match map.get("path").and_then(Value::as_str) {
                    Some(path) => path,
                    None => continue,
                },
                _ => continue,
            };

            if raw.is_empty() || raw.contains('*') || raw.contains("://") {
                continue;
            }

            let path = Path::new(raw);
            let resolved = if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            };

            if !paths.contains(&resolved) {
                paths.push(resolved);
            }
        }

        paths
    }
}

impl From<Map<String, Value>> for ConfigDocument {
    fn from(sections: Map<String, Value>) -> Self {
        Self { sections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_items_from_list_and_mapping() {
        let doc = ConfigDocument::from_value(json!({
            "tools": [{"id": "a"}, {"id": "b"}],
            "prompts": {"first": {"id": "p1"}},
            "documents": "not a list",
        }))
        .unwrap();

        assert_eq!(doc.items("tools").len(), 2);
        assert_eq!(doc.items("prompts"), vec![json!({"id": "p1"})]);
        assert!(doc.items("documents").is_empty());
        assert!(doc.items("missing").is_empty());
    }

    #[test]
    fn test_from_value_rejects_non_mapping() {
        assert!(ConfigDocument::from_value(json!([1, 2])).is_none());
        assert!(ConfigDocument::from_value(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_import_paths() {
        let doc = ConfigDocument::from_value(json!({
            "import": [
                "shared/tools.yaml",
                {"path": "prompts.yaml", "type": "local"},
                {"path": "docs/*.yaml"},
                {"url": "https://example.com/context.yaml"},
                "https://example.com/other.yaml",
                "/etc/ctx/global.yaml",
                "shared/tools.yaml",
            ]
        }))
        .unwrap();

        let paths = doc.import_paths(Path::new("/project"));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/project/shared/tools.yaml"),
                PathBuf::from("/project/prompts.yaml"),
                PathBuf::from("/etc/ctx/global.yaml"),
            ]
        );
    }
}
