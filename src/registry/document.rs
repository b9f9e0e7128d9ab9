//! Compiled-document item definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ItemError, RegistryItem};

const KIND: &str = "Document";

fn default_overwrite() -> bool {
    true
}

/// A document to compile from a list of sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDefinition {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub output_path: String,
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
    #[serde(default)]
    pub sources: Vec<Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DocumentDefinition {
    pub fn parse(config: &Value) -> Result<Self, ItemError> {
        if !config.is_object() {
            return Err(ItemError::NotAMapping { kind: KIND });
        }

        let mut document: Self = serde_json::from_value(config.clone()).map_err(|e| ItemError::malformed(KIND, e))?;

        if document.description.is_empty() {
            return Err(ItemError::MissingField {
                kind: KIND,
                field: "description",
            });
        }
        if document.output_path.is_empty() {
            return Err(ItemError::MissingField {
                kind: KIND,
                field: "outputPath",
            });
        }

        document.tags.retain(|tag| !tag.is_empty());
        Ok(document)
    }
}

impl RegistryItem for DocumentDefinition {
    const SECTION: &'static str = "documents";
    const KIND: &'static str = KIND;

    fn from_config(config: &Value) -> Result<Self, ItemError> {
        Self::parse(config)
    }

    fn id(&self) -> &str {
        &self.description
    }
}
