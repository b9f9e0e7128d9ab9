//! File-backed configuration loader for YAML, JSON and TOML documents.

use std::path::Path;

use serde_json::Value;

use super::{ConfigDocument, ConfigLoader, LoadError, LoadResult};

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect the format from the file extension. Unknown extensions are
    /// read as YAML, the native format of `context.yaml`.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => ConfigFormat::Json,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Json => "json",
            ConfigFormat::Toml => "toml",
        }
    }

    fn parse(self, text: &str) -> Result<Value, String> {
        match self {
            ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

/// Reads configuration files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileConfigLoader;

impl FileConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse already-read text as a document.
    pub fn parse_str(path: &Path, text: &str, format: ConfigFormat) -> LoadResult<ConfigDocument> {
        if text.trim().is_empty() {
            return Ok(ConfigDocument::new());
        }

        let value = format.parse(text).map_err(|reason| LoadError::Parse {
            path: path.to_path_buf(),
            format: format.name(),
            reason,
        })?;

        ConfigDocument::from_value(value).ok_or_else(|| LoadError::InvalidShape {
            path: path.to_path_buf(),
            reason: "document root must be a mapping of sections".to_string(),
        })
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load_raw_config(&self, path: &Path) -> LoadResult<ConfigDocument> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse_str(path, &text, ConfigFormat::from_path(path))
    }
}
