//! Watched configuration paths.
//!
//! The main configuration file is watched for the whole session; import
//! files come and go as the configuration changes, so they are tracked as a
//! set and updated by delta.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;

/// File names looked up when the main path is a directory.
pub const CONFIG_FILE_NAMES: &[&str] = &["context.yaml", "context.yml", "context.json"];

/// Paths a watch session starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    pub main_config_path: PathBuf,
    pub import_paths: Vec<PathBuf>,
}

impl WatcherConfig {
    pub fn new(main_config_path: impl Into<PathBuf>, import_paths: Vec<PathBuf>) -> Self {
        Self {
            main_config_path: main_config_path.into(),
            import_paths,
        }
    }

    /// Resolve a directory main path to the configuration file inside it.
    ///
    /// The first existing [`CONFIG_FILE_NAMES`] entry wins. A directory
    /// without one is kept as is and fails the existence check on start.
    pub fn resolve(mut self) -> Self {
        if self.main_config_path.is_dir()
            && let Some(file) = CONFIG_FILE_NAMES
                .iter()
                .map(|name| self.main_config_path.join(name))
                .find(|candidate| candidate.is_file())
        {
            self.main_config_path = file;
        }
        self
    }

    /// Directory relative imports are resolved against.
    pub fn base_dir(&self) -> &Path {
        base_dir_of(&self.main_config_path)
    }
}

pub(crate) fn base_dir_of(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Difference between the watched import set and a requested one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDelta {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl ImportDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Currently watched import files, in registration order.
#[derive(Debug, Default)]
pub struct ImportSet {
    paths: IndexSet<PathBuf>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute which paths to add and remove to reach `requested`.
    ///
    /// `main` is never part of the delta: the main file watch is owned by
    /// the session, not by the import list.
    pub fn delta(&self, requested: &[PathBuf], main: &Path) -> ImportDelta {
        let requested: IndexSet<PathBuf> = requested
            .iter()
            .filter(|p| p.as_path() != main)
            .cloned()
            .collect();

        ImportDelta {
            added: requested
                .iter()
                .filter(|p| !self.paths.contains(*p))
                .cloned()
                .collect(),
            removed: self
                .paths
                .iter()
                .filter(|p| !requested.contains(*p))
                .cloned()
                .collect(),
        }
    }

    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        self.paths.shift_remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("context.yml"), "").unwrap();
        fs::write(temp_dir.path().join("context.json"), "{}").unwrap();

        let config = WatcherConfig::new(temp_dir.path(), Vec::new()).resolve();
        assert_eq!(config.main_config_path, temp_dir.path().join("context.yml"));
        assert_eq!(config.base_dir(), temp_dir.path());
    }

    #[test]
    fn test_resolve_keeps_file_and_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = WatcherConfig::new(temp_dir.path(), Vec::new()).resolve();
        assert_eq!(config.main_config_path, temp_dir.path());

        let file = temp_dir.path().join("custom.yaml");
        let config = WatcherConfig::new(&file, Vec::new()).resolve();
        assert_eq!(config.main_config_path, file);
    }

    #[test]
    fn test_base_dir_of_bare_file() {
        assert_eq!(base_dir_of(Path::new("context.yaml")), Path::new("."));
    }

    #[test]
    fn test_delta() {
        let main = PathBuf::from("/cfg/context.yaml");
        let mut set = ImportSet::new();
        set.insert(PathBuf::from("/cfg/a.yaml"));
        set.insert(PathBuf::from("/cfg/b.yaml"));

        let delta = set.delta(
            &[
                PathBuf::from("/cfg/b.yaml"),
                PathBuf::from("/cfg/c.yaml"),
                main.clone(),
                PathBuf::from("/cfg/c.yaml"),
            ],
            &main,
        );

        assert_eq!(delta.added, vec![PathBuf::from("/cfg/c.yaml")]);
        assert_eq!(delta.removed, vec![PathBuf::from("/cfg/a.yaml")]);
    }

    #[test]
    fn test_delta_unchanged_is_empty() {
        let main = PathBuf::from("/cfg/context.yaml");
        let mut set = ImportSet::new();
        set.insert(PathBuf::from("/cfg/a.yaml"));

        assert!(set.delta(&[PathBuf::from("/cfg/a.yaml")], &main).is_empty());
        assert!(set.remove(Path::new("/cfg/a.yaml")));
        assert!(set.is_empty());
    }
}
