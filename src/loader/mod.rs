//! Configuration loading.
//!
//! The watcher consumes configuration through the [`ConfigLoader`] trait so
//! that hosts can plug in their own parser. [`FileConfigLoader`] covers the
//! common YAML / JSON / TOML case.

mod document;
mod error;
mod file;

use std::path::Path;

pub use document::{ConfigDocument, IMPORT_SECTION};
pub use error::{LoadError, LoadResult};
pub use file::{ConfigFormat, FileConfigLoader};

/// Loads a configuration document from a path.
pub trait ConfigLoader: Send + Sync {
    /// Read and parse the document at `path`.
    fn load_raw_config(&self, path: &Path) -> LoadResult<ConfigDocument>;
}

impl<F> ConfigLoader for F
where
    F: Fn(&Path) -> LoadResult<ConfigDocument> + Send + Sync,
{
    fn load_raw_config(&self, path: &Path) -> LoadResult<ConfigDocument> {
        self(path)
    }
}
