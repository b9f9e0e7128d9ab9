//! Error types for configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading or parsing a configuration document.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {path} as {format}: {reason}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    #[error("Invalid configuration document {path}: {reason}")]
    InvalidShape { path: PathBuf, reason: String },
}

pub type LoadResult<T> = Result<T, LoadError>;
