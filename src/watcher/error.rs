//! Error types for the hot-reload watcher.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The notification backend reported an error instead of an event.
    #[error("File system event error: {details}")]
    EventError { details: String },

    /// A section handler could not apply its changes.
    #[error("Handler for section '{section}' failed: {reason}")]
    HandlerFailed { section: String, reason: String },
}

impl WatchError {
    /// Wrap a backend error delivered through the event channel.
    pub(crate) fn event(e: notify::Error) -> Self {
        let details = match e.paths.first() {
            Some(path) => format!("{e} ({})", path.display()),
            None => e.to_string(),
        };
        WatchError::EventError { details }
    }
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        match e.paths.first() {
            Some(path) => WatchError::PathWatchFailed {
                path: path.clone(),
                reason: e.to_string(),
            },
            None => WatchError::InitFailed {
                reason: e.to_string(),
            },
        }
    }
}
