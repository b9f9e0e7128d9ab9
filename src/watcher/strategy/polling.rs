//! Modification-time polling.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use indexmap::IndexMap;

use super::WatchStrategy;
use crate::watcher::WatchError;

/// Default interval between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileState {
    Present(SystemTime),
    Missing,
}

impl FileState {
    fn read(path: &Path) -> Self {
        match std::fs::metadata(path).and_then(|meta| meta.modified()) {
            Ok(modified) => FileState::Present(modified),
            Err(_) if path.exists() => FileState::Present(SystemTime::UNIX_EPOCH),
            Err(_) => FileState::Missing,
        }
    }
}

/// Compares file modification times, at most once per interval.
///
/// Works on every platform and file system at the cost of detection
/// latency. A deleted file is reported once when it disappears and again
/// when it comes back.
#[derive(Debug)]
pub struct PollingWatchStrategy {
    interval: Duration,
    files: IndexMap<PathBuf, FileState>,
    last_check: Option<Instant>,
}

impl PollingWatchStrategy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            files: IndexMap::new(),
            last_check: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn poll(&mut self) -> Vec<PathBuf> {
        let mut changed = Vec::new();

        for (path, state) in self.files.iter_mut() {
            let current = FileState::read(path);
            let report = match (*state, current) {
                (FileState::Present(seen), FileState::Present(now)) => now > seen,
                (FileState::Present(_), FileState::Missing) => {
                    crate::debug_event!("polling", "deleted", "{}", path.display());
                    true
                }
                (FileState::Missing, FileState::Present(_)) => true,
                (FileState::Missing, FileState::Missing) => false,
            };

            if report {
                *state = current;
                changed.push(path.clone());
            }
        }

        changed
    }
}

impl Default for PollingWatchStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl WatchStrategy for PollingWatchStrategy {
    fn name(&self) -> &'static str {
        "polling"
    }

    fn add_file(&mut self, path: &Path) -> Result<(), WatchError> {
        match FileState::read(path) {
            FileState::Missing => Err(WatchError::FileNotFound {
                path: path.to_path_buf(),
            }),
            state => {
                self.files.insert(path.to_path_buf(), state);
                crate::debug_event!("polling", "watching", "{}", path.display());
                Ok(())
            }
        }
    }

    fn remove_file(&mut self, path: &Path) {
        self.files.shift_remove(path);
    }

    fn clear(&mut self) {
        self.files.clear();
    }

    fn check(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        if let Some(last) = self.last_check
            && now.duration_since(last) < self.interval
        {
            return Vec::new();
        }

        self.last_check = Some(now);
        self.poll()
    }

    fn stop(&mut self) {
        self.files.clear();
        self.last_check = None;
    }

    fn watched_paths(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }
}
