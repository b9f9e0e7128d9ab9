//! OS change notifications through `notify`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, TryRecvError};
use indexmap::IndexSet;
use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::WatchStrategy;
use crate::watcher::WatchError;

/// Watches individual files with the platform notification facility
/// (inotify, FSEvents, ReadDirectoryChangesW).
///
/// Idle cost is zero and detection is immediate, but every watched file
/// holds one OS watch. Events are buffered in a channel and drained without
/// blocking on each [`check`](WatchStrategy::check).
///
/// Editors that save atomically replace the file, which drops the OS watch.
/// Such paths are kept as detached and re-armed as soon as the file exists
/// again.
pub struct NativeWatchStrategy {
    /// Dropped on `stop`, which closes the OS handle.
    watcher: Option<RecommendedWatcher>,
    events: Receiver<notify::Result<Event>>,
    /// Registered path -> canonical path.
    by_path: HashMap<PathBuf, PathBuf>,
    /// Canonical path -> registered path.
    by_target: HashMap<PathBuf, PathBuf>,
    /// Registered paths whose OS watch was lost to a delete or rename.
    detached: IndexSet<PathBuf>,
}

impl NativeWatchStrategy {
    /// Open the notification channel.
    pub fn new() -> Result<Self, WatchError> {
        let (tx, rx) = crossbeam_channel::unbounded();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the strategy was dropped
            let _ = tx.send(res);
        })?;

        Ok(Self {
            watcher: Some(watcher),
            events: rx,
            by_path: HashMap::new(),
            by_target: HashMap::new(),
            detached: IndexSet::new(),
        })
    }

    /// Map an event path back to the path it was registered under.
    fn registered_path(&self, event_path: &Path) -> Option<PathBuf> {
        if self.by_path.contains_key(event_path) {
            return Some(event_path.to_path_buf());
        }
        self.by_target.get(event_path).cloned()
    }

    fn watch(&mut self, path: &Path) -> Result<(), WatchError> {
        let watcher = self.watcher.as_mut().ok_or_else(|| WatchError::InitFailed {
            reason: "native watcher already stopped".to_string(),
        })?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) {
        if let Some(watcher) = self.watcher.as_mut()
            && let Err(e) = watcher.unwatch(path)
        {
            // Expected when the OS already dropped the watch
            crate::debug_event!("native", "unwatch failed", "{}: {e}", path.display());
        }
    }

    fn handle_event(&mut self, event: Event, changed: &mut IndexSet<PathBuf>) {
        if !is_relevant(&event.kind) {
            return;
        }

        let watch_lost = matches!(
            event.kind,
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
        );

        for event_path in &event.paths {
            let Some(path) = self.registered_path(event_path) else {
                continue;
            };

            crate::debug_event!("native", "event", "{:?} {}", event.kind, path.display());

            if watch_lost && self.detached.insert(path.clone()) {
                self.unwatch(&path);
            }
            changed.insert(path);
        }
    }

    /// Re-register detached paths that exist again.
    fn rearm(&mut self, changed: &mut IndexSet<PathBuf>) {
        let ready: Vec<PathBuf> = self
            .detached
            .iter()
            .filter(|path| path.exists())
            .cloned()
            .collect();

        for path in ready {
            match self.watch(&path) {
                Ok(()) => {
                    crate::debug_event!("native", "re-armed", "{}", path.display());
                    self.detached.shift_remove(&path);
                    changed.insert(path);
                }
                Err(e) => {
                    crate::debug_event!("native", "re-arm failed", "{}: {e}", path.display());
                }
            }
        }
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) | EventKind::Remove(_) => true,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        _ => false,
    }
}

impl fmt::Debug for NativeWatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeWatchStrategy")
            .field("active", &self.watcher.is_some())
            .field("watched", &self.by_path.len())
            .field("detached", &self.detached.len())
            .finish()
    }
}

impl WatchStrategy for NativeWatchStrategy {
    fn name(&self) -> &'static str {
        "native"
    }

    fn add_file(&mut self, path: &Path) -> Result<(), WatchError> {
        if self.by_path.contains_key(path) {
            return Ok(());
        }
        if !path.exists() {
            return Err(WatchError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let target = path
            .canonicalize()
            .map_err(|e| WatchError::PathWatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        self.watch(path)?;
        self.by_target.insert(target.clone(), path.to_path_buf());
        self.by_path.insert(path.to_path_buf(), target);

        crate::debug_event!("native", "watching", "{}", path.display());
        Ok(())
    }

    fn remove_file(&mut self, path: &Path) {
        let Some(target) = self.by_path.remove(path) else {
            return;
        };
        self.by_target.remove(&target);

        if !self.detached.shift_remove(path) {
            self.unwatch(path);
        }
    }

    fn clear(&mut self) {
        let paths: Vec<PathBuf> = self.by_path.keys().cloned().collect();
        for path in paths {
            self.remove_file(&path);
        }
    }

    fn check(&mut self) -> Vec<PathBuf> {
        let mut changed = IndexSet::new();

        loop {
            match self.events.try_recv() {
                Ok(Ok(event)) => self.handle_event(event, &mut changed),
                Ok(Err(e)) => tracing::warn!("[native] {}", WatchError::event(e)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if !self.detached.is_empty() {
            self.rearm(&mut changed);
        }

        changed.into_iter().collect()
    }

    fn stop(&mut self) {
        self.clear();
        // Dropping the watcher closes the OS handle
        self.watcher = None;
        while self.events.try_recv().is_ok() {}
    }

    fn watched_paths(&self) -> Vec<PathBuf> {
        self.by_path.keys().cloned().collect()
    }
}

impl Drop for NativeWatchStrategy {
    fn drop(&mut self) {
        self.stop();
    }
}
