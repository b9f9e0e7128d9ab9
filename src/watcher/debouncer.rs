//! Debouncing of configuration change bursts.
//!
//! Editors often write a file several times in quick succession (save,
//! format, auto-save). The debouncer collapses such a burst into a single
//! reconcile that runs once the files have been quiet for the window.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use indexmap::IndexSet;

/// Tracks the last detected change and the paths seen since the last
/// reconcile.
///
/// Timing is a plain comparison against a recorded `Instant` on each tick;
/// no timer thread is involved.
#[derive(Debug)]
pub struct Debouncer {
    /// Paths changed since the last `take_ready`, in detection order.
    pending: IndexSet<PathBuf>,
    /// When the most recent change was recorded.
    last_change: Option<Instant>,
    /// How long the files must be quiet before a reconcile.
    duration: Duration,
}

impl Debouncer {
    pub fn new(duration: Duration) -> Self {
        Self {
            pending: IndexSet::new(),
            last_change: None,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Record changed paths and re-arm the window.
    pub fn record(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.record_at(paths, Instant::now());
    }

    fn record_at(&mut self, paths: impl IntoIterator<Item = PathBuf>, now: Instant) {
        self.pending.extend(paths);
        self.last_change = Some(now);
    }

    fn is_ready(&self) -> bool {
        self.is_ready_at(Instant::now())
    }

    fn is_ready_at(&self, now: Instant) -> bool {
        self.last_change
            .is_some_and(|last| now.duration_since(last) >= self.duration)
    }

    /// Take the pending paths once the window has elapsed.
    ///
    /// Returns `None` while still debouncing or when nothing is pending.
    pub fn take_ready(&mut self) -> Option<Vec<PathBuf>> {
        if !self.is_ready() {
            return None;
        }
        Some(self.take_pending())
    }

    /// Take the pending paths without waiting for the window.
    pub fn take_pending(&mut self) -> Vec<PathBuf> {
        self.last_change = None;
        self.pending.drain(..).collect()
    }

    /// Forget pending changes without reconciling.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.last_change = None;
    }
}
