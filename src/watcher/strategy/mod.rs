//! Change-detection strategies.
//!
//! A strategy owns the set of watched files and reports which of them
//! changed since the previous [`WatchStrategy::check`]. Two variants exist:
//! [`NativeWatchStrategy`] listens to OS change notifications and
//! [`PollingWatchStrategy`] compares modification times on an interval.

mod factory;
mod native;
mod polling;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::WatchError;

pub use factory::WatchStrategyFactory;
pub use native::NativeWatchStrategy;
pub use polling::{DEFAULT_POLL_INTERVAL, PollingWatchStrategy};

/// Detects changes to a set of individual files.
pub trait WatchStrategy: Send + fmt::Debug {
    /// Strategy name for logging.
    fn name(&self) -> &'static str;

    /// Start watching a file. Fails if the file does not exist.
    fn add_file(&mut self, path: &Path) -> Result<(), WatchError>;

    /// Stop watching a file. Unknown paths are ignored.
    fn remove_file(&mut self, path: &Path);

    /// Stop watching every file.
    fn clear(&mut self);

    /// Paths changed since the previous call. Never blocks.
    fn check(&mut self) -> Vec<PathBuf>;

    /// Release native resources. The strategy watches nothing afterwards.
    fn stop(&mut self);

    /// Currently watched paths, as registered.
    fn watched_paths(&self) -> Vec<PathBuf>;
}

/// Which strategy the factory should build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Native notifications when available, polling otherwise.
    #[default]
    Auto,
    #[serde(alias = "inotify")]
    Native,
    Polling,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Auto => "auto",
            StrategyKind::Native => "native",
            StrategyKind::Polling => "polling",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(StrategyKind::Auto),
            "native" | "inotify" => Ok(StrategyKind::Native),
            "polling" | "poll" => Ok(StrategyKind::Polling),
            other => Err(format!(
                "unknown strategy '{other}', expected auto, native or polling"
            )),
        }
    }
}
