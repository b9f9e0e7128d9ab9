//! Strategy selection.

use std::time::Duration;

use super::{
    DEFAULT_POLL_INTERVAL, NativeWatchStrategy, PollingWatchStrategy, StrategyKind, WatchStrategy,
};
use crate::config::HotReloadConfig;
use crate::watcher::WatchError;

/// Builds watch strategies, preferring native notifications.
#[derive(Debug, Clone, Copy)]
pub struct WatchStrategyFactory {
    poll_interval: Duration,
}

impl WatchStrategyFactory {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn from_config(config: &HotReloadConfig) -> Self {
        Self::new(config.poll_interval())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Build the requested strategy. Only an explicit `Native` request can
    /// fail; `Auto` falls back to polling.
    pub fn create(&self, kind: StrategyKind) -> Result<Box<dyn WatchStrategy>, WatchError> {
        match kind {
            StrategyKind::Auto => Ok(self.create_auto()),
            StrategyKind::Native => Ok(Box::new(self.create_native()?)),
            StrategyKind::Polling => Ok(Box::new(self.create_polling())),
        }
    }

    /// Native notifications if the platform provides them, polling otherwise.
    pub fn create_auto(&self) -> Box<dyn WatchStrategy> {
        match self.create_native() {
            Ok(native) => {
                crate::debug_event!("factory", "native notifications available");
                Box::new(native)
            }
            Err(e) => {
                crate::log_event!("factory", "native notifications unavailable, polling", "{e}");
                Box::new(self.create_polling())
            }
        }
    }

    pub fn create_native(&self) -> Result<NativeWatchStrategy, WatchError> {
        NativeWatchStrategy::new()
    }

    pub fn create_polling(&self) -> PollingWatchStrategy {
        PollingWatchStrategy::new(self.poll_interval)
    }

    /// Check whether the native notification facility can be opened.
    pub fn native_available() -> bool {
        NativeWatchStrategy::new().is_ok()
    }
}

impl Default for WatchStrategyFactory {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}
