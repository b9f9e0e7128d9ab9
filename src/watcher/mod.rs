//! Configuration hot reload.
//!
//! Watches the main configuration file and its imports, diffs each managed
//! section against the last loaded configuration and applies the
//! differences to the live registries.
//!
//! # Architecture
//!
//! ```text
//! ConfigWatcher (tick-driven state machine)
//!   - WatchStrategy: native notifications or mtime polling
//!   - Debouncer: collapses bursts of saves
//!   - DiffCalculator: per-section added/removed/modified/unchanged
//!   - ChangeHandlerRegistry routes each section diff
//!         |
//!    +---------+---------+
//!    |         |         |
//!  tools    prompts   documents
//! ```

mod config_watcher;
mod debouncer;
mod driver;
mod error;
mod handler;
pub mod handlers;
mod paths;
mod strategy;

pub use config_watcher::{
    ConfigWatcher, ConfigWatcherBuilder, DEFAULT_DEBOUNCE, ReconcileMode, ReloadReport, SectionOutcome,
    SectionReport, TickOutcome, WatcherState,
};
pub use debouncer::Debouncer;
pub use driver::drive;
pub use error::WatchError;
pub use handler::{ChangeHandler, ChangeHandlerRegistry};
pub use paths::{CONFIG_FILE_NAMES, ImportDelta, ImportSet, WatcherConfig};
pub use strategy::{
    DEFAULT_POLL_INTERVAL, NativeWatchStrategy, PollingWatchStrategy, StrategyKind, WatchStrategy,
    WatchStrategyFactory,
};
