//! Live reconfiguration engine for MCP servers.
//!
//! Watches a context configuration file (and its imports), computes
//! item-level differences for the managed sections (`tools`, `prompts`,
//! `documents`) and applies them to live registries without a restart.

pub mod cli;
pub mod config;
pub mod diff;
pub mod loader;
pub mod logging;
pub mod notifications;
pub mod registry;
pub mod watcher;

pub use config::Settings;
pub use diff::{ConfigDiff, DiffCalculator, DiffSummary};
pub use loader::{ConfigDocument, ConfigLoader, FileConfigLoader, LoadError};
pub use notifications::{ChangeEvent, NotificationBroadcaster};
pub use registry::{InMemoryRegistry, ItemError, ItemRegistry, RegistryItem};
pub use watcher::{ConfigWatcher, TickOutcome, WatchError, WatchStrategy};
