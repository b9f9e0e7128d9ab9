//! Hot-reload orchestrator for configuration files.
//!
//! [`ConfigWatcher`] owns a watch strategy, a debouncer and the last known
//! configuration snapshot. The host calls [`ConfigWatcher::tick`] on a
//! timer; once a burst of changes has settled the watcher reloads the main
//! file, diffs every managed section against the snapshot and hands each
//! diff to its section handler.
//!
//! ```text
//! Stopped --start--> Watching --change--> Debouncing --quiet--> reconcile
//!    ^                  ^                     |  ^                  |
//!    |                  |                     +--+ change           |
//!    +------stop--------+-----------------------------------------+
//! ```
//!
//! Nothing here is fatal to the host: a missing file disables the watcher,
//! a failed load keeps the previous snapshot and a failing handler only
//! affects its own section.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::debouncer::Debouncer;
use super::paths::{ImportSet, WatcherConfig};
use super::strategy::{StrategyKind, WatchStrategy, WatchStrategyFactory};
use super::{ChangeHandlerRegistry, WatchError};
use crate::config::HotReloadConfig;
use crate::diff::{DiffCalculator, DiffSummary};
use crate::loader::{ConfigDocument, ConfigLoader, FileConfigLoader};
use crate::notifications::{ChangeEvent, NotificationBroadcaster};

/// Quiet period required before a reconcile.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Lifecycle state of a [`ConfigWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Stopped,
    /// Watching with no pending change.
    Watching,
    /// A change was seen and the debounce window is running.
    Debouncing,
}

/// How section diffs reach their handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcileMode {
    /// `apply` the item-level diff.
    #[default]
    Incremental,
    /// `reload` the whole section whenever it changed.
    FullReload,
}

/// Result of applying one section's diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    Applied { changed: bool },
    /// No handler manages the section; the diff was dropped.
    NoHandler,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReport {
    pub section: String,
    pub summary: DiffSummary,
    pub outcome: SectionOutcome,
}

/// What a reconcile did, per changed section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Watched files whose changes led to this reconcile, in detection
    /// order. Empty for a reconcile requested directly.
    pub changed_paths: Vec<PathBuf>,
    pub sections: Vec<SectionReport>,
}

impl ReloadReport {
    /// The reconcile found no differences.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, name: &str) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.section == name)
    }

    /// Sections whose handler changed its registry.
    pub fn applied_sections(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| matches!(s.outcome, SectionOutcome::Applied { changed: true }))
            .map(|s| s.section.as_str())
            .collect()
    }

    /// Item counts over all changed sections.
    pub fn summary(&self) -> DiffSummary {
        self.sections
            .iter()
            .fold(DiffSummary::default(), |mut total, s| {
                total.added += s.summary.added;
                total.removed += s.summary.removed;
                total.modified += s.summary.modified;
                total.unchanged += s.summary.unchanged;
                total
            })
    }
}

/// What a call to [`ConfigWatcher::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The watcher is stopped.
    Inactive,
    /// Nothing changed.
    Idle,
    /// Changes were detected and the debounce window (re)started.
    ChangeDetected(Vec<PathBuf>),
    /// Waiting for the debounce window to elapse.
    Debouncing,
    /// A reconcile ran.
    Reloaded(ReloadReport),
    /// The configuration could not be loaded; the snapshot is unchanged.
    ReloadFailed { reason: String },
}

type StrategyFn = Box<dyn FnMut() -> Result<Box<dyn WatchStrategy>, WatchError> + Send>;

enum StrategySource {
    Factory {
        factory: WatchStrategyFactory,
        kind: StrategyKind,
    },
    Custom(StrategyFn),
}

impl StrategySource {
    fn create(&mut self) -> Result<Box<dyn WatchStrategy>, WatchError> {
        match self {
            StrategySource::Factory { factory, kind } => factory.create(*kind),
            StrategySource::Custom(create) => create(),
        }
    }
}

/// Watches configuration files and reconciles live registries with them.
pub struct ConfigWatcher {
    loader: Arc<dyn ConfigLoader>,
    handlers: ChangeHandlerRegistry,
    calculator: DiffCalculator,
    strategy_source: StrategySource,
    strategy: Option<Box<dyn WatchStrategy>>,
    debouncer: Debouncer,
    broadcaster: Option<NotificationBroadcaster>,
    enabled: bool,
    mode: ReconcileMode,
    follow_imports: bool,
    state: WatcherState,
    config: Option<WatcherConfig>,
    imports: ImportSet,
    snapshot: ConfigDocument,
}

impl ConfigWatcher {
    pub fn builder() -> ConfigWatcherBuilder {
        ConfigWatcherBuilder::new()
    }

    /// Start watching `main_path` and `import_paths`.
    ///
    /// Returns `false` and stays stopped when hot reload is disabled, the
    /// main file does not exist or no strategy could be created. A running
    /// session is stopped first.
    pub fn start(&mut self, main_path: impl Into<PathBuf>, import_paths: Vec<PathBuf>) -> bool {
        if self.state != WatcherState::Stopped {
            self.stop();
        }

        if !self.enabled {
            crate::log_event!("watcher", "hot reload disabled");
            return false;
        }

        let config = WatcherConfig::new(main_path, import_paths).resolve();
        let main = config.main_config_path.clone();
        if !main.is_file() {
            tracing::warn!(
                "[watcher] config file not found, hot reload disabled: {}",
                main.display()
            );
            return false;
        }

        let mut strategy = match self.strategy_source.create() {
            Ok(strategy) => strategy,
            Err(e) => {
                tracing::warn!("[watcher] no watch strategy available, hot reload disabled: {e}");
                return false;
            }
        };
        crate::log_event!("watcher", "strategy", "{}", strategy.name());

        if let Err(e) = strategy.add_file(&main) {
            tracing::warn!("[watcher] cannot watch {}: {e}", main.display());
            strategy.stop();
            return false;
        }

        self.snapshot = match self.loader.load_raw_config(&main) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("[watcher] initial load failed, starting from an empty snapshot: {e}");
                ConfigDocument::new()
            }
        };

        self.strategy = Some(strategy);
        self.config = Some(config);
        self.sync_imports();
        self.state = WatcherState::Watching;

        crate::log_event!(
            "watcher",
            "started",
            "{} (+{} imports)",
            main.display(),
            self.imports.len()
        );
        true
    }

    /// Advance the watcher by one step. Never blocks on file events.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state == WatcherState::Stopped {
            return TickOutcome::Inactive;
        }

        if self.state == WatcherState::Debouncing
            && let Some(paths) = self.debouncer.take_ready()
        {
            crate::debug_event!("watcher", "debounce elapsed", "{} paths", paths.len());
            self.state = WatcherState::Watching;
            return self.reconcile(paths);
        }

        let changed = match self.strategy.as_mut() {
            Some(strategy) => strategy.check(),
            None => Vec::new(),
        };

        if changed.is_empty() {
            return match self.state {
                WatcherState::Debouncing => TickOutcome::Debouncing,
                _ => TickOutcome::Idle,
            };
        }

        for path in &changed {
            crate::log_event!("watcher", "changed", "{}", path.display());
        }
        self.debouncer.record(changed.iter().cloned());
        self.state = WatcherState::Debouncing;

        TickOutcome::ChangeDetected(changed)
    }

    /// Reconcile immediately, folding in any changes still being debounced.
    pub fn reconcile_now(&mut self) -> TickOutcome {
        if self.state == WatcherState::Stopped {
            return TickOutcome::Inactive;
        }
        let paths = self.debouncer.take_pending();
        self.state = WatcherState::Watching;
        self.reconcile(paths)
    }

    /// Stop watching and release the strategy. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(mut strategy) = self.strategy.take() {
            strategy.stop();
            crate::log_event!("watcher", "stopped");
        }

        self.snapshot = ConfigDocument::new();
        self.imports.clear();
        self.config = None;
        self.debouncer.reset();
        self.state = WatcherState::Stopped;
    }

    /// Replace the explicit import list, watching only the delta.
    ///
    /// The main file watch is left alone. Does nothing while stopped.
    pub fn update_imports(&mut self, import_paths: Vec<PathBuf>) {
        let Some(config) = self.config.as_mut() else {
            crate::debug_event!("watcher", "update_imports ignored, not watching");
            return;
        };
        config.import_paths = import_paths;
        self.sync_imports();
    }

    pub fn is_watching(&self) -> bool {
        self.state != WatcherState::Stopped
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    /// Last successfully loaded configuration.
    pub fn snapshot(&self) -> &ConfigDocument {
        &self.snapshot
    }

    pub fn main_config_path(&self) -> Option<&Path> {
        self.config.as_ref().map(|c| c.main_config_path.as_path())
    }

    /// Import files currently watched.
    pub fn import_paths(&self) -> Vec<PathBuf> {
        self.imports.paths().map(Path::to_path_buf).collect()
    }

    pub fn strategy_name(&self) -> Option<&'static str> {
        self.strategy.as_ref().map(|s| s.name())
    }

    pub fn handlers(&self) -> &ChangeHandlerRegistry {
        &self.handlers
    }

    pub fn debounce(&self) -> Duration {
        self.debouncer.duration()
    }

    /// Reload the main file and route section diffs to their handlers.
    fn reconcile(&mut self, changed_paths: Vec<PathBuf>) -> TickOutcome {
        let Some(main) = self.main_config_path().map(Path::to_path_buf) else {
            return TickOutcome::Inactive;
        };

        crate::log_event!("watcher", "reloading", "{}", main.display());

        let document = match self.loader.load_raw_config(&main) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("[watcher] reload failed, keeping previous configuration: {e}");
                return TickOutcome::ReloadFailed {
                    reason: e.to_string(),
                };
            }
        };

        let diffs = self.calculator.calculate_all(&self.snapshot, &document);
        let mut report = ReloadReport {
            changed_paths,
            ..ReloadReport::default()
        };

        for (section, diff) in &diffs {
            let summary = diff.summary();
            crate::log_event!("watcher", "section changed", "{section}: {summary}");

            let outcome = match self.handlers.get(section) {
                None => {
                    crate::log_event!("watcher", "no handler, diff dropped", "{section}");
                    SectionOutcome::NoHandler
                }
                Some(handler) => {
                    let result = catch_unwind(AssertUnwindSafe(|| match self.mode {
                        ReconcileMode::Incremental => handler.apply(diff),
                        ReconcileMode::FullReload => handler.reload(&document.items(section)),
                    }))
                    .unwrap_or_else(|panic| {
                        Err(WatchError::HandlerFailed {
                            section: section.clone(),
                            reason: panic_message(panic.as_ref()),
                        })
                    });
                    match result {
                        Ok(changed) => SectionOutcome::Applied { changed },
                        Err(e) => {
                            tracing::error!("[watcher] handler for '{section}' failed: {e}");
                            SectionOutcome::Failed {
                                reason: e.to_string(),
                            }
                        }
                    }
                }
            };

            report.sections.push(SectionReport {
                section: section.clone(),
                summary,
                outcome,
            });
        }

        // Advance even when a handler failed, or the same failure repeats on every tick
        self.snapshot = document;

        if self.follow_imports {
            self.sync_imports();
        }

        let total = report.summary();
        if report.is_empty() {
            crate::debug_event!("watcher", "reload complete", "no changes");
        } else {
            crate::log_event!("watcher", "reload complete", "{total}");
        }

        if !report.applied_sections().is_empty()
            && let Some(broadcaster) = &self.broadcaster
        {
            broadcaster.send(ChangeEvent::ConfigReloaded {
                path: main,
                summary: total,
            });
        }

        TickOutcome::Reloaded(report)
    }

    /// Explicit imports, plus the snapshot's `import` section when
    /// following imports.
    fn requested_imports(&self) -> Vec<PathBuf> {
        let Some(config) = self.config.as_ref() else {
            return Vec::new();
        };

        let mut requested = config.import_paths.clone();
        if self.follow_imports {
            for path in self.snapshot.import_paths(config.base_dir()) {
                if !requested.contains(&path) {
                    requested.push(path);
                }
            }
        }
        requested
    }

    fn sync_imports(&mut self) {
        let Some(main) = self.main_config_path().map(Path::to_path_buf) else {
            return;
        };
        let delta = self.imports.delta(&self.requested_imports(), &main);
        if delta.is_empty() {
            return;
        }
        let Some(strategy) = self.strategy.as_mut() else {
            return;
        };

        for path in &delta.removed {
            strategy.remove_file(path);
            self.imports.remove(path);
            crate::log_event!("watcher", "import removed", "{}", path.display());
        }

        for path in delta.added {
            match strategy.add_file(&path) {
                Ok(()) => {
                    crate::log_event!("watcher", "import added", "{}", path.display());
                    self.imports.insert(path);
                }
                Err(e) => {
                    tracing::warn!("[watcher] cannot watch import: {e}");
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("handler panicked: {detail}")
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        if let Some(mut strategy) = self.strategy.take() {
            strategy.stop();
        }
    }
}

impl fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigWatcher")
            .field("state", &self.state)
            .field("main", &self.main_config_path())
            .field("imports", &self.imports)
            .field("strategy", &self.strategy)
            .field("mode", &self.mode)
            .field("handlers", &self.handlers)
            .finish()
    }
}

/// Builder for [`ConfigWatcher`].
pub struct ConfigWatcherBuilder {
    loader: Option<Arc<dyn ConfigLoader>>,
    handlers: ChangeHandlerRegistry,
    calculator: DiffCalculator,
    strategy_source: StrategySource,
    debounce: Duration,
    broadcaster: Option<NotificationBroadcaster>,
    enabled: bool,
    mode: ReconcileMode,
    follow_imports: bool,
}

impl ConfigWatcherBuilder {
    /// Defaults: file loader, no handlers, automatic strategy, 1000 ms
    /// debounce, incremental reconcile.
    pub fn new() -> Self {
        Self {
            loader: None,
            handlers: ChangeHandlerRegistry::new(),
            calculator: DiffCalculator::default(),
            strategy_source: StrategySource::Factory {
                factory: WatchStrategyFactory::default(),
                kind: StrategyKind::Auto,
            },
            debounce: DEFAULT_DEBOUNCE,
            broadcaster: None,
            enabled: true,
            mode: ReconcileMode::Incremental,
            follow_imports: false,
        }
    }

    /// Apply the enable flag, poll interval, debounce window and strategy
    /// from settings.
    pub fn settings(mut self, config: &HotReloadConfig) -> Self {
        self.enabled = config.enabled;
        self.debounce = config.debounce();
        self.strategy_source = StrategySource::Factory {
            factory: WatchStrategyFactory::from_config(config),
            kind: config.strategy,
        };
        self
    }

    pub fn loader(mut self, loader: impl ConfigLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub fn handlers(mut self, handlers: ChangeHandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn calculator(mut self, calculator: DiffCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Build strategies with `factory`, choosing `kind`.
    pub fn strategy_factory(mut self, factory: WatchStrategyFactory, kind: StrategyKind) -> Self {
        self.strategy_source = StrategySource::Factory { factory, kind };
        self
    }

    /// Build strategies with a custom constructor, called on every start.
    pub fn strategy_with<F>(mut self, create: F) -> Self
    where
        F: FnMut() -> Result<Box<dyn WatchStrategy>, WatchError> + Send + 'static,
    {
        self.strategy_source = StrategySource::Custom(Box::new(create));
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Publish a reload summary after every reconcile that changed a
    /// registry.
    pub fn broadcaster(mut self, broadcaster: NotificationBroadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn mode(mut self, mode: ReconcileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Also watch the files listed in the configuration's `import` section.
    pub fn follow_imports(mut self, follow: bool) -> Self {
        self.follow_imports = follow;
        self
    }

    pub fn build(self) -> ConfigWatcher {
        ConfigWatcher {
            loader: self.loader.unwrap_or_else(|| Arc::new(FileConfigLoader::new())),
            handlers: self.handlers,
            calculator: self.calculator,
            strategy_source: self.strategy_source,
            strategy: None,
            debouncer: Debouncer::new(self.debounce),
            broadcaster: self.broadcaster,
            enabled: self.enabled,
            mode: self.mode,
            follow_imports: self.follow_imports,
            state: WatcherState::Stopped,
            config: None,
            imports: ImportSet::new(),
            snapshot: ConfigDocument::new(),
        }
    }
}

impl Default for ConfigWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
