//! End-to-end reloads of real files on disk through the polling strategy.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant, SystemTime};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use mcp_hot_reload::notifications::{ChangeEvent, NotificationBroadcaster};
use mcp_hot_reload::registry::{DocumentDefinition, InMemoryRegistry, ItemRegistry, PromptDefinition, ToolDefinition};
use mcp_hot_reload::watcher::{
    ChangeHandlerRegistry, ConfigWatcher, PollingWatchStrategy, TickOutcome, WatchStrategy, drive,
};

const INITIAL: &str = r#"
tools:
  - id: lint
    description: Run the linter
    commands:
      - cmd: cargo
        args: [clippy]
prompts:
  - id: review
    description: Review a change
    messages:
      - role: user
        content: Review this change
"#;

const UPDATED: &str = r#"
tools:
  - id: lint
    description: Run the linter with warnings denied
    commands:
      - cmd: cargo
        args: [clippy, --, -D, warnings]
  - id: test
    description: Run the tests
    commands:
      - cmd: cargo
        args: [test]
prompts:
  - id: review
    description: Review a change
    messages:
      - role: user
        content: Review this change
"#;

/// Rewrite `path` and push its mtime forward so coarse timestamps still
/// register the change.
fn rewrite(path: &Path, contents: &str, offset_secs: u64) {
    fs::write(path, contents).unwrap();
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
        .unwrap();
}

struct Host {
    tools: Arc<InMemoryRegistry<ToolDefinition>>,
    prompts: Arc<InMemoryRegistry<PromptDefinition>>,
    broadcaster: NotificationBroadcaster,
}

impl Host {
    fn new() -> Self {
        Self {
            tools: Arc::new(InMemoryRegistry::new()),
            prompts: Arc::new(InMemoryRegistry::new()),
            broadcaster: NotificationBroadcaster::new(32),
        }
    }

    fn handlers(&self) -> ChangeHandlerRegistry {
        ChangeHandlerRegistry::with_defaults(
            self.tools.clone(),
            self.prompts.clone(),
            Arc::new(InMemoryRegistry::<DocumentDefinition>::new()),
            self.broadcaster.clone(),
        )
    }

    fn watcher(&self, poll_interval: Duration) -> ConfigWatcher {
        ConfigWatcher::builder()
            .strategy_with(move || {
                let strategy: Box<dyn WatchStrategy> = Box::new(PollingWatchStrategy::new(poll_interval));
                Ok(strategy)
            })
            .handlers(self.handlers())
            .debounce(Duration::ZERO)
            .build()
    }

    /// Load the current snapshot into the registries, as a host does at boot.
    fn seed(&self, watcher: &ConfigWatcher) {
        for (section, handler) in watcher.handlers().iter() {
            handler.reload(&watcher.snapshot().items(section)).unwrap();
        }
    }
}

/// Modified items are re-registered at the end, so compare ids as a set.
fn sorted_ids<T: mcp_hot_reload::registry::RegistryItem>(registry: &InMemoryRegistry<T>) -> Vec<String> {
    let mut ids = registry.ids();
    ids.sort();
    ids
}

fn tick_until_reloaded(watcher: &mut ConfigWatcher, timeout: Duration) -> Option<TickOutcome> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        let outcome = watcher.tick();
        if matches!(outcome, TickOutcome::Reloaded(_) | TickOutcome::ReloadFailed { .. }) {
            return Some(outcome);
        }
        sleep(Duration::from_millis(20));
    }
    None
}

#[test]
fn test_edit_file_updates_registries() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("context.yaml");
    fs::write(&path, INITIAL).unwrap();

    let host = Host::new();
    let mut events = host.broadcaster.subscribe();
    let mut watcher = host.watcher(Duration::ZERO);
    assert!(watcher.start(&path, Vec::new()));
    host.seed(&watcher);
    assert_eq!(host.tools.ids(), vec!["lint"]);
    while events.try_recv().is_ok() {}

    rewrite(&path, UPDATED, 5);

    let Some(TickOutcome::Reloaded(report)) = tick_until_reloaded(&mut watcher, Duration::from_secs(5)) else {
        panic!("edit was not picked up");
    };
    assert_eq!(report.applied_sections(), vec!["tools"]);
    assert!(report.section("prompts").is_none());

    let tools = report.section("tools").unwrap();
    assert_eq!(tools.summary.added, 1);
    assert_eq!(tools.summary.modified, 1);

    assert_eq!(sorted_ids(&host.tools), vec!["lint", "test"]);
    let lint = host.tools.get("lint").unwrap();
    assert_eq!(lint.description, "Run the linter with warnings denied");
    assert_eq!(host.prompts.ids(), vec!["review"]);

    assert_eq!(
        events.try_recv().unwrap(),
        ChangeEvent::ListChanged {
            section: "tools".to_string()
        }
    );
    assert!(events.try_recv().is_err());
}

#[test]
fn test_broken_edit_keeps_registries() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("context.yaml");
    fs::write(&path, INITIAL).unwrap();

    let host = Host::new();
    let mut watcher = host.watcher(Duration::ZERO);
    assert!(watcher.start(&path, Vec::new()));
    host.seed(&watcher);

    rewrite(&path, "tools: [\n  - id: lint\n", 5);
    assert!(matches!(
        tick_until_reloaded(&mut watcher, Duration::from_secs(5)),
        Some(TickOutcome::ReloadFailed { .. })
    ));
    assert_eq!(host.tools.ids(), vec!["lint"]);

    // Fixing the file reconciles against the last good snapshot
    rewrite(&path, UPDATED, 10);
    let Some(TickOutcome::Reloaded(report)) = tick_until_reloaded(&mut watcher, Duration::from_secs(5)) else {
        panic!("fixed file was not picked up");
    };
    assert_eq!(report.section("tools").unwrap().summary.added, 1);
    assert_eq!(sorted_ids(&host.tools), vec!["lint", "test"]);
}

#[test]
fn test_deleted_file_keeps_watcher_alive() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("context.yaml");
    fs::write(&path, INITIAL).unwrap();

    let host = Host::new();
    let mut watcher = host.watcher(Duration::ZERO);
    assert!(watcher.start(&path, Vec::new()));
    host.seed(&watcher);

    fs::remove_file(&path).unwrap();
    assert!(matches!(
        tick_until_reloaded(&mut watcher, Duration::from_secs(5)),
        Some(TickOutcome::ReloadFailed { .. })
    ));
    assert!(watcher.is_watching());

    rewrite(&path, UPDATED, 5);
    assert!(matches!(
        tick_until_reloaded(&mut watcher, Duration::from_secs(5)),
        Some(TickOutcome::Reloaded(_))
    ));
    assert_eq!(sorted_ids(&host.tools), vec!["lint", "test"]);
}

#[test]
fn test_poll_interval_gates_detection() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("context.yaml");
    fs::write(&path, INITIAL).unwrap();

    let host = Host::new();
    let mut watcher = host.watcher(Duration::from_millis(2000));
    assert!(watcher.start(&path, Vec::new()));

    // First check runs immediately and primes the interval
    let started = Instant::now();
    assert_eq!(watcher.tick(), TickOutcome::Idle);

    sleep(Duration::from_millis(100));
    rewrite(&path, UPDATED, 5);

    let mut detected_at = None;
    for _ in 0..6 {
        sleep(Duration::from_millis(500));
        if let TickOutcome::ChangeDetected(paths) = watcher.tick() {
            assert_eq!(paths, vec![path.clone()]);
            detected_at = Some(started.elapsed());
            break;
        }
    }

    let detected_at = detected_at.expect("change was never detected");
    assert!(detected_at >= Duration::from_millis(2000), "detected after {detected_at:?}");
}

#[tokio::test]
async fn test_drive_loop_publishes_changes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("context.yaml");
    fs::write(&path, INITIAL).unwrap();

    let host = Host::new();
    let mut events = host.broadcaster.subscribe();
    let mut watcher = host.watcher(Duration::ZERO);
    assert!(watcher.start(&path, Vec::new()));
    host.seed(&watcher);
    while events.try_recv().is_ok() {}

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(drive(watcher, Duration::from_millis(20), shutdown.clone()));

    rewrite(&path, UPDATED, 5);

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no notification before timeout")
        .unwrap();
    assert_eq!(
        event,
        ChangeEvent::ListChanged {
            section: "tools".to_string()
        }
    );

    shutdown.cancel();
    let watcher = task.await.unwrap();
    assert!(!watcher.is_watching());
    assert_eq!(sorted_ids(&host.tools), vec!["lint", "test"]);
}
