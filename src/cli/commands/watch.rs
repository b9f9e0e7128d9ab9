//! Watch command - serve in-memory registries and apply configuration
//! changes until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::notifications::{self, ChangeEvent, NotificationBroadcaster};
use crate::registry::{DocumentRegistry, ItemRegistry, PromptRegistry, ToolRegistry};
use crate::watcher::{self, ChangeHandlerRegistry, ConfigWatcher, ReconcileMode, StrategyKind};

/// Arguments for the watch command.
pub struct WatchArgs {
    pub path: PathBuf,
    pub imports: Vec<PathBuf>,
    pub strategy: Option<StrategyKind>,
    pub poll_interval_ms: Option<u64>,
    pub debounce_ms: Option<u64>,
    pub follow_imports: bool,
    pub full_reload: bool,
}

/// Run the watch command.
pub async fn run(args: WatchArgs, settings: Settings) -> anyhow::Result<()> {
    let mut hot_reload = settings.hot_reload;
    if let Some(strategy) = args.strategy {
        hot_reload.strategy = strategy;
    }
    if let Some(ms) = args.poll_interval_ms {
        hot_reload.poll_interval_ms = ms;
    }
    if let Some(ms) = args.debounce_ms {
        hot_reload.debounce_ms = ms;
    }

    if !hot_reload.enabled {
        eprintln!("Hot reload is disabled (MCP_HOT_RELOAD / hot_reload.enabled)");
        return Ok(());
    }

    let broadcaster = NotificationBroadcaster::new(100);
    let tools = Arc::new(ToolRegistry::new());
    let prompts = Arc::new(PromptRegistry::new());
    let documents = Arc::new(DocumentRegistry::new());

    let handlers = ChangeHandlerRegistry::with_defaults(
        tools.clone(),
        prompts.clone(),
        documents.clone(),
        broadcaster.clone(),
    );

    let mode = if args.full_reload {
        ReconcileMode::FullReload
    } else {
        ReconcileMode::Incremental
    };

    let mut watcher = ConfigWatcher::builder()
        .settings(&hot_reload)
        .handlers(handlers)
        .broadcaster(broadcaster.clone())
        .mode(mode)
        .follow_imports(args.follow_imports)
        .build();

    if !watcher.start(&args.path, args.imports) {
        anyhow::bail!("cannot watch {}", args.path.display());
    }

    // Registries start from the configuration as loaded on startup
    for (section, handler) in watcher.handlers().iter() {
        if let Err(e) = handler.reload(&watcher.snapshot().items(section)) {
            tracing::warn!("[watch] initial load of '{section}' failed: {e}");
        }
    }

    eprintln!(
        "Watching {} with {} strategy ({} tools, {} prompts, {} documents)",
        watcher
            .main_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        watcher.strategy_name().unwrap_or("unknown"),
        tools.len(),
        prompts.len(),
        documents.len()
    );
    for import in watcher.import_paths() {
        eprintln!("  + {}", import.display());
    }
    eprintln!("Press Ctrl-C to stop");

    let printer = {
        let (tools, prompts, documents) = (tools.clone(), prompts.clone(), documents.clone());
        tokio::spawn(notifications::listen(broadcaster.subscribe(), move |event| {
            match &event {
                ChangeEvent::ListChanged { section } => {
                    let ids = match section.as_str() {
                        "tools" => tools.ids(),
                        "prompts" => prompts.ids(),
                        "documents" => documents.ids(),
                        _ => Vec::new(),
                    };
                    println!("{event}: [{}]", ids.join(", "));
                }
                ChangeEvent::ConfigReloaded { .. } => println!("{event}"),
            }
        }))
    };

    let shutdown = CancellationToken::new();
    let driver = tokio::spawn(watcher::drive(
        watcher,
        hot_reload.tick_interval(),
        shutdown.clone(),
    ));

    tokio::signal::ctrl_c().await?;
    eprintln!("Stopping");
    shutdown.cancel();

    driver.await?;
    printer.abort();

    Ok(())
}
