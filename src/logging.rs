//! Log output for the watcher, its strategies and the section handlers.
//!
//! Events carry a bracketed component tag so a reload can be followed
//! across modules in one stream:
//!
//! ```text
//! 14:02:11.317 DEBUG mcp_hot_reload::watcher::strategy::native: [native] event: Modify(Data(Content)) context.yaml
//! 14:02:11.418  INFO mcp_hot_reload::watcher::config_watcher: [watcher] section changed: tools: 1 added, 1 modified
//! ```
//!
//! Tags in use: `watcher`, `driver`, `factory`, `native`, `polling`,
//! `notify`, `diff`, `handlers`, `tools`, `broadcast`.
//!
//! # Configuration
//!
//! Per-module levels name modules of this crate by their short path:
//!
//! ```toml
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! watcher = "debug"              # mcp_hot_reload::watcher and below
//! "watcher::strategy" = "trace"
//! ```
//!
//! `RUST_LOG` replaces the configured levels entirely:
//! ```bash
//! RUST_LOG=mcp_hot_reload::diff=trace mcp-hot-reload watch context.yaml
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// HH:MM:SS.mmm, enough to line up debounce windows by eye.
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Qualify a short module name with this crate's target.
///
/// Names that already start with the crate name are kept as they are.
fn module_target(module: &str) -> String {
    let module = module.trim().trim_start_matches("::");
    if module == CRATE_TARGET || module.starts_with(&format!("{CRATE_TARGET}::")) {
        module.to_string()
    } else {
        format!("{CRATE_TARGET}::{module}")
    }
}

/// Directive string for `config`, module overrides sorted by target.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut modules: Vec<(String, &str)> = config
        .modules
        .iter()
        .map(|(module, level)| (module_target(module), level.as_str()))
        .collect();
    modules.sort();

    let mut directives = config.default.clone();
    for (target, level) in modules {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Filter from `RUST_LOG` when it is set, from `config` otherwise.
///
/// Unparseable directives are dropped by `EnvFilter` rather than failing
/// startup.
fn build_filter(config: &LoggingConfig, rust_log: Option<&str>) -> EnvFilter {
    match rust_log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new(filter_directives(config)),
    }
}

/// Install the stderr subscriber. Only the first call has any effect.
///
/// Stdout is left to the CLI's command output. When the embedding host
/// already installed a global subscriber, that one is kept.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let rust_log = std::env::var("RUST_LOG").ok();
        let filter = build_filter(config, rust_log.as_deref());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}

/// [`init_with_config`] with `warn` everywhere.
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Info-level event tagged with a component.
///
/// # Examples
/// ```ignore
/// log_event!("watcher", "section changed", "{section}: {summary}");
/// log_event!("watcher", "stopped");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Debug-level counterpart of [`log_event!`], for per-event detail such as
/// raw notify events and debounce resets.
///
/// # Examples
/// ```ignore
/// debug_event!("native", "re-armed", "{}", path.display());
/// ```
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(modules: &[(&str, &str)]) -> LoggingConfig {
        LoggingConfig {
            default: "warn".to_string(),
            modules: modules
                .iter()
                .map(|(m, l)| (m.to_string(), l.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_short_module_names_are_qualified() {
        assert_eq!(module_target("watcher"), "mcp_hot_reload::watcher");
        assert_eq!(
            module_target("watcher::strategy"),
            "mcp_hot_reload::watcher::strategy"
        );
        assert_eq!(module_target("mcp_hot_reload::diff"), "mcp_hot_reload::diff");
        assert_eq!(module_target("mcp_hot_reload"), "mcp_hot_reload");
    }

    #[test]
    fn test_filter_directives_sorted() {
        let config = config(&[("watcher", "debug"), ("diff", "trace")]);
        assert_eq!(
            filter_directives(&config),
            "warn,mcp_hot_reload::diff=trace,mcp_hot_reload::watcher=debug"
        );
        assert_eq!(filter_directives(&LoggingConfig::default()), "warn");
    }

    #[test]
    fn test_rust_log_replaces_config() {
        let config = config(&[("watcher", "debug")]);

        let from_config = build_filter(&config, None).to_string();
        assert!(from_config.contains("mcp_hot_reload::watcher=debug"));

        let from_env = build_filter(&config, Some("mcp_hot_reload::diff=trace")).to_string();
        assert!(from_env.contains("mcp_hot_reload::diff=trace"));
        assert!(!from_env.contains("watcher"));
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init_with_config(&config(&[("watcher", "trace")]));
    }
}
