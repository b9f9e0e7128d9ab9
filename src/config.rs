//! Configuration module for the hot-reload engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `MCP_` and use double underscores
//! to separate nested levels:
//! - `MCP_HOT_RELOAD__POLL_INTERVAL_MS=500` sets `hot_reload.poll_interval_ms`
//! - `MCP_HOT_RELOAD__STRATEGY=polling` sets `hot_reload.strategy`
//! - `MCP_LOGGING__DEFAULT=debug` sets `logging.default`
//!
//! Two flat variables are also understood for compatibility with existing
//! deployments:
//! - `MCP_HOT_RELOAD=0` sets `hot_reload.enabled`
//! - `MCP_HOT_RELOAD_INTERVAL=1000` sets `hot_reload.poll_interval_ms`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::watcher::StrategyKind;

/// Default settings file looked up in the working directory by [`Settings::load`].
pub const DEFAULT_SETTINGS_FILE: &str = "mcp-hot-reload.toml";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Hot-reload behaviour
    #[serde(default)]
    pub hot_reload: HotReloadConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HotReloadConfig {
    /// Whether configuration changes are picked up at runtime
    #[serde(
        default = "default_true",
        deserialize_with = "figment::util::bool_from_str_or_int"
    )]
    pub enabled: bool,

    /// Polling strategy check interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Quiet period after the last detected change before reloading
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How often the host loop calls `tick()`
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Change detection strategy
    #[serde(default)]
    pub strategy: StrategyKind,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for every module
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides keyed by module path within this crate, e.g. `watcher = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_poll_interval_ms() -> u64 {
    2000
}
fn default_debounce_ms() -> u64 {
    1000
}
fn default_tick_interval_ms() -> u64 {
    250
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            strategy: StrategyKind::default(),
        }
    }
}

impl HotReloadConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources, using `mcp-hot-reload.toml`
    /// in the working directory when it exists.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::figment(Some(PathBuf::from(DEFAULT_SETTINGS_FILE).as_path()))
            .extract()
            .map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(Some(path.as_ref()))
            .extract()
            .map_err(Box::new)
    }

    /// Defaults layered with environment variables only.
    pub fn from_env() -> Result<Self, Box<figment::Error>> {
        Self::figment(None).extract().map_err(Box::new)
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

        if let Some(path) = file {
            // Toml::file silently yields nothing when the file is absent
            figment = figment.merge(Toml::file(path));
        }

        figment
            // Flat legacy variables
            .merge(
                Env::raw()
                    .only(&["MCP_HOT_RELOAD", "MCP_HOT_RELOAD_INTERVAL"])
                    .map(|key| {
                        if key == "mcp_hot_reload_interval" {
                            "hot_reload.poll_interval_ms".into()
                        } else {
                            "hot_reload.enabled".into()
                        }
                    }),
            )
            // Nested variables: MCP_SECTION__FIELD
            .merge(
                Env::prefixed("MCP_")
                    .filter(|key| key.as_str().contains("__"))
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}
