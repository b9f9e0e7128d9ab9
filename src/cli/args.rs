//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::watcher::StrategyKind;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Live reconfiguration for MCP servers
#[derive(Parser, Debug)]
#[command(
    name = "mcp-hot-reload",
    version = env!("CARGO_PKG_VERSION"),
    about = "Watch, diff and reconcile MCP server configuration",
    long_about = "Watch a context configuration file and keep tools, prompts and documents in sync with it.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom mcp-hot-reload.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch a configuration file and print registry changes
    #[command(
        about = "Watch a configuration file and apply changes live",
        after_help = "Examples:\n  mcp-hot-reload watch context.yaml\n  mcp-hot-reload watch . --follow-imports\n  mcp-hot-reload watch context.yaml --strategy polling --poll-interval-ms 500"
    )]
    Watch {
        /// Main configuration file, or a directory containing context.yaml
        #[arg(value_name = "CONFIG")]
        path: PathBuf,

        /// Additional files to watch
        #[arg(long = "import", value_name = "PATH")]
        imports: Vec<PathBuf>,

        /// Change detection strategy (auto, native, polling)
        #[arg(long)]
        strategy: Option<StrategyKind>,

        /// Polling interval in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Quiet period before a reload, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Also watch files listed in the `import` section
        #[arg(long)]
        follow_imports: bool,

        /// Replace whole sections instead of applying item diffs
        #[arg(long)]
        full_reload: bool,
    },

    /// Show the differences between two configuration files
    #[command(about = "Diff two configuration files section by section")]
    Diff {
        /// Previous configuration
        old: PathBuf,

        /// New configuration
        new: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch() {
        let cli = Cli::try_parse_from([
            "mcp-hot-reload",
            "watch",
            "context.yaml",
            "--import",
            "a.yaml",
            "--import",
            "b.yaml",
            "--strategy",
            "inotify",
            "--debounce-ms",
            "200",
            "--follow-imports",
        ])
        .unwrap();

        match cli.command {
            Commands::Watch {
                path,
                imports,
                strategy,
                debounce_ms,
                follow_imports,
                full_reload,
                ..
            } => {
                assert_eq!(path, PathBuf::from("context.yaml"));
                assert_eq!(imports.len(), 2);
                assert_eq!(strategy, Some(StrategyKind::Native));
                assert_eq!(debounce_ms, Some(200));
                assert!(follow_imports);
                assert!(!full_reload);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_diff_with_global_config() {
        let cli = Cli::try_parse_from(["mcp-hot-reload", "diff", "old.yaml", "new.yaml", "-c", "custom.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Diff { json: false, .. }));
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        assert!(Cli::try_parse_from(["mcp-hot-reload", "watch", "c.yaml", "--strategy", "fsevents"]).is_err());
    }
}
