use clap::Parser;

use mcp_hot_reload::Settings;
use mcp_hot_reload::cli::commands::{diff, watch};
use mcp_hot_reload::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match cli.config.as_deref() {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    mcp_hot_reload::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Watch {
            path,
            imports,
            strategy,
            poll_interval_ms,
            debounce_ms,
            follow_imports,
            full_reload,
        } => {
            watch::run(
                watch::WatchArgs {
                    path,
                    imports,
                    strategy,
                    poll_interval_ms,
                    debounce_ms,
                    follow_imports,
                    full_reload,
                },
                settings,
            )
            .await
        }
        Commands::Diff { old, new, json } => diff::run(diff::DiffArgs { old, new, json }),
    }
}
