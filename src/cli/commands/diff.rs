//! Diff command - compare two configuration files.

use std::path::PathBuf;

use anyhow::Context;

use crate::diff::DiffCalculator;
use crate::loader::{ConfigLoader, FileConfigLoader};

/// Arguments for the diff command.
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    pub json: bool,
}

/// Run the diff command.
pub fn run(args: DiffArgs) -> anyhow::Result<()> {
    let loader = FileConfigLoader::new();
    let old = loader
        .load_raw_config(&args.old)
        .with_context(|| format!("failed to load {}", args.old.display()))?;
    let new = loader
        .load_raw_config(&args.new)
        .with_context(|| format!("failed to load {}", args.new.display()))?;

    let diffs = DiffCalculator::default().calculate_all(&old, &new);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&diffs)?);
        return Ok(());
    }

    if diffs.is_empty() {
        println!("No changes");
        return Ok(());
    }

    for (section, diff) in &diffs {
        println!("{section}: {}", diff.summary());
        for id in diff.removed().keys() {
            println!("  - {id}");
        }
        for id in diff.added().keys() {
            println!("  + {id}");
        }
        for id in diff.modified().keys() {
            println!("  ~ {id}");
        }
    }

    Ok(())
}
