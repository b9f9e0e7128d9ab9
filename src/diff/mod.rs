//! Item-level reconciliation of configuration sections.
//!
//! Items are matched across snapshots by an identity key (`id` for tools and
//! prompts, `description` for documents). Items without one are identified
//! by a hash of their canonical content, so they are always addressable but
//! never merged with a different item.

mod calculator;
mod config_diff;
pub mod identity;

pub use calculator::{DiffCalculator, SectionSpec};
pub use config_diff::{ConfigDiff, DiffSummary};
