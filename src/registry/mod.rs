//! Live registries holding the items served to clients.
//!
//! Each managed configuration section maps to one typed item and one
//! registry. Section handlers translate item documents into items and
//! keep the registry in step with the configuration file.

mod document;
mod error;
mod memory;
mod prompt;
mod tool;

use std::sync::Arc;

use serde_json::Value;

pub use document::DocumentDefinition;
pub use error::ItemError;
pub use memory::InMemoryRegistry;
pub use prompt::{
    MessageContent, PromptArgument, PromptDefinition, PromptExtension, PromptMessage, PromptType, Role,
};
pub use tool::{ToolArg, ToolCommand, ToolDefinition, ToolType};

/// An item parsed from one entry of a configuration section.
pub trait RegistryItem: Send + Sync + Sized + 'static {
    /// Configuration section the item lives in.
    const SECTION: &'static str;
    /// Human-readable item kind used in logs and errors.
    const KIND: &'static str;

    /// Parse and validate an item document.
    fn from_config(config: &Value) -> Result<Self, ItemError>;

    /// Registry key of the item.
    fn id(&self) -> &str;
}

/// Storage for live items keyed by id.
///
/// Every operation is atomic with respect to a single item.
pub trait ItemRegistry<T>: Send + Sync {
    /// Insert or replace an item.
    fn register(&self, item: T);

    /// Remove an item. Returns `false` if the id was unknown.
    fn remove(&self, id: &str) -> bool;

    fn has(&self, id: &str) -> bool;

    fn get(&self, id: &str) -> Option<Arc<T>>;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered ids in insertion order.
    fn ids(&self) -> Vec<String>;
}

pub type ToolRegistry = InMemoryRegistry<ToolDefinition>;
pub type PromptRegistry = InMemoryRegistry<PromptDefinition>;
pub type DocumentRegistry = InMemoryRegistry<DocumentDefinition>;
