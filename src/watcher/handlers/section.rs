//! Handler keeping one typed live registry in step with its section.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::diff::ConfigDiff;
use crate::notifications::{ChangeEvent, NotificationBroadcaster};
use crate::registry::{DocumentDefinition, ItemRegistry, PromptDefinition, RegistryItem, ToolDefinition};
use crate::watcher::{ChangeHandler, WatchError};

/// Applies section diffs to an [`ItemRegistry`] of `T`.
///
/// Every registry mutation is a single-item step, so concurrent readers see
/// each item either before or after the change. A document that fails to
/// parse is logged and skipped without affecting the other items.
pub struct SectionChangeHandler<T: RegistryItem> {
    registry: Arc<dyn ItemRegistry<T>>,
    broadcaster: Option<NotificationBroadcaster>,
    _item: PhantomData<fn() -> T>,
}

pub type ToolsChangeHandler = SectionChangeHandler<ToolDefinition>;
pub type PromptsChangeHandler = SectionChangeHandler<PromptDefinition>;
pub type DocumentsChangeHandler = SectionChangeHandler<DocumentDefinition>;

impl<T: RegistryItem> SectionChangeHandler<T> {
    pub fn new(registry: Arc<dyn ItemRegistry<T>>) -> Self {
        Self {
            registry,
            broadcaster: None,
            _item: PhantomData,
        }
    }

    /// Publish list-changed events through `broadcaster`.
    pub fn with_broadcaster(mut self, broadcaster: NotificationBroadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Parse and register one document. Returns whether it was registered.
    fn register_document(&self, key: &str, document: &Value) -> bool {
        match T::from_config(document) {
            Ok(item) => {
                crate::debug_event!(T::SECTION, "registered", "{}", item.id());
                self.registry.register(item);
                true
            }
            Err(e) => {
                tracing::warn!("[{}] skipped {} '{key}': {e}", T::SECTION, T::KIND);
                false
            }
        }
    }

    fn remove_item(&self, key: &str) -> bool {
        let removed = self.registry.remove(key);
        if removed {
            crate::debug_event!(T::SECTION, "removed", "{key}");
        } else {
            crate::debug_event!(T::SECTION, "not registered", "{key}");
        }
        removed
    }

    fn notify(&self) {
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.send(ChangeEvent::ListChanged {
                section: T::SECTION.to_string(),
            });
        }
    }
}

impl<T: RegistryItem> ChangeHandler for SectionChangeHandler<T> {
    fn section(&self) -> &str {
        T::SECTION
    }

    fn apply(&self, diff: &ConfigDiff) -> Result<bool, WatchError> {
        let mut changed = false;

        for key in diff.removed().keys() {
            changed |= self.remove_item(key);
        }

        for (key, document) in diff.added() {
            changed |= self.register_document(key, document);
        }

        for (key, document) in diff.modified() {
            let removed = self.remove_item(key);
            let added = self.register_document(key, document);
            changed |= removed || added;
        }

        if changed {
            crate::log_event!(T::SECTION, "applied", "{}", diff.summary());
            self.notify();
        }

        Ok(changed)
    }

    fn reload(&self, items: &[Value]) -> Result<bool, WatchError> {
        let had_items = !self.registry.is_empty();
        self.registry.clear();

        let mut registered = 0;
        for (index, document) in items.iter().enumerate() {
            if self.register_document(&format!("#{index}"), document) {
                registered += 1;
            }
        }

        crate::log_event!(T::SECTION, "reloaded", "{registered} of {} items", items.len());
        self.notify();

        Ok(had_items || registered > 0)
    }
}
