//! Section handler trait and the registry routing diffs to handlers.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::WatchError;
use super::handlers::{DocumentsChangeHandler, PromptsChangeHandler, ToolsChangeHandler};
use crate::diff::ConfigDiff;
use crate::notifications::NotificationBroadcaster;
use crate::registry::{DocumentDefinition, ItemRegistry, PromptDefinition, ToolDefinition};

/// Applies configuration changes of one section to its live registry.
///
/// Failures should be returned as [`WatchError::HandlerFailed`]. A panic
/// inside `apply` or `reload` is caught by the watcher and reported the
/// same way, but leaves the registry in whatever state the handler reached.
pub trait ChangeHandler: Send + Sync {
    /// Configuration section this handler owns.
    fn section(&self) -> &str;

    /// Apply an incremental diff: removals, then additions, then
    /// modifications. Returns whether the registry changed.
    fn apply(&self, diff: &ConfigDiff) -> Result<bool, WatchError>;

    /// Replace the registry contents with `items`. Returns whether the
    /// registry changed.
    fn reload(&self, items: &[Value]) -> Result<bool, WatchError>;
}

/// Section handlers keyed by section name.
#[derive(Default, Clone)]
pub struct ChangeHandlerRegistry {
    handlers: IndexMap<String, Arc<dyn ChangeHandler>>,
}

impl ChangeHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers for `tools`, `prompts` and `documents` over the given
    /// registries, notifying through `broadcaster`.
    pub fn with_defaults(
        tools: Arc<dyn ItemRegistry<ToolDefinition>>,
        prompts: Arc<dyn ItemRegistry<PromptDefinition>>,
        documents: Arc<dyn ItemRegistry<DocumentDefinition>>,
        broadcaster: NotificationBroadcaster,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(ToolsChangeHandler::new(tools).with_broadcaster(broadcaster.clone()));
        registry.register(PromptsChangeHandler::new(prompts).with_broadcaster(broadcaster.clone()));
        registry.register(DocumentsChangeHandler::new(documents).with_broadcaster(broadcaster));
        registry
    }

    /// Register a handler, replacing any handler of the same section.
    pub fn register(&mut self, handler: impl ChangeHandler + 'static) -> Option<Arc<dyn ChangeHandler>> {
        self.register_arc(Arc::new(handler))
    }

    pub fn register_arc(&mut self, handler: Arc<dyn ChangeHandler>) -> Option<Arc<dyn ChangeHandler>> {
        let section = handler.section().to_string();
        crate::debug_event!("handlers", "registered", "{section}");
        self.handlers.insert(section, handler)
    }

    pub fn get(&self, section: &str) -> Option<Arc<dyn ChangeHandler>> {
        self.handlers.get(section).cloned()
    }

    pub fn has(&self, section: &str) -> bool {
        self.handlers.contains_key(section)
    }

    pub fn supported_sections(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ChangeHandler>)> {
        self.handlers.iter().map(|(section, handler)| (section.as_str(), handler))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ChangeHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeHandlerRegistry")
            .field("sections", &self.supported_sections())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;

    struct NamedHandler(&'static str);

    impl ChangeHandler for NamedHandler {
        fn section(&self) -> &str {
            self.0
        }

        fn apply(&self, _diff: &ConfigDiff) -> Result<bool, WatchError> {
            Ok(false)
        }

        fn reload(&self, _items: &[Value]) -> Result<bool, WatchError> {
            Ok(false)
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ChangeHandlerRegistry::new();
        assert!(registry.register(NamedHandler("servers")).is_none());
        assert!(registry.register(NamedHandler("servers")).is_some());

        assert!(registry.has("servers"));
        assert!(!registry.has("tools"));
        assert_eq!(registry.get("servers").unwrap().section(), "servers");
        assert!(registry.get("tools").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_with_defaults() {
        let registry = ChangeHandlerRegistry::with_defaults(
            Arc::new(InMemoryRegistry::<ToolDefinition>::new()),
            Arc::new(InMemoryRegistry::<PromptDefinition>::new()),
            Arc::new(InMemoryRegistry::<DocumentDefinition>::new()),
            NotificationBroadcaster::default(),
        );
        assert_eq!(registry.supported_sections(), vec!["tools", "prompts", "documents"]);
    }
}
