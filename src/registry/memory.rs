use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{ItemRegistry, RegistryItem};

/// Thread-safe registry keeping items in insertion order.
pub struct InMemoryRegistry<T> {
    items: RwLock<IndexMap<String, Arc<T>>>,
}

impl<T> InMemoryRegistry<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(IndexMap::new()),
        }
    }

    /// Snapshot of all items in insertion order.
    pub fn all(&self) -> Vec<Arc<T>> {
        self.items.read().values().cloned().collect()
    }
}

impl<T> Default for InMemoryRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for InMemoryRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("ids", &self.items.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: RegistryItem> ItemRegistry<T> for InMemoryRegistry<T> {
    fn register(&self, item: T) {
        let id = item.id().to_string();
        // Replacing keeps the original position
        self.items.write().insert(id, Arc::new(item));
    }

    fn remove(&self, id: &str) -> bool {
        self.items.write().shift_remove(id).is_some()
    }

    fn has(&self, id: &str) -> bool {
        self.items.read().contains_key(id)
    }

    fn get(&self, id: &str) -> Option<Arc<T>> {
        self.items.read().get(id).cloned()
    }

    fn clear(&self) {
        self.items.write().clear();
    }

    fn len(&self) -> usize {
        self.items.read().len()
    }

    fn ids(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }
}
