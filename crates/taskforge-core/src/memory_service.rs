//! Namespaced key/value memory (C7): create/update/read with
//! read-your-writes consistency.

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::eventbus::{Event, EventBus, MemoryEvent};
use crate::model::MemoryEntry;
use crate::store::Store;
use std::sync::Arc;

pub struct MemoryService {
    store: Arc<Store>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
}

impl MemoryService {
    pub fn new(store: Arc<Store>, bus: Arc<EventBus>, clock: Arc<dyn Clock>) -> Self {
        Self { store, bus, clock }
    }

    pub async fn save(
        &self,
        namespace: &str,
        key: &str,
        value: String,
        entry_type: Option<String>,
        metadata: Option<String>,
    ) -> CoreResult<()> {
        if key.is_empty() {
            return Err(CoreError::Validation("key must not be empty".into()));
        }
        if value.is_empty() {
            return Err(CoreError::Validation("value must not be empty".into()));
        }

        let mut scope = self.store.begin_write().await;
        let now = self.clock.now();
        let existing = scope.get_memory(namespace, key);
        let is_update = existing.is_some();
        let created_at = existing.as_ref().map_or(now, |e| e.created_at);
        let accessed_at = existing.as_ref().and_then(|e| e.accessed_at);
        let access_count = existing.as_ref().map_or(0, |e| e.access_count);

        let entry = MemoryEntry {
            namespace: namespace.to_string(),
            key: key.to_string(),
            size: value.len(),
            value,
            entry_type: entry_type.unwrap_or_else(|| "json".to_string()),
            metadata,
            is_compressed: false,
            created_at,
            last_updated_at: now,
            accessed_at,
            access_count,
        };
        scope.put_memory(entry);

        let event = if is_update {
            MemoryEvent::Updated {
                namespace: namespace.to_string(),
                key: key.to_string(),
            }
        } else {
            MemoryEvent::Saved {
                namespace: namespace.to_string(),
                key: key.to_string(),
            }
        };
        scope.queue_event(Event::Memory(event));
        scope.commit(&self.bus).await;
        Ok(())
    }

    /// Read-only snapshot; does not mutate access statistics.
    pub fn read(&self, namespace: &str, key: &str) -> Option<MemoryEntry> {
        self.store.get_memory(namespace, key)
    }

    pub async fn touch_access(&self, namespace: &str, key: &str) -> bool {
        let mut scope = self.store.begin_write().await;
        let Some(mut entry) = scope.get_memory(namespace, key) else {
            return false;
        };
        entry.access_count += 1;
        entry.accessed_at = Some(self.clock.now());
        scope.put_memory(entry);
        scope.commit(&self.bus).await;
        true
    }

    pub fn list(&self, namespace: &str) -> Vec<MemoryEntry> {
        self.store.list_memory(namespace)
    }
}
