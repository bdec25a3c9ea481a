//! Transactional persistence for agents, work items, memory entries, and
//! the event log.
//!
//! The three entity tables live behind one [`std::sync::RwLock`] so a
//! commit that touches more than one of them is atomic from a reader's
//! point of view: a concurrent `get_agent`/`get_task`/`get_memory` either
//! sees every mutation a [`WriteScope::commit`] applied, or none of them,
//! never a partial write. Writes go through a [`WriteScope`], which
//! buffers mutations in an override map and applies them to the tables
//! only on `commit`; dropping a scope without committing discards its
//! mutations, satisfying "a write scope that is not explicitly committed
//! before disposal MUST be discarded" without any extra code.

use crate::eventbus::{Event, EventBus};
use crate::model::{Agent, EventLogEntry, MemoryEntry, Task, TaskStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
struct Tables {
    agents: HashMap<String, Agent>,
    tasks: HashMap<String, Task>,
    memory: HashMap<(String, String), MemoryEntry>,
}

pub struct Store {
    tables: RwLock<Tables>,
    event_log: Mutex<Vec<EventLogEntry>>,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tables: RwLock::new(Tables::default()),
            event_log: Mutex::new(Vec::new()),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn tables(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().expect("store lock poisoned")
    }

    // ---- read scope ----

    pub fn get_agent(&self, id: &str) -> Option<Agent> {
        self.tables().agents.get(id).cloned()
    }

    pub fn get_task(&self, id: &str) -> Option<Task> {
        self.tables().tasks.get(id).cloned()
    }

    pub fn get_memory(&self, namespace: &str, key: &str) -> Option<MemoryEntry> {
        self.tables()
            .memory
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }

    pub fn list_memory(&self, namespace: &str) -> Vec<MemoryEntry> {
        self.tables()
            .memory
            .values()
            .filter(|e| e.namespace == namespace)
            .cloned()
            .collect()
    }

    pub fn tasks_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.tables()
            .tasks
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    pub fn tasks_by_agent(&self, agent_id: &str) -> Vec<Task> {
        self.tables()
            .tasks
            .values()
            .filter(|t| {
                t.assigned_agent_id
                    .as_ref()
                    .is_some_and(|a| a.as_str() == agent_id)
            })
            .cloned()
            .collect()
    }

    pub fn list_agents(&self) -> Vec<Agent> {
        self.tables().agents.values().cloned().collect()
    }

    pub async fn event_log_snapshot(&self) -> Vec<EventLogEntry> {
        self.event_log.lock().await.clone()
    }

    /// Append-only; the Event Logger is the sole writer of this table.
    pub async fn append_event_log(&self, entry: EventLogEntry) {
        self.event_log.lock().await.push(entry);
    }

    // ---- write scope ----

    pub async fn begin_write(&self) -> WriteScope<'_> {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        WriteScope {
            store: self,
            _guard: guard,
            agent_overrides: HashMap::new(),
            task_overrides: HashMap::new(),
            memory_overrides: HashMap::new(),
            pending_events: Vec::new(),
        }
    }
}

pub struct WriteScope<'s> {
    store: &'s Store,
    _guard: OwnedMutexGuard<()>,
    agent_overrides: HashMap<String, Agent>,
    task_overrides: HashMap<String, Task>,
    memory_overrides: HashMap<(String, String), MemoryEntry>,
    pending_events: Vec<Event>,
}

impl<'s> WriteScope<'s> {
    pub fn get_agent(&self, id: &str) -> Option<Agent> {
        self.agent_overrides
            .get(id)
            .cloned()
            .or_else(|| self.store.get_agent(id))
    }

    pub fn put_agent(&mut self, agent: Agent) {
        let id = agent.id.as_str().to_string();
        self.agent_overrides.insert(id, agent);
    }

    pub fn get_task(&self, id: &str) -> Option<Task> {
        self.task_overrides
            .get(id)
            .cloned()
            .or_else(|| self.store.get_task(id))
    }

    pub fn put_task(&mut self, task: Task) {
        self.task_overrides.insert(task.id.clone(), task);
    }

    pub fn get_memory(&self, namespace: &str, key: &str) -> Option<MemoryEntry> {
        self.memory_overrides
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
            .or_else(|| self.store.get_memory(namespace, key))
    }

    pub fn put_memory(&mut self, entry: MemoryEntry) {
        self.memory_overrides
            .insert((entry.namespace.clone(), entry.key.clone()), entry);
    }

    fn merged_tasks(&self) -> Vec<Task> {
        let mut out: HashMap<String, Task> = self.store.tables().tasks.clone();
        for (id, task) in &self.task_overrides {
            out.insert(id.clone(), task.clone());
        }
        out.into_values().collect()
    }

    pub fn pending_tasks(&self) -> Vec<Task> {
        self.merged_tasks()
            .into_iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .collect()
    }

    pub fn tasks_assigned_to(&self, agent_id: &str) -> Vec<Task> {
        self.merged_tasks()
            .into_iter()
            .filter(|t| {
                t.assigned_agent_id
                    .as_ref()
                    .is_some_and(|a| a.as_str() == agent_id)
            })
            .collect()
    }

    pub fn queue_event(&mut self, event: Event) {
        self.pending_events.push(event);
    }

    /// Apply every buffered mutation to all three tables under one write
    /// guard, so a concurrent reader never observes a commit half-applied,
    /// then release the write lock and publish queued events. Publication
    /// happens after the mutations are visible to readers, matching
    /// "publications are fired after the corresponding write scope
    /// commits".
    pub async fn commit(mut self, bus: &EventBus) {
        {
            let mut tables = self.store.tables.write().expect("store lock poisoned");
            for (id, agent) in self.agent_overrides.drain() {
                tables.agents.insert(id, agent);
            }
            for (id, task) in self.task_overrides.drain() {
                tables.tasks.insert(id, task);
            }
            for (key, entry) in self.memory_overrides.drain() {
                tables.memory.insert(key, entry);
            }
        }
        let events = std::mem::take(&mut self.pending_events);
        drop(self); // releases the write lock before publishing
        for event in events {
            bus.publish(event).await;
        }
    }

    /// Explicit discard. Equivalent to simply dropping the scope; kept for
    /// call sites where "I am intentionally throwing this away" reads
    /// better than an implicit drop.
    pub fn discard(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Agent, AgentStatus, Priority, Task, TaskStatus};
    use chrono::Utc;
    use skreaver_core::AgentId;

    fn sample_agent() -> Agent {
        let now = Utc::now();
        Agent {
            id: AgentId::generate(),
            persona_id: "reviewer".into(),
            working_directory: "/tmp/ws".into(),
            process_id: None,
            model: None,
            worktree_name: None,
            status: AgentStatus::Starting,
            registered_at: now,
            started_at: None,
            last_heartbeat: now,
            stopped_at: None,
        }
    }

    fn sample_task(id: &str, status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            assigned_agent_id: None,
            persona_id: None,
            persona_text: "do work".into(),
            description: "desc".into(),
            priority: Priority::Normal,
            status,
            created_at: now,
            started_at: None,
            completed_at: None,
            result: None,
        }
    }

    #[tokio::test]
    async fn dropped_write_scope_discards_mutations() {
        let store = Store::new();
        let agent = sample_agent();
        let id = agent.id.as_str().to_string();
        {
            let mut scope = store.begin_write().await;
            scope.put_agent(agent);
            // scope dropped here without commit
        }
        assert!(store.get_agent(&id).is_none());
    }

    #[tokio::test]
    async fn committed_write_scope_is_visible_to_reads() {
        let store = Store::new();
        let bus = EventBus::new(8);
        let agent = sample_agent();
        let id = agent.id.as_str().to_string();
        let mut scope = store.begin_write().await;
        scope.put_agent(agent);
        scope.commit(&bus).await;
        assert!(store.get_agent(&id).is_some());
    }

    #[tokio::test]
    async fn pending_tasks_reflects_overrides_within_scope() {
        let store = Store::new();
        let task = sample_task("t1", TaskStatus::Pending);
        let scope = store.begin_write().await;
        // task not yet in store, but we can still see it if we put it first
        drop(scope);
        let mut scope = store.begin_write().await;
        scope.put_task(task);
        assert_eq!(scope.pending_tasks().len(), 1);
    }
}
