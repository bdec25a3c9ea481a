//! Background audit subscriber (C8): mirrors task and agent events into
//! the event log. Never propagates a persistence failure back to a
//! publisher.

use crate::clock::Clock;
use crate::eventbus::{AgentEvent, Event, EventBus, TaskEvent};
use crate::model::{EntityType, EventLogEntry, Severity};
use crate::store::Store;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub struct EventLogger {
    store: Arc<Store>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    handles: Mutex<Option<(JoinHandle<()>, JoinHandle<()>)>>,
}

impl EventLogger {
    pub fn new(store: Arc<Store>, bus: Arc<EventBus>, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            store,
            bus,
            clock,
            handles: Mutex::new(None),
        })
    }

    /// Subscribes to all task and agent events, then spawns the two
    /// drain loops. By the time this returns, no event published
    /// afterward can be missed.
    pub async fn start(self: &Arc<Self>) {
        let task_sub = self
            .bus
            .subscribe(|event| matches!(event, Event::Task(_)))
            .await;
        let agent_sub = self
            .bus
            .subscribe(|event| matches!(event, Event::Agent(_)))
            .await;

        let this_tasks = Arc::clone(self);
        let this_agents = Arc::clone(self);
        let task_handle = tokio::spawn(async move { this_tasks.drain(task_sub).await });
        let agent_handle = tokio::spawn(async move { this_agents.drain(agent_sub).await });

        *self.handles.lock().await = Some((task_handle, agent_handle));
    }

    pub async fn stop(&self) {
        if let Some((task_handle, agent_handle)) = self.handles.lock().await.take() {
            task_handle.abort();
            agent_handle.abort();
        }
    }

    async fn drain(&self, mut sub: crate::eventbus::Subscription) {
        use tokio_stream::StreamExt;
        while let Some(event) = StreamExt::next(&mut sub).await {
            self.record(&event).await;
        }
    }

    async fn record(&self, event: &Event) {
        let entry = build_log_entry(event, self.clock.now());
        self.store.append_event_log(entry).await;
        // In-memory append cannot fail today; if a future on-disk backend
        // makes this fallible, the error belongs here, logged at `warn`,
        // never propagated to the publisher.
    }
}

fn build_log_entry(event: &Event, timestamp: chrono::DateTime<chrono::Utc>) -> EventLogEntry {
    let id = Uuid::new_v4().to_string();
    match event {
        Event::Task(task_event) => {
            let (variant, entity_id, actor, severity, tags) = match task_event {
                TaskEvent::Created {
                    task_id,
                    agent_id,
                    persona_id,
                    ..
                } => {
                    let mut tags = vec!["event:Created".to_string()];
                    if let Some(p) = persona_id {
                        tags.push(format!("persona:{p}"));
                    }
                    (
                        "Created",
                        task_id.clone(),
                        agent_id.as_ref().map(|a| a.to_string()),
                        Severity::Information,
                        tags,
                    )
                }
                TaskEvent::Claimed { task_id, agent_id } => (
                    "Claimed",
                    task_id.clone(),
                    Some(agent_id.to_string()),
                    Severity::Information,
                    vec!["event:Claimed".to_string()],
                ),
                TaskEvent::Completed { task_id, agent_id } => (
                    "Completed",
                    task_id.clone(),
                    agent_id.as_ref().map(|a| a.to_string()),
                    Severity::Information,
                    vec!["event:Completed".to_string()],
                ),
                TaskEvent::Failed { task_id, agent_id, .. } => (
                    "Failed",
                    task_id.clone(),
                    agent_id.as_ref().map(|a| a.to_string()),
                    Severity::Warning,
                    vec!["event:Failed".to_string()],
                ),
            };
            EventLogEntry {
                id,
                event_type: format!("Task{variant}"),
                timestamp,
                actor,
                entity_id: Some(entity_id),
                entity_type: EntityType::Task,
                severity,
                tags,
                payload: serde_json::to_string(task_event).unwrap_or_default(),
            }
        }
        Event::Agent(agent_event) => {
            let (variant, entity_id, actor, severity) = match agent_event {
                AgentEvent::Registered { agent_id, .. } => (
                    "Registered",
                    agent_id.to_string(),
                    Some(agent_id.to_string()),
                    Severity::Information,
                ),
                AgentEvent::StatusChanged { agent_id, .. } => (
                    "StatusChanged",
                    agent_id.to_string(),
                    Some(agent_id.to_string()),
                    Severity::Information,
                ),
                AgentEvent::Killed { agent_id, .. } => (
                    "Killed",
                    agent_id.to_string(),
                    Some(agent_id.to_string()),
                    Severity::Warning,
                ),
            };
            EventLogEntry {
                id,
                event_type: format!("Agent{variant}"),
                timestamp,
                actor,
                entity_id: Some(entity_id),
                entity_type: EntityType::Agent,
                severity,
                tags: vec![format!("event:{variant}")],
                payload: serde_json::to_string(agent_event).unwrap_or_default(),
            }
        }
        Event::Memory(memory_event) => EventLogEntry {
            id,
            event_type: "Memory".to_string(),
            timestamp,
            actor: None,
            entity_id: None,
            entity_type: EntityType::Memory,
            severity: Severity::Information,
            tags: Vec::new(),
            payload: serde_json::to_string(memory_event).unwrap_or_default(),
        },
    }
}
