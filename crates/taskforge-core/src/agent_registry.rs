//! Agent lifecycle state machine (C4): registration, heartbeat,
//! activation, kill, and the kill→task-failure cascade.

use crate::clock::Clock;
use crate::collaborators::ProcessTerminator;
use crate::eventbus::{AgentEvent, Event, EventBus, TaskEvent};
use crate::model::{Agent, AgentStatus, TaskStatus};
use crate::store::Store;
use skreaver_core::AgentId;
use std::sync::Arc;

pub struct AgentRegistry {
    store: Arc<Store>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    terminator: Arc<dyn ProcessTerminator>,
}

impl AgentRegistry {
    pub fn new(
        store: Arc<Store>,
        bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        terminator: Arc<dyn ProcessTerminator>,
    ) -> Self {
        Self {
            store,
            bus,
            clock,
            terminator,
        }
    }

    pub async fn register(
        &self,
        persona_id: String,
        working_directory: String,
        model: Option<String>,
        worktree_name: Option<String>,
    ) -> AgentId {
        let id = AgentId::generate();
        let now = self.clock.now();
        let agent = Agent {
            id: id.clone(),
            persona_id: persona_id.clone(),
            working_directory,
            process_id: None,
            model,
            worktree_name,
            status: AgentStatus::Starting,
            registered_at: now,
            started_at: None,
            last_heartbeat: now,
            stopped_at: None,
        };

        let mut scope = self.store.begin_write().await;
        scope.put_agent(agent);
        scope.queue_event(Event::Agent(AgentEvent::Registered {
            agent_id: id.clone(),
            persona_id,
        }));
        scope.commit(&self.bus).await;
        id
    }

    /// Records a process id against an already-registered agent (used by
    /// the RPC launch flow once the child process has actually started).
    pub async fn record_process_id(&self, agent_id: &AgentId, process_id: String) -> bool {
        let mut scope = self.store.begin_write().await;
        let Some(mut agent) = scope.get_agent(agent_id.as_str()) else {
            return false;
        };
        agent.process_id = Some(process_id);
        scope.put_agent(agent);
        scope.commit(&self.bus).await;
        true
    }

    /// Records the working directory the launcher actually used (e.g.
    /// once a worktree has been created), since that is only known after
    /// the agent row already exists.
    pub async fn record_working_directory(&self, agent_id: &AgentId, working_directory: String) -> bool {
        let mut scope = self.store.begin_write().await;
        let Some(mut agent) = scope.get_agent(agent_id.as_str()) else {
            return false;
        };
        agent.working_directory = working_directory;
        scope.put_agent(agent);
        scope.commit(&self.bus).await;
        true
    }

    /// Refreshes `lastHeartbeat`; on the first heartbeat after
    /// registration also activates Starting→Running. Returns `false` if
    /// the agent does not exist.
    pub async fn heartbeat(&self, agent_id: &AgentId) -> bool {
        let mut scope = self.store.begin_write().await;
        let Some(mut agent) = scope.get_agent(agent_id.as_str()) else {
            return false;
        };

        agent.last_heartbeat = self.clock.now();

        let activated = agent.status == AgentStatus::Starting;
        if activated {
            agent.status = AgentStatus::Running;
            agent.started_at = Some(self.clock.now());
        }

        scope.put_agent(agent);
        if activated {
            scope.queue_event(Event::Agent(AgentEvent::StatusChanged {
                agent_id: agent_id.clone(),
                from: AgentStatus::Starting,
                to: AgentStatus::Running,
            }));
        }
        scope.commit(&self.bus).await;
        true
    }

    /// Kills the agent and cascades failure onto its InProgress tasks
    /// only. Returns `false` if the agent does not exist or is already
    /// terminal.
    pub async fn kill(&self, agent_id: &AgentId) -> bool {
        let mut scope = self.store.begin_write().await;
        let Some(mut agent) = scope.get_agent(agent_id.as_str()) else {
            return false;
        };
        if !agent.status.is_operational() {
            return false;
        }
        let prev_status = agent.status;

        if let Some(pid) = agent.process_id.clone() {
            if let Err(err) = self.terminator.terminate(&pid) {
                tracing::warn!(agent_id = %agent_id, error = %err, "process termination failed");
            }
        }

        let now = self.clock.now();
        agent.status = AgentStatus::Killed;
        agent.stopped_at = Some(now);
        scope.put_agent(agent);

        let mut failed_task_ids = Vec::new();
        for mut task in scope.tasks_assigned_to(agent_id.as_str()) {
            if task.status == TaskStatus::InProgress {
                task.status = TaskStatus::Failed;
                task.result = Some("Agent terminated".to_string());
                task.completed_at = Some(now);
                failed_task_ids.push(task.id.clone());
                scope.put_task(task);
            }
        }

        scope.queue_event(Event::Agent(AgentEvent::Killed {
            agent_id: agent_id.clone(),
            reason: "Agent terminated".to_string(),
        }));
        scope.queue_event(Event::Agent(AgentEvent::StatusChanged {
            agent_id: agent_id.clone(),
            from: prev_status,
            to: AgentStatus::Killed,
        }));
        for task_id in failed_task_ids {
            scope.queue_event(Event::Task(TaskEvent::Failed {
                task_id,
                agent_id: Some(agent_id.clone()),
                result: "Agent terminated".to_string(),
            }));
        }

        scope.commit(&self.bus).await;
        true
    }

    pub fn get(&self, agent_id: &str) -> Option<Agent> {
        self.store.get_agent(agent_id)
    }

    pub fn list(&self, persona_filter: Option<&str>) -> Vec<Agent> {
        let agents = self.store.list_agents();
        match persona_filter {
            Some(p) => agents.into_iter().filter(|a| a.persona_id == p).collect(),
            None => agents,
        }
    }
}
