//! Task lifecycle (C5): creation and atomic priority/FIFO claiming.

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::eventbus::{Event, EventBus, TaskEvent};
use crate::model::{Priority, Task, TaskStatus};
use crate::store::Store;
use skreaver_core::AgentId;
use std::sync::Arc;
use uuid::Uuid;

pub enum ClaimOutcome {
    Claimed(Task),
    NoTask,
}

pub enum CompleteOutcome {
    Completed(Task),
    NotFound,
    AlreadyTerminal(Task),
}

pub struct TaskCoordinator {
    store: Arc<Store>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
}

impl TaskCoordinator {
    pub fn new(store: Arc<Store>, bus: Arc<EventBus>, clock: Arc<dyn Clock>) -> Self {
        Self { store, bus, clock }
    }

    pub async fn create_task(
        &self,
        agent_id: Option<AgentId>,
        persona_text: String,
        description: String,
        priority: Priority,
        persona_id: Option<String>,
    ) -> CoreResult<String> {
        let mut scope = self.store.begin_write().await;

        if let Some(ref aid) = agent_id {
            match scope.get_agent(aid.as_str()) {
                None => {
                    return Err(CoreError::NotFound(format!("Agent not found: {aid}")));
                }
                Some(agent) if !agent.status.is_operational() => {
                    return Err(CoreError::InvalidState(format!(
                        "agent {aid} is {:?}",
                        agent.status
                    )));
                }
                Some(_) => {}
            }
        }

        let id = Uuid::new_v4().to_string();
        let now = self.clock.now();
        let task = Task {
            id: id.clone(),
            assigned_agent_id: agent_id.clone(),
            persona_id: persona_id.clone(),
            persona_text,
            description,
            priority,
            status: TaskStatus::Pending,
            created_at: now,
            started_at: None,
            completed_at: None,
            result: None,
        };
        scope.put_task(task);
        scope.queue_event(Event::Task(TaskEvent::Created {
            task_id: id.clone(),
            agent_id,
            persona_id,
            priority,
        }));
        scope.commit(&self.bus).await;
        Ok(id)
    }

    /// Atomic fetch-next-and-claim. The candidate set is restricted to the
    /// union of "assigned to me" and "unassigned, persona-eligible"
    /// Pending tasks; assigned-to-me always wins when non-empty, otherwise
    /// the best unassigned candidate wins. Within either set, highest
    /// priority wins, ties broken by earliest `createdAt`.
    pub async fn claim_next(&self, agent_id: &AgentId) -> CoreResult<ClaimOutcome> {
        let mut scope = self.store.begin_write().await;
        let Some(agent) = scope.get_agent(agent_id.as_str()) else {
            return Err(CoreError::NotFound(format!("Agent not found: {agent_id}")));
        };

        let candidates = scope.pending_tasks();
        let winner = select_claim_candidate(&candidates, agent_id, &agent.persona_id);

        let Some(mut task) = winner else {
            return Ok(ClaimOutcome::NoTask);
        };

        let now = self.clock.now();
        task.assigned_agent_id = Some(agent_id.clone());
        task.status = TaskStatus::InProgress;
        task.started_at = Some(now);
        scope.put_task(task.clone());
        scope.queue_event(Event::Task(TaskEvent::Claimed {
            task_id: task.id.clone(),
            agent_id: agent_id.clone(),
        }));
        scope.commit(&self.bus).await;
        Ok(ClaimOutcome::Claimed(task))
    }

    pub async fn complete(&self, task_id: &str, result_text: String) -> CoreResult<CompleteOutcome> {
        let mut scope = self.store.begin_write().await;
        let Some(mut task) = scope.get_task(task_id) else {
            return Ok(CompleteOutcome::NotFound);
        };
        if matches!(task.status, TaskStatus::Completed | TaskStatus::Failed) {
            return Ok(CompleteOutcome::AlreadyTerminal(task));
        }

        task.status = TaskStatus::Completed;
        task.completed_at = Some(self.clock.now());
        task.result = Some(result_text);
        scope.put_task(task.clone());
        scope.queue_event(Event::Task(TaskEvent::Completed {
            task_id: task.id.clone(),
            agent_id: task.assigned_agent_id.clone(),
        }));
        scope.commit(&self.bus).await;
        Ok(CompleteOutcome::Completed(task))
    }

    pub fn status(&self, task_id: &str) -> Option<Task> {
        self.store.get_task(task_id)
    }

    pub fn by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.store.tasks_by_status(status)
    }

    pub fn by_agent(&self, agent_id: &str) -> Vec<Task> {
        self.store.tasks_by_agent(agent_id)
    }
}

/// Implements the event filter used by the Wait Service for long-poll
/// claim: relevant iff the created task is already assigned to `agent_id`,
/// or unassigned with a persona that is absent or matches `agent_persona`.
pub(crate) fn claim_event_is_relevant(
    event: &Event,
    agent_id: &AgentId,
    agent_persona: &str,
) -> bool {
    match event {
        Event::Task(TaskEvent::Created {
            agent_id: assigned,
            persona_id,
            ..
        }) => match assigned {
            Some(a) => a == agent_id,
            None => persona_id.as_deref().map_or(true, |p| p == agent_persona),
        },
        _ => false,
    }
}

fn select_claim_candidate(candidates: &[Task], agent_id: &AgentId, agent_persona: &str) -> Option<Task> {
    let assigned_to_me: Vec<&Task> = candidates
        .iter()
        .filter(|t| {
            t.status == TaskStatus::Pending
                && t.assigned_agent_id
                    .as_ref()
                    .is_some_and(|a| a == agent_id)
        })
        .collect();
    if let Some(best) = pick_best(&assigned_to_me) {
        return Some(best.clone());
    }

    let unassigned_eligible: Vec<&Task> = candidates
        .iter()
        .filter(|t| {
            t.status == TaskStatus::Pending
                && t.assigned_agent_id.is_none()
                && t.persona_id.as_deref().map_or(true, |p| p == agent_persona)
        })
        .collect();
    pick_best(&unassigned_eligible).cloned()
}

/// Highest priority first; ties broken by earliest `created_at`.
fn pick_best<'a>(tasks: &[&'a Task]) -> Option<&'a Task> {
    tasks
        .iter()
        .copied()
        .max_by(|a, b| a.priority.cmp(&b.priority).then_with(|| b.created_at.cmp(&a.created_at)))
}
