//! Wire-agnostic response shapes for the §6 operation contracts. These are
//! plain serde structs; framing (HTTP, JSON-RPC, an MCP-style tool call)
//! is left to whatever layer a deployment chooses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use taskforge_core::{Agent, AgentStatus, MemoryEntry, Priority, Task, TaskStatus};

/// Prefix used on the synthetic "no task, poll again" envelope.
pub const SYNTHETIC_TASK_PREFIX: &str = "system:";
pub const NO_TASKS_MESSAGE: &str = "No tasks available, call this tool again";
pub const CALL_AGAIN_SUFFIX: &str = "call this tool again";

#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetNextTaskResponse {
    pub success: bool,
    pub task_id: String,
    pub persona_text: String,
    pub description: String,
    pub message: String,
}

impl GetNextTaskResponse {
    pub fn synthetic_no_task() -> Self {
        Self {
            success: true,
            task_id: format!("{SYNTHETIC_TASK_PREFIX}no-task"),
            persona_text: String::new(),
            description: String::new(),
            message: NO_TASKS_MESSAGE.to_string(),
        }
    }

    pub fn agent_not_found() -> Self {
        Self {
            success: false,
            task_id: String::new(),
            persona_text: String::new(),
            description: String::new(),
            message: "Agent not found".to_string(),
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            success: true,
            task_id: task.id.clone(),
            persona_text: task.persona_text.clone(),
            description: task.description.clone(),
            message: format!("Task claimed; {CALL_AGAIN_SUFFIX} after reporting completion"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportCompletionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskStatusResponse {
    pub fn not_found() -> Self {
        Self {
            success: true,
            task_id: None,
            status: None,
            agent_id: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            success: true,
            task_id: Some(task.id.clone()),
            status: Some(task.status),
            agent_id: task.assigned_agent_id.as_ref().map(|a| a.to_string()),
            started_at: task.started_at,
            completed_at: task.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskView {
    pub task_id: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            status: task.status,
            priority: task.priority,
            description: task.description.clone(),
            agent_id: task.assigned_agent_id.as_ref().map(|a| a.to_string()),
            created_at: task.created_at,
            started_at: task.started_at,
            completed_at: task.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TasksByStatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TasksByAgentResponse {
    pub success: bool,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct AgentView {
    pub agent_id: String,
    pub persona_id: String,
    pub status: AgentStatus,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.id.to_string(),
            persona_id: agent.persona_id.clone(),
            status: agent.status,
            registered_at: agent.registered_at,
            last_heartbeat: agent.last_heartbeat,
            started_at: agent.started_at,
            stopped_at: agent.stopped_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListAgentsResponse {
    pub success: bool,
    pub agents: Vec<AgentView>,
}

#[derive(Debug, Serialize)]
pub struct LaunchAgentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KillAgentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveMemoryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReadMemoryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MemoryEntryView {
    pub key: String,
    pub namespace: String,
    pub r#type: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub access_count: u64,
}

impl From<&MemoryEntry> for MemoryEntryView {
    fn from(entry: &MemoryEntry) -> Self {
        Self {
            key: entry.key.clone(),
            namespace: entry.namespace.clone(),
            r#type: entry.entry_type.clone(),
            size: entry.size,
            created_at: entry.created_at,
            last_updated_at: entry.last_updated_at,
            access_count: entry.access_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListMemoryResponse {
    pub success: bool,
    pub entries: Vec<MemoryEntryView>,
}
