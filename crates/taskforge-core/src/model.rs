//! Persisted entity shapes: Agent, Work Item (Task), Memory Entry, Event Log Entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skreaver_core::AgentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Starting,
    Running,
    Stopped,
    Killed,
}

impl AgentStatus {
    pub fn is_operational(self) -> bool {
        matches!(self, AgentStatus::Starting | AgentStatus::Running)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub persona_id: String,
    pub working_directory: String,
    pub process_id: Option<String>,
    pub model: Option<String>,
    pub worktree_name: Option<String>,
    pub status: AgentStatus,
    pub registered_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_heartbeat: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
}

/// Ordered Low < Normal < High < Critical so `Ord::max` picks the highest
/// priority task among otherwise-equal candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub assigned_agent_id: Option<AgentId>,
    pub persona_id: Option<String>,
    pub persona_text: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub namespace: String,
    pub key: String,
    pub value: String,
    pub entry_type: String,
    pub metadata: Option<String>,
    pub is_compressed: bool,
    pub size: usize,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub accessed_at: Option<DateTime<Utc>>,
    pub access_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Task,
    Agent,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub actor: Option<String>,
    pub entity_id: Option<String>,
    pub entity_type: EntityType,
    pub severity: Severity,
    pub tags: Vec<String>,
    pub payload: String,
}
