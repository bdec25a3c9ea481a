//! # taskforge-rpc
//!
//! Translation layer (C9) between an external tool-calling surface (out of
//! scope here — HTTP, JSON-RPC, MCP, whatever a deployment wires up) and
//! the coordination kernel in `taskforge-core`. Every function below takes
//! primitive request fields and a [`Kernel`] reference and returns one of
//! the envelope types in [`envelopes`], never a raw `CoreError`.

pub mod envelopes;
pub mod launcher;
pub mod persona;

use envelopes::{
    AgentView, CreateTaskResponse, GetNextTaskResponse, KillAgentResponse, LaunchAgentResponse,
    ListAgentsResponse, ListMemoryResponse, MemoryEntryView, ReadMemoryResponse,
    ReportCompletionResponse, SaveMemoryResponse, TaskStatusResponse, TaskView,
    TasksByAgentResponse, TasksByStatusResponse,
};
use launcher::AgentLauncher;
use persona::PersonaResolver;
use skreaver_core::AgentId;
use taskforge_core::{ClaimOutcome, CompleteOutcome, CoreError, Kernel, Priority, TaskStatus};

fn parse_agent_id(raw: &str) -> Result<AgentId, String> {
    AgentId::parse(raw).map_err(|e| e.to_string())
}

/// `createTask`: validates the optional assignee, then enqueues a Pending
/// task at the given priority.
pub async fn create_task(
    kernel: &Kernel,
    agent_id: Option<&str>,
    persona_text: String,
    description: String,
    priority: Priority,
    persona_id: Option<String>,
) -> CreateTaskResponse {
    let agent_id = match agent_id {
        Some(raw) => match parse_agent_id(raw) {
            Ok(id) => Some(id),
            Err(message) => {
                return CreateTaskResponse {
                    success: false,
                    task_id: None,
                    error_message: Some(message),
                }
            }
        },
        None => None,
    };

    match kernel
        .tasks
        .create_task(agent_id, persona_text, description, priority, persona_id)
        .await
    {
        Ok(task_id) => CreateTaskResponse {
            success: true,
            task_id: Some(task_id),
            error_message: None,
        },
        Err(err) => CreateTaskResponse {
            success: false,
            task_id: None,
            error_message: Some(core_error_message(&err)),
        },
    }
}

/// `getNextTask`: refreshes the agent's heartbeat, then long-polls for a
/// claimable task up to `timeout`. A timed-out wait is not an error: it
/// is reported as the synthetic "no tasks available" envelope so a
/// caller's retry loop has something to call again.
pub async fn get_next_task(
    kernel: &Kernel,
    agent_id: &str,
    timeout: std::time::Duration,
) -> GetNextTaskResponse {
    let agent_id = match parse_agent_id(agent_id) {
        Ok(id) => id,
        Err(_) => return GetNextTaskResponse::agent_not_found(),
    };

    if !kernel.agents.heartbeat(&agent_id).await {
        return GetNextTaskResponse::agent_not_found();
    }
    let Some(agent) = kernel.agents.get(agent_id.as_str()) else {
        return GetNextTaskResponse::agent_not_found();
    };

    match kernel
        .wait
        .wait_for_claim(&kernel.tasks, &agent_id, &agent.persona_id, timeout)
        .await
    {
        Ok(ClaimOutcome::Claimed(task)) => GetNextTaskResponse::from_task(&task),
        Ok(ClaimOutcome::NoTask) | Err(_) => GetNextTaskResponse::synthetic_no_task(),
    }
}

/// `reportTaskCompletion`.
pub async fn report_task_completion(
    kernel: &Kernel,
    task_id: &str,
    result_text: String,
) -> ReportCompletionResponse {
    match kernel.tasks.complete(task_id, result_text).await {
        Ok(CompleteOutcome::Completed(_)) => ReportCompletionResponse {
            success: true,
            message: "Task marked completed".to_string(),
        },
        Ok(CompleteOutcome::AlreadyTerminal(task)) => ReportCompletionResponse {
            success: false,
            message: format!("task {} is already completed ({:?})", task.id, task.status),
        },
        Ok(CompleteOutcome::NotFound) => ReportCompletionResponse {
            success: false,
            message: format!("Task not found: {task_id}"),
        },
        Err(err) => ReportCompletionResponse {
            success: false,
            message: core_error_message(&err),
        },
    }
}

/// `getTaskStatus`.
pub fn get_task_status(kernel: &Kernel, task_id: &str) -> TaskStatusResponse {
    match kernel.tasks.status(task_id) {
        Some(task) => TaskStatusResponse::from_task(&task),
        None => TaskStatusResponse::not_found(),
    }
}

/// `getTasksByStatus`. `status_name` is matched case-sensitively against
/// the Rust variant names (`Pending`, `InProgress`, `Completed`, `Failed`).
pub fn get_tasks_by_status(kernel: &Kernel, status_name: &str) -> TasksByStatusResponse {
    let Some(status) = parse_task_status(status_name) else {
        return TasksByStatusResponse {
            success: false,
            tasks: None,
            error_message: Some(format!("unknown task status: {status_name}")),
        };
    };
    let tasks = kernel.tasks.by_status(status);
    TasksByStatusResponse {
        success: true,
        tasks: Some(tasks.iter().map(TaskView::from).collect()),
        error_message: None,
    }
}

/// `getTasksByAgentId`.
pub fn get_tasks_by_agent_id(kernel: &Kernel, agent_id: &str) -> TasksByAgentResponse {
    let tasks = kernel.tasks.by_agent(agent_id);
    TasksByAgentResponse {
        success: true,
        tasks: tasks.iter().map(TaskView::from).collect(),
    }
}

/// `listAgents`.
pub fn list_agents(kernel: &Kernel, persona_filter: Option<&str>) -> ListAgentsResponse {
    let agents = kernel.agents.list(persona_filter);
    ListAgentsResponse {
        success: true,
        agents: agents.iter().map(AgentView::from).collect(),
    }
}

/// `launchAgent`: registers the agent in the kernel, resolves its persona
/// text, then hands off to the collaborator that actually starts the
/// process. A launch failure still leaves the agent registered as
/// `Starting`; callers that want it cleaned up should follow up with
/// `killAgent`.
pub async fn launch_agent(
    kernel: &Kernel,
    launcher: &dyn AgentLauncher,
    persona_resolver: &dyn PersonaResolver,
    persona_id: String,
    description: String,
    model: Option<String>,
    worktree_name: Option<String>,
    yolo: bool,
) -> LaunchAgentResponse {
    if persona_resolver.resolve(&persona_id).await.is_none() {
        return LaunchAgentResponse {
            success: false,
            agent_id: None,
            error_message: Some(format!("unknown persona: {persona_id}")),
        };
    }

    let agent_id = kernel
        .agents
        .register(
            persona_id.clone(),
            String::new(),
            model.clone(),
            worktree_name.clone(),
        )
        .await;

    match launcher
        .launch(
            &agent_id,
            &persona_id,
            &description,
            model.as_deref(),
            worktree_name.as_deref(),
            yolo,
        )
        .await
    {
        Ok(handle) => {
            kernel
                .agents
                .record_working_directory(&agent_id, handle.working_directory)
                .await;
            if let Some(process_id) = handle.process_id {
                kernel.agents.record_process_id(&agent_id, process_id).await;
            }
            LaunchAgentResponse {
                success: true,
                agent_id: Some(agent_id.to_string()),
                error_message: None,
            }
        }
        Err(message) => LaunchAgentResponse {
            success: false,
            agent_id: Some(agent_id.to_string()),
            error_message: Some(message),
        },
    }
}

/// `killAgent`.
pub async fn kill_agent(kernel: &Kernel, agent_id: &str) -> KillAgentResponse {
    let agent_id = match parse_agent_id(agent_id) {
        Ok(id) => id,
        Err(message) => {
            return KillAgentResponse {
                success: false,
                error_message: Some(message),
            }
        }
    };
    if kernel.agents.kill(&agent_id).await {
        KillAgentResponse {
            success: true,
            error_message: None,
        }
    } else {
        KillAgentResponse {
            success: false,
            error_message: Some("Agent not found or already stopped".to_string()),
        }
    }
}

/// `saveMemory`.
pub async fn save_memory(
    kernel: &Kernel,
    namespace: Option<&str>,
    key: &str,
    value: String,
    entry_type: Option<String>,
    metadata: Option<String>,
) -> SaveMemoryResponse {
    let namespace = namespace.unwrap_or("");
    match kernel
        .memory
        .save(namespace, key, value, entry_type, metadata)
        .await
    {
        Ok(()) => SaveMemoryResponse {
            success: true,
            key: Some(key.to_string()),
            namespace: Some(namespace.to_string()),
            error_message: None,
        },
        Err(err) => SaveMemoryResponse {
            success: false,
            key: None,
            namespace: None,
            error_message: Some(core_error_message(&err)),
        },
    }
}

/// `readMemory`.
pub fn read_memory(kernel: &Kernel, namespace: Option<&str>, key: &str) -> ReadMemoryResponse {
    let namespace = namespace.unwrap_or("");
    match kernel.memory.read(namespace, key) {
        Some(entry) => ReadMemoryResponse {
            success: true,
            value: Some(entry.value),
            r#type: Some(entry.entry_type),
            size: Some(entry.size),
            error_message: None,
        },
        None => ReadMemoryResponse {
            success: false,
            value: None,
            r#type: None,
            size: None,
            error_message: Some("key not found".to_string()),
        },
    }
}

/// `listMemory`.
pub fn list_memory(kernel: &Kernel, namespace: Option<&str>) -> ListMemoryResponse {
    let namespace = namespace.unwrap_or("");
    let entries = kernel.memory.list(namespace);
    ListMemoryResponse {
        success: true,
        entries: entries.iter().map(MemoryEntryView::from).collect(),
    }
}

fn parse_task_status(name: &str) -> Option<TaskStatus> {
    match name {
        "Pending" => Some(TaskStatus::Pending),
        "InProgress" => Some(TaskStatus::InProgress),
        "Completed" => Some(TaskStatus::Completed),
        "Failed" => Some(TaskStatus::Failed),
        _ => None,
    }
}

fn core_error_message(err: &CoreError) -> String {
    match err {
        CoreError::NotFound(_) => "Agent not found".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launcher::NoopAgentLauncher;
    use persona::EmbeddedPersonaResolver;
    use std::collections::HashMap;
    use std::sync::Arc;
    use taskforge_core::clock::{Clock, TestClock};
    use taskforge_core::collaborators::NoopProcessTerminator;
    use taskforge_core::Config;
    use chrono::Utc;

    fn kernel() -> Kernel {
        let clock: Arc<dyn Clock> = Arc::new(TestClock::new(Utc::now()));
        Kernel::new(clock, &Config::default(), Arc::new(NoopProcessTerminator))
    }

    fn personas() -> EmbeddedPersonaResolver {
        let mut map = HashMap::new();
        map.insert("reviewer".to_string(), "You review code.".to_string());
        EmbeddedPersonaResolver::new(map)
    }

    #[tokio::test]
    async fn launch_then_get_next_task_round_trips() {
        let kernel = kernel();
        let launcher = NoopAgentLauncher;
        let resolver = personas();

        let launch = launch_agent(
            &kernel,
            &launcher,
            &resolver,
            "reviewer".into(),
            "review PR #4".into(),
            None,
            None,
            false,
        )
        .await;
        assert!(launch.success);
        let agent_id = launch.agent_id.unwrap();

        create_task(
            &kernel,
            None,
            "You review code.".into(),
            "review PR #4".into(),
            Priority::Normal,
            Some("reviewer".into()),
        )
        .await;

        let next = get_next_task(&kernel, &agent_id, std::time::Duration::from_millis(200)).await;
        assert!(next.success);
        assert!(!next.task_id.starts_with(envelopes::SYNTHETIC_TASK_PREFIX));

        let completion = report_task_completion(&kernel, &next.task_id, "done".into()).await;
        assert!(completion.success);

        let status = get_task_status(&kernel, &next.task_id);
        assert_eq!(status.status, Some(TaskStatus::Completed));
    }

    #[tokio::test]
    async fn get_next_task_times_out_with_synthetic_envelope() {
        let kernel = kernel();
        let agent_id = kernel
            .agents
            .register("reviewer".into(), "/tmp".into(), None, None)
            .await;

        let next = get_next_task(
            &kernel,
            agent_id.as_str(),
            std::time::Duration::from_millis(30),
        )
        .await;
        assert!(next.success);
        assert!(next.task_id.starts_with(envelopes::SYNTHETIC_TASK_PREFIX));
        assert!(next.message.contains("call this tool again"));
    }

    #[tokio::test]
    async fn get_next_task_for_unknown_agent_is_a_failure_not_a_synthetic_envelope() {
        let kernel = kernel();
        let unknown = skreaver_core::AgentId::generate();

        let next = get_next_task(&kernel, unknown.as_str(), std::time::Duration::from_millis(30)).await;
        assert!(!next.success);
        assert!(next.message.contains("Agent not found"));
        assert!(!next.task_id.starts_with(envelopes::SYNTHETIC_TASK_PREFIX));
    }

    #[tokio::test]
    async fn launch_agent_rejects_unknown_persona() {
        let kernel = kernel();
        let launcher = NoopAgentLauncher;
        let resolver = personas();

        let response = launch_agent(
            &kernel,
            &launcher,
            &resolver,
            "unknown".into(),
            "do something".into(),
            None,
            None,
            false,
        )
        .await;
        assert!(!response.success);
        assert!(response.agent_id.is_none());
    }

    #[tokio::test]
    async fn kill_agent_reports_not_found_for_unknown_id() {
        let kernel = kernel();
        let response = kill_agent(&kernel, skreaver_core::AgentId::generate().as_str()).await;
        assert!(!response.success);
    }

    #[tokio::test]
    async fn save_and_read_memory_round_trip() {
        let kernel = kernel();
        let save = save_memory(&kernel, Some("ns"), "k1", "v1".into(), None, None).await;
        assert!(save.success);

        let read = read_memory(&kernel, Some("ns"), "k1");
        assert!(read.success);
        assert_eq!(read.value.as_deref(), Some("v1"));

        let listed = list_memory(&kernel, Some("ns"));
        assert_eq!(listed.entries.len(), 1);
    }
}
