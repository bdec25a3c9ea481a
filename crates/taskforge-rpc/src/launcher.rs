//! Agent process launching: owned entirely by the RPC layer since the
//! kernel never spawns processes itself.

use async_trait::async_trait;
use skreaver_core::AgentId;

/// What a successful launch reports back about the process it started.
#[derive(Debug, Clone)]
pub struct LaunchHandle {
    pub process_id: Option<String>,
    pub working_directory: String,
}

/// Spawns the external process (or worktree-backed agent session)
/// corresponding to a `launchAgent` call. Implementations decide how a
/// persona and description become a running process; the kernel only
/// ever learns the resulting [`LaunchHandle`].
#[async_trait]
pub trait AgentLauncher: Send + Sync {
    async fn launch(
        &self,
        agent_id: &AgentId,
        persona_id: &str,
        description: &str,
        model: Option<&str>,
        worktree_name: Option<&str>,
        yolo: bool,
    ) -> Result<LaunchHandle, String>;
}

/// Default launcher for kernels run without a real process manager
/// (tests, and embedding contexts that drive the kernel directly).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAgentLauncher;

#[async_trait]
impl AgentLauncher for NoopAgentLauncher {
    async fn launch(
        &self,
        _agent_id: &AgentId,
        _persona_id: &str,
        _description: &str,
        _model: Option<&str>,
        worktree_name: Option<&str>,
        _yolo: bool,
    ) -> Result<LaunchHandle, String> {
        Ok(LaunchHandle {
            process_id: None,
            working_directory: worktree_name
                .map(|w| format!("/tmp/{w}"))
                .unwrap_or_else(|| "/tmp".to_string()),
        })
    }
}
