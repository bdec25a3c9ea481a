//! Narrow interfaces to collaborators that live outside the kernel:
//! process termination is the only one the core calls directly (from
//! [`crate::agent_registry::AgentRegistry::kill`]); worktree creation,
//! context-file writes, and terminal launching are entirely owned by the
//! RPC layer and never referenced here.

/// Terminates a previously spawned external process by its opaque id.
/// Idempotent; termination failures are logged by the caller and never
/// abort the kill transaction.
pub trait ProcessTerminator: Send + Sync {
    fn terminate(&self, process_id: &str) -> Result<(), String>;
}

/// Default collaborator for kernels run without a real process manager
/// (tests, and any deployment where agents are not actual child
/// processes).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProcessTerminator;

impl ProcessTerminator for NoopProcessTerminator {
    fn terminate(&self, _process_id: &str) -> Result<(), String> {
        Ok(())
    }
}
