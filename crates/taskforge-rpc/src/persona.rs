//! Persona text resolution: `resolve(personaId) -> personaText`, kept out
//! of the kernel since it is purely a launch-time concern.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

#[async_trait]
pub trait PersonaResolver: Send + Sync {
    async fn resolve(&self, persona_id: &str) -> Option<String>;
}

/// Resolves personas from a fixed in-process table. Useful for tests and
/// single-binary deployments that bundle a small, static persona set.
#[derive(Debug, Default, Clone)]
pub struct EmbeddedPersonaResolver {
    personas: HashMap<String, String>,
}

impl EmbeddedPersonaResolver {
    pub fn new(personas: HashMap<String, String>) -> Self {
        Self { personas }
    }
}

#[async_trait]
impl PersonaResolver for EmbeddedPersonaResolver {
    async fn resolve(&self, persona_id: &str) -> Option<String> {
        self.personas.get(persona_id).cloned()
    }
}

/// Resolves personas by reading `<personaId>.md` from a configured
/// directory, so operators can add personas without a rebuild.
#[derive(Debug, Clone)]
pub struct DirectoryPersonaResolver {
    root: PathBuf,
}

impl DirectoryPersonaResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl PersonaResolver for DirectoryPersonaResolver {
    async fn resolve(&self, persona_id: &str) -> Option<String> {
        let path = self.root.join(format!("{persona_id}.md"));
        tokio::fs::read_to_string(path).await.ok()
    }
}
