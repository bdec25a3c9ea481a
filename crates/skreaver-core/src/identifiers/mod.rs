//! Validated identifier types shared across the coordination kernel.
//!
//! Every identifier is a newtype around `String` so that, for example, an
//! `AgentId` can never be passed where a `RequestId` is expected.
//!
//! # Validation Rules
//!
//! - Non-empty (minimum 1 character)
//! - Maximum 128 characters
//! - No leading or trailing whitespace
//! - Only alphanumeric characters, hyphens (`-`), underscores (`_`), and dots (`.`)
//! - No path traversal sequences (`../`, `./`)
//!
//! # Examples
//!
//! ```rust
//! use skreaver_core::identifiers::AgentId;
//!
//! let agent = AgentId::parse("agent-1").unwrap();
//! assert_eq!(agent.as_str(), "agent-1");
//!
//! assert!(AgentId::parse("").is_err());              // Empty
//! assert!(AgentId::parse("  agent  ").is_err());     // Whitespace
//! assert!(AgentId::parse("agent/path").is_err());    // Invalid char
//! ```

mod validation;

pub use validation::{IdValidationError, IdValidator};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    /// Parse and validate an agent ID from a string.
    pub fn parse(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
        IdValidator::validate(id.as_ref()).map(|s| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create an agent ID without validation. Only for tests and internal ID
    /// generation where the source is already known-valid (e.g. a fresh UUID).
    #[doc(hidden)]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, randomly assigned agent ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AgentId {
    type Err = IdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

impl TryFrom<String> for AgentId {
    type Error = IdValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

/// Unique identifier for an inbound request or operation, used to correlate
/// log lines and event log entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(String);

impl RequestId {
    pub fn parse(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
        IdValidator::validate(id.as_ref()).map(|s| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[doc(hidden)]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random request ID using UUID v4.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = IdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

impl TryFrom<String> for RequestId {
    type Error = IdValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}
