//! # Skreaver Core
//!
//! Validated identifier types shared by the coordination kernel and its
//! RPC surface. Kept as its own crate so identifier validation rules stay
//! consistent between the in-process kernel and anything that wraps it.

pub mod identifiers;

pub use identifiers::{AgentId, IdValidationError, RequestId};
