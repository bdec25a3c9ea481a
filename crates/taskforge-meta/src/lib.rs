//! Single-dependency facade over the coordination kernel crate graph.
//! Downstream consumers that want the kernel plus its RPC translation
//! layer can depend on this crate alone instead of both members.

pub use taskforge_core as core;
pub use taskforge_rpc as rpc;
