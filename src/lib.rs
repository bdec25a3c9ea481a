//! # taskforge
//!
//! Coordination kernel for multi-agent task dispatch: an in-process event
//! bus, a priority-and-FIFO task lifecycle, long-poll waiting, agent
//! lifecycle management, and namespaced shared memory — plus the RPC
//! translation layer (`taskforge-rpc`) that exposes those operations to an
//! external tool-calling surface.
//!
//! This crate is a thin re-export of [`taskforge_meta`]; most consumers
//! only need `taskforge_meta::core` (the kernel) and, if they are building
//! a tool-calling front end, `taskforge_meta::rpc`.
//!
//! ```
//! use std::sync::Arc;
//! use taskforge::core::{Clock, Config, Kernel, SystemClock};
//! use taskforge::core::collaborators::NoopProcessTerminator;
//!
//! # async fn quick_start() {
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let kernel = Kernel::new(clock, &Config::default(), Arc::new(NoopProcessTerminator));
//! kernel.start().await;
//! # }
//! ```

pub use taskforge_meta::{core, rpc};
