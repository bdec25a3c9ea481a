//! # taskforge-core
//!
//! The coordination kernel: an in-process event bus, a task lifecycle
//! state machine with priority-based claiming, a long-poll waiting
//! protocol, an agent lifecycle state machine with dangling-task
//! recovery, and a durable in-memory key/value store.
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskforge_core::clock::SystemClock;
//! use taskforge_core::store::Store;
//! use taskforge_core::eventbus::EventBus;
//! use taskforge_core::agent_registry::AgentRegistry;
//! use taskforge_core::task_coordinator::TaskCoordinator;
//! use taskforge_core::collaborators::NoopProcessTerminator;
//!
//! # async fn quick_start() {
//! let store = Store::new();
//! let bus = EventBus::new(256);
//! let clock: Arc<dyn taskforge_core::clock::Clock> = Arc::new(SystemClock);
//!
//! let registry = AgentRegistry::new(
//!     Arc::clone(&store),
//!     Arc::clone(&bus),
//!     Arc::clone(&clock),
//!     Arc::new(NoopProcessTerminator),
//! );
//! let coordinator = TaskCoordinator::new(Arc::clone(&store), Arc::clone(&bus), clock);
//!
//! let agent_id = registry.register("reviewer".into(), "/tmp/ws".into(), None, None).await;
//! registry.heartbeat(&agent_id).await;
//! coordinator
//!     .create_task(None, "persona text".into(), "say hi".into(), Default::default(), None)
//!     .await
//!     .unwrap();
//! let _ = coordinator.claim_next(&agent_id).await;
//! # let _ = Duration::from_secs(0);
//! # }
//! ```

pub mod agent_registry;
pub mod clock;
pub mod collaborators;
pub mod error;
pub mod event_logger;
pub mod eventbus;
pub mod memory_service;
pub mod model;
pub mod store;
pub mod task_coordinator;
pub mod wait;

pub use agent_registry::AgentRegistry;
pub use clock::{Clock, SystemClock, TestClock};
pub use error::{CoreError, CoreResult};
pub use event_logger::EventLogger;
pub use eventbus::{AgentEvent, Event, EventBus, MemoryEvent, Subscription, TaskEvent};
pub use memory_service::MemoryService;
pub use model::{Agent, AgentStatus, EventLogEntry, MemoryEntry, Priority, Task, TaskStatus};
pub use store::Store;
pub use task_coordinator::{ClaimOutcome, CompleteOutcome, TaskCoordinator};
pub use wait::WaitService;

/// Runtime knobs carried as ambient configuration rather than scattered
/// magic numbers.
#[derive(Debug, Clone)]
pub struct Config {
    pub event_bus_buffer_capacity: usize,
    pub default_long_poll_timeout: std::time::Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_bus_buffer_capacity: eventbus::DEFAULT_BUFFER_CAPACITY,
            default_long_poll_timeout: std::time::Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Overrides defaults from environment variables when present:
    /// `TASKFORGE_EVENT_BUS_BUFFER_CAPACITY`, `TASKFORGE_LONG_POLL_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("TASKFORGE_EVENT_BUS_BUFFER_CAPACITY") {
            if let Ok(parsed) = v.parse() {
                config.event_bus_buffer_capacity = parsed;
            }
        }
        if let Ok(v) = std::env::var("TASKFORGE_LONG_POLL_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse() {
                config.default_long_poll_timeout = std::time::Duration::from_secs(parsed);
            }
        }
        config
    }
}

/// One in-process kernel instance: the Store, the Event Bus, and the four
/// services that mutate them. Construct one per process.
pub struct Kernel {
    pub store: std::sync::Arc<Store>,
    pub bus: std::sync::Arc<EventBus>,
    pub clock: std::sync::Arc<dyn Clock>,
    pub agents: AgentRegistry,
    pub tasks: TaskCoordinator,
    pub memory: MemoryService,
    pub wait: WaitService,
    pub event_logger: std::sync::Arc<EventLogger>,
}

impl Kernel {
    pub fn new(
        clock: std::sync::Arc<dyn Clock>,
        config: &Config,
        terminator: std::sync::Arc<dyn collaborators::ProcessTerminator>,
    ) -> Self {
        let store = Store::new();
        let bus = EventBus::new(config.event_bus_buffer_capacity);
        let agents = AgentRegistry::new(
            std::sync::Arc::clone(&store),
            std::sync::Arc::clone(&bus),
            std::sync::Arc::clone(&clock),
            terminator,
        );
        let tasks = TaskCoordinator::new(
            std::sync::Arc::clone(&store),
            std::sync::Arc::clone(&bus),
            std::sync::Arc::clone(&clock),
        );
        let memory = MemoryService::new(
            std::sync::Arc::clone(&store),
            std::sync::Arc::clone(&bus),
            std::sync::Arc::clone(&clock),
        );
        let wait = WaitService::new(std::sync::Arc::clone(&bus));
        let event_logger = EventLogger::new(
            std::sync::Arc::clone(&store),
            std::sync::Arc::clone(&bus),
            std::sync::Arc::clone(&clock),
        );

        Self {
            store,
            bus,
            clock,
            agents,
            tasks,
            memory,
            wait,
            event_logger,
        }
    }

    /// Starts the Event Logger's background subscriptions. Call once,
    /// before any events that must be audited are published.
    pub async fn start(&self) {
        self.event_logger.start().await;
    }
}
