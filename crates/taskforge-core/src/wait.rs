//! Long-poll primitive (C6): subscribe, then check, then wait on events
//! until satisfied or the deadline fires. Purely event-driven — there is
//! no fixed-tick polling interval anywhere in this loop.

use crate::error::CoreResult;
use crate::eventbus::{Event, EventBus, MemoryEvent};
use crate::memory_service::MemoryService;
use crate::model::MemoryEntry;
use crate::task_coordinator::{claim_event_is_relevant, ClaimOutcome, TaskCoordinator};
use skreaver_core::AgentId;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub struct WaitService {
    bus: Arc<EventBus>,
}

impl WaitService {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    /// Long-poll claim used by `getNextTask`. Refreshes the agent's
    /// heartbeat via `coordinator`'s owning registry before subscribing is
    /// the caller's responsibility (see `taskforge-rpc`); this method
    /// assumes the agent is known to exist.
    pub async fn wait_for_claim(
        &self,
        coordinator: &TaskCoordinator,
        agent_id: &AgentId,
        agent_persona: &str,
        timeout: Duration,
    ) -> CoreResult<ClaimOutcome> {
        let agent_for_filter = agent_id.clone();
        let persona_for_filter = agent_persona.to_string();
        let mut sub = self
            .bus
            .subscribe(move |event| {
                claim_event_is_relevant(event, &agent_for_filter, &persona_for_filter)
            })
            .await;

        if let ClaimOutcome::Claimed(task) = coordinator.claim_next(agent_id).await? {
            sub.cancel().await;
            return Ok(ClaimOutcome::Claimed(task));
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                sub.cancel().await;
                return Ok(ClaimOutcome::NoTask);
            }

            match tokio::time::timeout(remaining, sub.next()).await {
                Ok(Some(_event)) => {
                    if let ClaimOutcome::Claimed(task) = coordinator.claim_next(agent_id).await? {
                        sub.cancel().await;
                        return Ok(ClaimOutcome::Claimed(task));
                    }
                    // Another waiter won the race; keep waiting for the
                    // remaining deadline.
                }
                Ok(None) => {
                    sub.cancel().await;
                    return Ok(ClaimOutcome::NoTask);
                }
                Err(_elapsed) => {
                    sub.cancel().await;
                    return Ok(ClaimOutcome::NoTask);
                }
            }
        }
    }

    /// Long-poll read used by `readMemory`-style waits. Distinct timeout
    /// outcome from "not found": this returns `None` only on deadline.
    pub async fn wait_for_memory_key(
        &self,
        memory: &MemoryService,
        namespace: &str,
        key: &str,
        timeout: Duration,
    ) -> Option<MemoryEntry> {
        let ns = namespace.to_string();
        let k = key.to_string();
        let mut sub = self
            .bus
            .subscribe(move |event| memory_event_matches(event, &ns, &k))
            .await;

        if let Some(entry) = memory.read(namespace, key) {
            sub.cancel().await;
            return Some(entry);
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                sub.cancel().await;
                return None;
            }

            match tokio::time::timeout(remaining, sub.next()).await {
                Ok(Some(_event)) => {
                    if let Some(entry) = memory.read(namespace, key) {
                        sub.cancel().await;
                        return Some(entry);
                    }
                }
                Ok(None) | Err(_) => {
                    sub.cancel().await;
                    return None;
                }
            }
        }
    }
}

fn memory_event_matches(event: &Event, namespace: &str, key: &str) -> bool {
    match event {
        Event::Memory(MemoryEvent::Saved { namespace: n, key: k })
        | Event::Memory(MemoryEvent::Updated { namespace: n, key: k }) => {
            n == namespace && k == key
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_registry::AgentRegistry;
    use crate::clock::{Clock, TestClock};
    use crate::collaborators::NoopProcessTerminator;
    use crate::model::Priority;
    use crate::store::Store;
    use chrono::Utc;
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn wait_for_claim_returns_immediately_for_pre_existing_task() {
        let store = Store::new();
        let bus = EventBus::new(32);
        let clock: Arc<dyn Clock> = Arc::new(TestClock::new(Utc::now()));
        let registry = AgentRegistry::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            clock.clone(),
            Arc::new(NoopProcessTerminator),
        );
        let coordinator = TaskCoordinator::new(Arc::clone(&store), Arc::clone(&bus), clock.clone());
        let wait = WaitService::new(Arc::clone(&bus));

        let agent_id = registry.register("reviewer".into(), "/tmp".into(), None, None).await;
        registry.heartbeat(&agent_id).await;
        coordinator
            .create_task(None, "p".into(), "d".into(), Priority::Normal, None)
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        let outcome = wait
            .wait_for_claim(&coordinator, &agent_id, "reviewer", StdDuration::from_millis(200))
            .await
            .unwrap();
        assert!(matches!(outcome, ClaimOutcome::Claimed(_)));
        assert!(started.elapsed() < StdDuration::from_millis(100));
    }

    #[tokio::test]
    async fn wait_for_claim_times_out_with_no_task() {
        let store = Store::new();
        let bus = EventBus::new(32);
        let clock: Arc<dyn Clock> = Arc::new(TestClock::new(Utc::now()));
        let registry = AgentRegistry::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            clock.clone(),
            Arc::new(NoopProcessTerminator),
        );
        let coordinator = TaskCoordinator::new(Arc::clone(&store), Arc::clone(&bus), clock.clone());
        let wait = WaitService::new(Arc::clone(&bus));

        let agent_id = registry.register("reviewer".into(), "/tmp".into(), None, None).await;
        registry.heartbeat(&agent_id).await;

        let started = tokio::time::Instant::now();
        let outcome = wait
            .wait_for_claim(&coordinator, &agent_id, "reviewer", StdDuration::from_millis(50))
            .await
            .unwrap();
        assert!(matches!(outcome, ClaimOutcome::NoTask));
        let elapsed = started.elapsed();
        assert!(elapsed >= StdDuration::from_millis(45));
        assert!(elapsed < StdDuration::from_millis(300));
    }

    #[tokio::test]
    async fn wait_for_claim_wakes_on_creation() {
        let store = Store::new();
        let bus = EventBus::new(32);
        let clock: Arc<dyn Clock> = Arc::new(TestClock::new(Utc::now()));
        let registry = AgentRegistry::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            clock.clone(),
            Arc::new(NoopProcessTerminator),
        );
        let coordinator = Arc::new(TaskCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            clock.clone(),
        ));
        let wait = Arc::new(WaitService::new(Arc::clone(&bus)));

        let agent_id = registry.register("reviewer".into(), "/tmp".into(), None, None).await;
        registry.heartbeat(&agent_id).await;

        let wait2 = Arc::clone(&wait);
        let coordinator2 = Arc::clone(&coordinator);
        let agent_id2 = agent_id.clone();
        let waiter = tokio::spawn(async move {
            wait2
                .wait_for_claim(&coordinator2, &agent_id2, "reviewer", StdDuration::from_secs(1))
                .await
                .unwrap()
        });

        tokio::time::sleep(StdDuration::from_millis(100)).await;
        coordinator
            .create_task(
                Some(agent_id.clone()),
                "p".into(),
                "d".into(),
                Priority::Normal,
                None,
            )
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        let outcome = tokio::time::timeout(StdDuration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, ClaimOutcome::Claimed(_)));
        assert!(started.elapsed() < StdDuration::from_millis(900));
    }
}
