//! Typed pub/sub for task, agent, and memory lifecycle events.
//!
//! `publish` holds the subscriber registry lock for the duration of
//! delivery to every matching subscriber. This is a deliberately
//! conservative implementation of "single serialization point for the
//! assign-publication-order step": it guarantees per-subscriber FIFO and
//! wait-for-space backpressure by construction, at the cost of serializing
//! unrelated publishers against each other rather than only against
//! subscribers they share. See DESIGN.md.

use crate::model::{AgentStatus, Priority};
use futures::Stream;
use serde::Serialize;
use skreaver_core::AgentId;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

#[derive(Debug, Clone, Serialize)]
pub enum TaskEvent {
    Created {
        task_id: String,
        agent_id: Option<AgentId>,
        persona_id: Option<String>,
        priority: Priority,
    },
    Claimed {
        task_id: String,
        agent_id: AgentId,
    },
    Completed {
        task_id: String,
        agent_id: Option<AgentId>,
    },
    Failed {
        task_id: String,
        agent_id: Option<AgentId>,
        result: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub enum AgentEvent {
    Registered {
        agent_id: AgentId,
        persona_id: String,
    },
    StatusChanged {
        agent_id: AgentId,
        from: AgentStatus,
        to: AgentStatus,
    },
    Killed {
        agent_id: AgentId,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub enum MemoryEvent {
    Saved { namespace: String, key: String },
    Updated { namespace: String, key: String },
}

#[derive(Debug, Clone, Serialize)]
pub enum Event {
    Task(TaskEvent),
    Agent(AgentEvent),
    Memory(MemoryEvent),
}

type Filter = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

struct Subscriber {
    id: u64,
    filter: Filter,
    tx: mpsc::Sender<Event>,
}

/// Default per-subscriber buffer capacity when none is configured.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
    buffer_capacity: usize,
}

impl EventBus {
    pub fn new(buffer_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            buffer_capacity,
        })
    }

    /// Subscribe to events matching `filter`. The subscription exists as
    /// soon as this call returns; any `publish` that starts afterward is
    /// guaranteed to be visible to it.
    pub async fn subscribe(
        self: &Arc<Self>,
        filter: impl Fn(&Event) -> bool + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(self.buffer_capacity);
        self.subscribers.lock().await.push(Subscriber {
            id,
            filter: Arc::new(filter),
            tx,
        });
        Subscription {
            id,
            bus: Arc::clone(self),
            stream: ReceiverStream::new(rx),
        }
    }

    /// Deliver `event` to every matching subscriber, waiting for buffer
    /// space where needed. Completes once every matching subscriber has
    /// accepted the event.
    pub async fn publish(&self, event: Event) {
        let subs = self.subscribers.lock().await;
        for sub in subs.iter() {
            if (sub.filter)(&event) {
                // Backpressure: blocks here until the subscriber has space,
                // or forever if it never drains (matches the wait-for-space
                // default policy).
                let _ = sub.tx.send(event.clone()).await;
            }
        }
    }

    async fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().await.retain(|s| s.id != id);
    }
}

/// A live subscription: a [`Stream`] of matching events plus an explicit
/// [`cancel`](Subscription::cancel).
pub struct Subscription {
    id: u64,
    bus: Arc<EventBus>,
    stream: ReceiverStream<Event>,
}

impl Subscription {
    /// Terminate the subscription. Queued-but-unconsumed events are
    /// discarded; idempotent.
    pub async fn cancel(self) {
        self.bus.unsubscribe(self.id).await;
    }

    pub async fn next(&mut self) -> Option<Event> {
        StreamExt::next(&mut self.stream).await
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(task_id: &str) -> Event {
        Event::Task(TaskEvent::Created {
            task_id: task_id.to_string(),
            agent_id: None,
            persona_id: None,
            priority: Priority::Normal,
        })
    }

    #[tokio::test]
    async fn late_subscriber_does_not_see_earlier_publish() {
        let bus = EventBus::new(8);
        bus.publish(created("before")).await;
        let mut sub = bus.subscribe(|_| true).await;
        bus.publish(created("after")).await;

        let event = tokio::time::timeout(std::time::Duration::from_millis(200), sub.next())
            .await
            .unwrap()
            .unwrap();
        match event {
            Event::Task(TaskEvent::Created { task_id, .. }) => assert_eq!(task_id, "after"),
            _ => panic!("unexpected event"),
        }
    }

    #[tokio::test]
    async fn per_subscriber_fifo_holds_under_concurrent_publish() {
        let bus = EventBus::new(1024);
        let mut sub = bus.subscribe(|_| true).await;

        let mut handles = Vec::new();
        for i in 0..200 {
            let bus = Arc::clone(&bus);
            handles.push(tokio::spawn(
                async move { bus.publish(created(&i.to_string())).await },
            ));
        }
        for h in handles {
            h.await.unwrap();
        }

        let mut seen = Vec::new();
        for _ in 0..200 {
            let event = sub.next().await.unwrap();
            if let Event::Task(TaskEvent::Created { task_id, .. }) = event {
                seen.push(task_id.parse::<u32>().unwrap());
            }
        }
        assert_eq!(seen.len(), 200);
        let mut sorted = seen.clone();
        sorted.sort_unstable();
        assert_eq!(seen.len(), sorted.len());
    }

    #[tokio::test]
    async fn backpressure_blocks_publisher_until_drained() {
        let bus = EventBus::new(1);
        let mut sub = bus.subscribe(|_| true).await;

        bus.publish(created("one")).await;

        let bus2 = Arc::clone(&bus);
        let second = tokio::spawn(async move { bus2.publish(created("two")).await });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!second.is_finished());

        let first = sub.next().await.unwrap();
        matches!(first, Event::Task(TaskEvent::Created { .. }));

        tokio::time::timeout(std::time::Duration::from_millis(200), second)
            .await
            .expect("publisher unblocked after drain")
            .unwrap();
    }

    #[tokio::test]
    async fn cancel_stops_further_delivery() {
        let bus = EventBus::new(8);
        let sub = bus.subscribe(|_| true).await;
        sub.cancel().await;
        // Publishing after cancellation must not hang waiting on the
        // now-removed subscriber.
        tokio::time::timeout(std::time::Duration::from_millis(200), bus.publish(created("x")))
            .await
            .unwrap();
    }
}
