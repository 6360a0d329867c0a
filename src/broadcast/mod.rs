//! Fan-out of widget change events to in-process subscribers.
//!
//! [`BroadcastHook`] delivers [`WidgetEvent`]s to any number of concurrent
//! live listeners without blocking the producer and without unbounded memory
//! growth: each subscriber owns a bounded queue, and a publish performs a
//! non-blocking send to every queue. A full queue drops that event for that
//! subscriber only — slow consumers are isolated, producers never feel
//! backpressure.
//!
//! Publishes take the shared side of the lock (they only read the subscriber
//! map), so many publishes proceed concurrently; subscribe/cancel take the
//! exclusive side and serialize topology changes. No ordering is guaranteed
//! across subscribers; within one subscriber's stream delivery is FIFO.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::{DashboardError, WidgetEvent};


/// Bounded queue capacity per subscriber. Allows bursty update scenarios
/// without letting an abandoned consumer pin unbounded memory.
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 8;

/// Notifies transports (REST/WebSocket/SSE adapters) about widget changes.
#[async_trait]
pub trait RefreshHook: Send + Sync {
    /// Delivers one widget change event. Implementations are best-effort
    /// observability: a failure never rolls back the store mutation that
    /// produced the event.
    async fn widget_updated(&self, event: WidgetEvent) -> Result<(), DashboardError>;
}

/// Hook that discards every event. Used when no transport is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRefreshHook;

#[async_trait]
impl RefreshHook for NoopRefreshHook {
    async fn widget_updated(&self, _event: WidgetEvent) -> Result<(), DashboardError> {
        Ok(())
    }
}

type SubscriberMap = HashMap<u64, mpsc::Sender<WidgetEvent>>;

/// In-process pub/sub fan-out of widget change events.
pub struct BroadcastHook {
    subscribers: Arc<RwLock<SubscriberMap>>,
    next_id: AtomicU64,
}

impl BroadcastHook {
    /// Creates a hook with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a new subscriber.
    ///
    /// Returns the subscriber's event stream and a [`Subscription`] handle.
    /// Subscriptions live for the duration of one transport connection and
    /// must be cancelled explicitly when the connection ends; membership
    /// never changes silently.
    pub fn subscribe(&self) -> (mpsc::Receiver<WidgetEvent>, Subscription) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().insert(id, tx);
        tracing::debug!(subscriber = id, "broadcast subscriber added");
        (
            rx,
            Subscription {
                id,
                subscribers: Arc::clone(&self.subscribers),
            },
        )
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Fans `event` out to every subscriber with a non-blocking send.
    ///
    /// A subscriber whose queue is full misses this event; everyone else is
    /// unaffected.
    pub fn publish(&self, event: &WidgetEvent) {
        let subscribers = self.subscribers.read();
        for (id, tx) in subscribers.iter() {
            match tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::trace!(subscriber = id, "subscriber queue full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::trace!(subscriber = id, "subscriber receiver gone, event dropped");
                }
            }
        }
    }
}

impl Default for BroadcastHook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BroadcastHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHook")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[async_trait]
impl RefreshHook for BroadcastHook {
    async fn widget_updated(&self, event: WidgetEvent) -> Result<(), DashboardError> {
        self.publish(&event);
        Ok(())
    }
}

/// Cancellation handle for one broadcast subscriber.
pub struct Subscription {
    id: u64,
    subscribers: Arc<RwLock<SubscriberMap>>,
}

impl Subscription {
    /// Removes the subscriber from the fan-out set and closes its queue.
    ///
    /// Consumers iterating the stream observe end-of-stream once the queue
    /// drains. Safe to call more than once.
    pub fn cancel(&self) {
        if self.subscribers.write().remove(&self.id).is_some() {
            tracing::debug!(subscriber = self.id, "broadcast subscriber cancelled");
        }
    }
}
