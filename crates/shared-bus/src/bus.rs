//! Publishing and subscribing ports, and the broadcast-backed bus.

use crate::subscription::{EventStream, Subscription};
use crate::topic::{BusEvent, EventFilter};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

#[async_trait]
pub trait EventPublisher<E: BusEvent>: Send + Sync {
    /// Returns how many subscribers were live when the event was sent.
    async fn publish(&self, event: E) -> usize;
}

pub trait EventSubscriber<E: BusEvent>: Send + Sync {
    fn subscribe(&self, filter: EventFilter) -> Subscription<E>;
}

pub struct InMemoryEventBus<E: BusEvent> {
    sender: broadcast::Sender<E>,
    published: AtomicU64,
    undelivered: AtomicU64,
}

impl<E: BusEvent> InMemoryEventBus<E> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
            undelivered: AtomicU64::new(0),
        }
    }

    pub fn event_stream(&self, filter: EventFilter) -> EventStream<E> {
        self.subscribe(filter).into_stream()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Events published while nobody was subscribed.
    pub fn undelivered(&self) -> u64 {
        self.undelivered.load(Ordering::Relaxed)
    }
}

impl<E: BusEvent> Default for InMemoryEventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> EventSubscriber<E> for InMemoryEventBus<E> {
    fn subscribe(&self, filter: EventFilter) -> Subscription<E> {
        debug!(?filter, live = self.subscriber_count() + 1, "Subscribed");
        Subscription::new(self.sender.subscribe(), filter)
    }
}

#[async_trait]
impl<E: BusEvent> EventPublisher<E> for InMemoryEventBus<E> {
    async fn publish(&self, event: E) -> usize {
        let (topic, round_id) = (event.topic(), event.round_id());
        self.published.fetch_add(1, Ordering::Relaxed);

        let receivers = self.sender.send(event).unwrap_or_else(|_| {
            self.undelivered.fetch_add(1, Ordering::Relaxed);
            0
        });
        trace!(?topic, %round_id, receivers, "Published");
        receivers
    }
}
