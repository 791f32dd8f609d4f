//! # Shared Bus
//!
//! Broadcast of committed, client-visible round events to listeners.
//!
//! ```text
//! coordinator ──publish()──▶ InMemoryEventBus ──▶ Subscription (filtered)
//!                                              └─▶ EventStream  (filtered)
//! ```
//!
//! Every subscriber sees every published payload; filtering by topic and
//! round happens on the receiving side. Publishing never waits for a slow
//! subscriber: once its buffer is full it skips ahead and the number of
//! missed events is reported by [`Subscription::skipped`].

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod bus;
pub mod subscription;
pub mod topic;

pub use bus::{EventPublisher, EventSubscriber, InMemoryEventBus};
pub use subscription::{EventStream, Subscription, SubscriptionError};
pub use topic::{BusEvent, EventFilter, EventTopic};

/// Per-subscriber buffer before it starts skipping.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
