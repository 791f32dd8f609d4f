//! Inbound (Driving) port for the event store.

use crate::domain::{Aggregate, CommandOutcome, CommandProcessor, StoredEvent};
use crate::error::EventStoreError;
use async_trait::async_trait;

/// Identifier type of the processor's aggregate.
pub type AggregateId<P> = <<P as CommandProcessor>::Aggregate as Aggregate>::Id;

/// Event type of the processor's aggregate.
pub type EventOf<P> = <<P as CommandProcessor>::Aggregate as Aggregate>::Event;

/// Event store bound to one command processor (and thus one aggregate type).
#[async_trait]
pub trait EventStore<P: CommandProcessor>: Send + Sync {
    /// Run a command against the aggregate, committing its events.
    ///
    /// Commands for the same aggregate are applied one at a time in the order
    /// their lock requests are granted. A token already committed for this
    /// aggregate returns the committed events without invoking the processor.
    async fn process_command(
        &self,
        command: P::Command,
        aggregate_id: &AggregateId<P>,
    ) -> Result<CommandOutcome<P::Aggregate>, EventStoreError<P::Rejection>>;

    /// Current materialized state (empty state for unknown aggregates).
    async fn load(&self, aggregate_id: &AggregateId<P>) -> P::Aggregate;

    /// Full event log of the aggregate.
    async fn events(&self, aggregate_id: &AggregateId<P>) -> Vec<StoredEvent<EventOf<P>>>;

    /// Rebuild the state by replaying the log from empty.
    async fn rebuild(
        &self,
        aggregate_id: &AggregateId<P>,
    ) -> Result<P::Aggregate, EventStoreError<P::Rejection>>;
}
