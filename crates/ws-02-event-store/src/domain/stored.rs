//! Stored events and command outcomes.

use crate::domain::Aggregate;
use serde::{Deserialize, Serialize};
use shared_types::IdempotenceId;

/// An event as recorded in an aggregate's log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent<E> {
    /// Position in the aggregate's log, starting at 1.
    pub sequence: u64,
    /// Token of the command that produced the event.
    pub idempotence_id: IdempotenceId,
    /// The fact itself.
    pub event: E,
}

/// Result of a successfully processed (or replayed) command.
#[derive(Clone, Debug)]
pub struct CommandOutcome<A: Aggregate> {
    /// Events committed by the command. For a replay, the events committed
    /// the first time.
    pub new_events: Vec<StoredEvent<A::Event>>,
    /// Aggregate state after the latest committed event.
    pub state: A,
    /// Whether the outcome was served from the idempotency cache.
    pub replayed: bool,
}

impl<A: Aggregate> CommandOutcome<A> {
    /// Iterate the bare events.
    pub fn events(&self) -> impl Iterator<Item = &A::Event> {
        self.new_events.iter().map(|stored| &stored.event)
    }
}
