//! # Event-Sourcing Contracts
//!
//! An aggregate is a value rebuilt by a pure left fold over its events. A
//! command processor inspects one command against the current value and
//! either produces events or rejects the command; it never mutates state.

use async_trait::async_trait;
use shared_types::IdempotenceId;
use std::fmt;
use std::hash::Hash;

/// State rebuilt from an ordered event sequence.
pub trait Aggregate: Clone + fmt::Debug + Send + Sync + 'static {
    /// Aggregate identifier.
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Fact type folded into the state.
    type Event: Clone + fmt::Debug + Send + Sync + 'static;

    /// Raised when an event cannot be folded onto the current state.
    type ReplayError: std::error::Error + Send + Sync + 'static;

    /// Name used in logs and corruption reports.
    const AGGREGATE_TYPE: &'static str;

    /// Empty state for a fresh aggregate.
    fn new(id: Self::Id) -> Self;

    /// Aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Fold one event. Must be deterministic and free of side effects.
    fn apply(self, event: &Self::Event) -> Result<Self, Self::ReplayError>;

    /// Rebuild the state from scratch.
    fn replay<'a, I>(id: Self::Id, events: I) -> Result<Self, Self::ReplayError>
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        events
            .into_iter()
            .try_fold(Self::new(id), |state, event| state.apply(event))
    }
}

/// Intent delivered to a command processor.
pub trait Command: fmt::Debug + Send + Sync + 'static {
    /// Token identifying the logical command across retries.
    fn idempotence_id(&self) -> IdempotenceId;

    /// Command name for logs and metrics.
    fn name(&self) -> &'static str;
}

/// Validates commands against aggregate state.
///
/// Implementations are written as if always called fresh; the store handles
/// deduplication and serialization.
#[async_trait]
pub trait CommandProcessor: Send + Sync + 'static {
    type Aggregate: Aggregate;
    type Command: Command;
    /// Structured rejection returned instead of events.
    type Rejection: Clone + fmt::Debug + Send + Sync + 'static;

    /// Produce a non-empty event sequence or a rejection, never both.
    async fn process(
        &self,
        command: &Self::Command,
        state: &Self::Aggregate,
    ) -> Result<Vec<<Self::Aggregate as Aggregate>::Event>, Self::Rejection>;
}
