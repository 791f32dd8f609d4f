//! # In-Memory Event Store
//!
//! Keeps every aggregate's log, materialized state and idempotency cache in
//! process memory.
//!
//! Each aggregate lives in its own slot guarded by a `tokio::sync::Mutex`.
//! The guard is held across the processor's suspension points, which is what
//! serializes writers of one aggregate while leaving other aggregates free.
//! The slot map itself sits behind a `parking_lot::Mutex` that is only held
//! for the lookup.

use crate::domain::{Aggregate, Command, CommandOutcome, CommandProcessor, StoredEvent};
use crate::error::EventStoreError;
use crate::ports::{AggregateId, EventOf, EventStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::IdempotenceId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Per-aggregate storage.
struct AggregateSlot<A: Aggregate> {
    state: A,
    log: Vec<StoredEvent<A::Event>>,
    /// Committed results by token. Rejections are never recorded.
    processed: HashMap<IdempotenceId, Vec<StoredEvent<A::Event>>>,
}

impl<A: Aggregate> AggregateSlot<A> {
    fn new(id: A::Id) -> Self {
        Self {
            state: A::new(id),
            log: Vec::new(),
            processed: HashMap::new(),
        }
    }
}

type SharedSlot<A> = Arc<tokio::sync::Mutex<AggregateSlot<A>>>;

/// In-memory [`EventStore`] bound to one command processor.
pub struct InMemoryEventStore<P: CommandProcessor> {
    processor: Arc<P>,
    slots: Mutex<HashMap<AggregateId<P>, SharedSlot<P::Aggregate>>>,
    commands_committed: AtomicU64,
    replays_served: AtomicU64,
}

impl<P: CommandProcessor> InMemoryEventStore<P> {
    /// Create a store that runs commands through `processor`.
    #[must_use]
    pub fn new(processor: Arc<P>) -> Self {
        Self {
            processor,
            slots: Mutex::new(HashMap::new()),
            commands_committed: AtomicU64::new(0),
            replays_served: AtomicU64::new(0),
        }
    }

    /// The processor commands are run through.
    pub fn processor(&self) -> &Arc<P> {
        &self.processor
    }

    /// Ids of every aggregate with at least one slot.
    pub fn aggregate_ids(&self) -> Vec<AggregateId<P>> {
        self.slots.lock().keys().cloned().collect()
    }

    /// Number of commands whose events were committed.
    pub fn commands_committed(&self) -> u64 {
        self.commands_committed.load(Ordering::Relaxed)
    }

    /// Number of commands answered from the idempotency cache.
    pub fn replays_served(&self) -> u64 {
        self.replays_served.load(Ordering::Relaxed)
    }

    /// Install a previously persisted log for an aggregate.
    ///
    /// The log is replayed from empty before anything is installed, and the
    /// idempotency cache is rebuilt from the recorded tokens. Fails without
    /// side effects if the log does not fold.
    pub async fn restore(
        &self,
        aggregate_id: &AggregateId<P>,
        log: Vec<StoredEvent<EventOf<P>>>,
    ) -> Result<P::Aggregate, EventStoreError<P::Rejection>> {
        let state = fold_log::<P>(aggregate_id, &log)?;

        let mut processed: HashMap<IdempotenceId, Vec<StoredEvent<EventOf<P>>>> = HashMap::new();
        for stored in &log {
            processed
                .entry(stored.idempotence_id)
                .or_default()
                .push(stored.clone());
        }

        let slot = self.slot(aggregate_id);
        let mut guard = slot.lock().await;
        guard.state = state.clone();
        guard.log = log;
        guard.processed = processed;

        debug!(
            aggregate_type = P::Aggregate::AGGREGATE_TYPE,
            aggregate_id = %aggregate_id,
            events = guard.log.len(),
            "Aggregate restored"
        );
        Ok(state)
    }

    fn slot(&self, aggregate_id: &AggregateId<P>) -> SharedSlot<P::Aggregate> {
        self.slots
            .lock()
            .entry(aggregate_id.clone())
            .or_insert_with(|| {
                Arc::new(tokio::sync::Mutex::new(AggregateSlot::new(
                    aggregate_id.clone(),
                )))
            })
            .clone()
    }

    fn existing_slot(&self, aggregate_id: &AggregateId<P>) -> Option<SharedSlot<P::Aggregate>> {
        self.slots.lock().get(aggregate_id).cloned()
    }
}

/// Replay a log from empty, reporting the first event that does not fold.
fn fold_log<P: CommandProcessor>(
    aggregate_id: &AggregateId<P>,
    log: &[StoredEvent<EventOf<P>>],
) -> Result<P::Aggregate, EventStoreError<P::Rejection>> {
    let mut state = P::Aggregate::new(aggregate_id.clone());
    for stored in log {
        state = state.apply(&stored.event).map_err(|e| {
            error!(
                aggregate_type = P::Aggregate::AGGREGATE_TYPE,
                aggregate_id = %aggregate_id,
                sequence = stored.sequence,
                error = %e,
                "Event log does not replay"
            );
            EventStoreError::CorruptedLog {
                aggregate_type: P::Aggregate::AGGREGATE_TYPE,
                aggregate_id: aggregate_id.to_string(),
                sequence: stored.sequence,
                reason: e.to_string(),
            }
        })?;
    }
    Ok(state)
}

#[async_trait]
impl<P: CommandProcessor> EventStore<P> for InMemoryEventStore<P> {
    async fn process_command(
        &self,
        command: P::Command,
        aggregate_id: &AggregateId<P>,
    ) -> Result<CommandOutcome<P::Aggregate>, EventStoreError<P::Rejection>> {
        let token = command.idempotence_id();
        let slot = self.slot(aggregate_id);
        let mut guard = slot.lock().await;

        if let Some(committed) = guard.processed.get(&token) {
            self.replays_served.fetch_add(1, Ordering::Relaxed);
            debug!(
                aggregate_id = %aggregate_id,
                command = command.name(),
                idempotence_id = %token,
                "Replaying committed result"
            );
            return Ok(CommandOutcome {
                new_events: committed.clone(),
                state: guard.state.clone(),
                replayed: true,
            });
        }

        let events = self
            .processor
            .process(&command, &guard.state)
            .await
            .map_err(EventStoreError::Rejected)?;

        // Fold onto a working copy first so a bad event leaves nothing behind.
        let mut next = guard.state.clone();
        for event in &events {
            next = match next.apply(event) {
                Ok(state) => state,
                Err(e) => panic!(
                    "{} {} cannot apply {:?} produced by {}: {}",
                    P::Aggregate::AGGREGATE_TYPE,
                    aggregate_id,
                    event,
                    command.name(),
                    e
                ),
            };
        }

        let base = guard.log.len() as u64;
        let stored: Vec<StoredEvent<EventOf<P>>> = events
            .into_iter()
            .enumerate()
            .map(|(offset, event)| StoredEvent {
                sequence: base + offset as u64 + 1,
                idempotence_id: token,
                event,
            })
            .collect();

        guard.log.extend(stored.iter().cloned());
        guard.state = next;
        guard.processed.insert(token, stored.clone());
        self.commands_committed.fetch_add(1, Ordering::Relaxed);

        debug!(
            aggregate_id = %aggregate_id,
            command = command.name(),
            events = stored.len(),
            "Command committed"
        );

        Ok(CommandOutcome {
            new_events: stored,
            state: guard.state.clone(),
            replayed: false,
        })
    }

    async fn load(&self, aggregate_id: &AggregateId<P>) -> P::Aggregate {
        match self.existing_slot(aggregate_id) {
            Some(slot) => slot.lock().await.state.clone(),
            None => P::Aggregate::new(aggregate_id.clone()),
        }
    }

    async fn events(&self, aggregate_id: &AggregateId<P>) -> Vec<StoredEvent<EventOf<P>>> {
        match self.existing_slot(aggregate_id) {
            Some(slot) => slot.lock().await.log.clone(),
            None => Vec::new(),
        }
    }

    async fn rebuild(
        &self,
        aggregate_id: &AggregateId<P>,
    ) -> Result<P::Aggregate, EventStoreError<P::Rejection>> {
        let log = self.events(aggregate_id).await;
        fold_log::<P>(aggregate_id, &log)
    }
}
