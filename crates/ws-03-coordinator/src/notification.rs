//! Client-visible round events as published on the bus.

use serde::{Deserialize, Serialize};
use shared_bus::{BusEvent, EventTopic};
use shared_types::RoundId;
use ws_01_round::RoundEvent;
use ws_02_event_store::StoredEvent;

/// A committed, client-visible event of one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundNotification {
    pub round_id: RoundId,
    /// Position of the event in the round's log
    pub sequence: u64,
    pub event: RoundEvent,
}

impl RoundNotification {
    /// `None` for internal bookkeeping events.
    pub fn from_stored(round_id: RoundId, stored: &StoredEvent<RoundEvent>) -> Option<Self> {
        stored.event.is_client_visible().then(|| Self {
            round_id,
            sequence: stored.sequence,
            event: stored.event.clone(),
        })
    }
}

impl BusEvent for RoundNotification {
    fn topic(&self) -> EventTopic {
        match &self.event {
            RoundEvent::InputRegistered { .. }
            | RoundEvent::CredentialsIssued { .. }
            | RoundEvent::InputUnregistered { .. }
            | RoundEvent::InputConnectionConfirmed { .. }
            | RoundEvent::AllInputsAllowed
            | RoundEvent::SpecificInputsAllowed { .. } => EventTopic::Inputs,
            RoundEvent::OutputRegistered { .. } => EventTopic::Outputs,
            RoundEvent::InputReadyToSign { .. } | RoundEvent::SignatureAdded { .. } => {
                EventTopic::Signatures
            }
            RoundEvent::RoundStarted { .. }
            | RoundEvent::InputConnectionConfirmationStarted
            | RoundEvent::OutputRegistrationStarted
            | RoundEvent::SigningStarted
            | RoundEvent::RoundSucceeded
            | RoundEvent::RoundEnded { .. } => EventTopic::RoundLifecycle,
        }
    }

    fn round_id(&self) -> RoundId {
        self.round_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::IdempotenceId;
    use ws_01_round::RoundOutcome;

    fn stored(sequence: u64, event: RoundEvent) -> StoredEvent<RoundEvent> {
        StoredEvent {
            sequence,
            idempotence_id: IdempotenceId::new(shared_types::Uuid::nil()),
            event,
        }
    }

    #[test]
    fn test_internal_events_are_not_published() {
        let round_id = RoundId([1; 32]);
        let internal = stored(2, RoundEvent::AllInputsAllowed);
        assert!(RoundNotification::from_stored(round_id, &internal).is_none());
    }

    #[test]
    fn test_topics() {
        let round_id = RoundId([1; 32]);
        let ended = RoundNotification::from_stored(
            round_id,
            &stored(
                9,
                RoundEvent::RoundEnded {
                    outcome: RoundOutcome::Aborted,
                },
            ),
        )
        .unwrap();
        assert_eq!(ended.topic(), EventTopic::RoundLifecycle);
        assert_eq!(ended.sequence, 9);
        assert_eq!(ended.round_id(), round_id);

        let signing =
            RoundNotification::from_stored(round_id, &stored(5, RoundEvent::SigningStarted))
                .unwrap();
        assert_eq!(signing.topic(), EventTopic::RoundLifecycle);
    }
}
