//! Request and response types of the participant-facing surface.
//!
//! Transport encoding is left to the embedding server; every type derives
//! serde so that any format can carry it.

use serde::{Deserialize, Serialize};
use shared_types::{AliceId, Amount, OutPoint, RoundId, ScriptPubKey, Witness};
use std::collections::BTreeSet;
use ws_01_round::{
    CredentialsRequest, CredentialsResponse, OwnershipProof, Phase, RoundEvent, RoundOutcome,
    RoundParameters, RoundState,
};
use ws_02_event_store::StoredEvent;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRoundRequest {
    /// `None` uses the configured defaults
    pub parameters: Option<RoundParameters>,
    /// `None` admits every input
    pub allowed_inputs: Option<BTreeSet<OutPoint>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRoundResponse {
    pub round_id: RoundId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRegistrationRequest {
    pub round_id: RoundId,
    pub input: OutPoint,
    pub ownership_proof: OwnershipProof,
    pub zero_amount_credential_requests: CredentialsRequest,
    pub zero_vsize_credential_requests: CredentialsRequest,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRegistrationResponse {
    /// Participant secret; required by every later request about this input
    pub alice_id: AliceId,
    pub amount_credentials: CredentialsResponse,
    pub vsize_credentials: CredentialsResponse,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfirmationRequest {
    pub round_id: RoundId,
    pub alice_id: AliceId,
    pub input: OutPoint,
    pub ownership_proof: OwnershipProof,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRegistrationRequest {
    pub round_id: RoundId,
    pub script_pubkey: ScriptPubKey,
    pub value: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyToSignRequest {
    pub round_id: RoundId,
    pub alice_id: AliceId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignatureRequest {
    pub round_id: RoundId,
    pub input: OutPoint,
    pub witness: Witness,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputsRemovalRequest {
    pub round_id: RoundId,
    pub alice_id: AliceId,
}

/// Snapshot of a round for status polling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStatus {
    pub round_id: RoundId,
    pub phase: Phase,
    pub parameters: RoundParameters,
    pub input_count: usize,
    pub confirmed_input_count: usize,
    pub ready_to_sign_count: usize,
    pub output_count: usize,
    pub signature_count: usize,
    pub remaining_vsize_allocation: u64,
    pub remaining_amount_allocation: Amount,
    pub estimated_vsize: u64,
    pub outcome: Option<RoundOutcome>,
    /// Client-visible events in log order
    pub events: Vec<StoredEvent<RoundEvent>>,
}

impl RoundStatus {
    pub fn new(state: &RoundState, log: &[StoredEvent<RoundEvent>]) -> Self {
        let signature_count = state
            .transaction
            .as_signing()
            .map(|signing| signing.witnesses.len())
            .unwrap_or(0);
        Self {
            round_id: state.id,
            phase: state.phase,
            parameters: state.parameters.clone(),
            input_count: state.inputs.len(),
            confirmed_input_count: state.inputs.values().filter(|i| i.confirmed).count(),
            ready_to_sign_count: state.inputs.values().filter(|i| i.ready_to_sign).count(),
            output_count: state.registered_outputs().len(),
            signature_count,
            remaining_vsize_allocation: state.remaining_vsize_allocation,
            remaining_amount_allocation: state.remaining_amount_allocation,
            estimated_vsize: state.transaction.estimated_vsize(),
            outcome: state.outcome,
            events: log
                .iter()
                .filter(|stored| stored.event.is_client_visible())
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::IdempotenceId;
    use ws_01_round::test_utils::{started_round, TEST_ROUND_ID};

    #[test]
    fn test_status_hides_internal_events() {
        let state = started_round(None);
        let token = IdempotenceId::new(shared_types::Uuid::nil());
        let log = vec![
            StoredEvent {
                sequence: 1,
                idempotence_id: token,
                event: RoundEvent::RoundStarted {
                    parameters: RoundParameters::default(),
                },
            },
            StoredEvent {
                sequence: 2,
                idempotence_id: token,
                event: RoundEvent::AllInputsAllowed,
            },
        ];
        let status = RoundStatus::new(&state, &log);
        assert_eq!(status.round_id, TEST_ROUND_ID);
        assert_eq!(status.phase, Phase::InputRegistration);
        assert_eq!(status.events.len(), 1);
        assert_eq!(status.events[0].sequence, 1);
        assert_eq!(status.input_count, 0);
        assert_eq!(status.remaining_vsize_allocation, 99_989);
    }

    #[test]
    fn test_start_round_request_defaults_from_json() {
        let request: StartRoundRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, StartRoundRequest::default());
    }
}
