//! Facts recorded in a round's log.

use crate::domain::{CredentialsResponse, OwnershipProof, RoundParameters};
use serde::{Deserialize, Serialize};
use shared_types::{AliceId, Amount, Coin, OutPoint, TxOut, Witness};
use std::collections::BTreeSet;

/// How a round finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundOutcome {
    Succeeded,
    Aborted,
}

impl RoundOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RoundOutcome::Succeeded => "succeeded",
            RoundOutcome::Aborted => "aborted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundEvent {
    RoundStarted {
        parameters: RoundParameters,
    },
    AllInputsAllowed,
    SpecificInputsAllowed {
        outpoints: BTreeSet<OutPoint>,
    },
    InputRegistered {
        alice_id: AliceId,
        coin: Coin,
        ownership_proof: OwnershipProof,
        /// Unix milliseconds by which the connection must be confirmed.
        deadline: u64,
        amount_credential_value: Amount,
        vsize_credential_value: u64,
    },
    CredentialsIssued {
        alice_id: AliceId,
        amount_credentials: CredentialsResponse,
        vsize_credentials: CredentialsResponse,
    },
    InputUnregistered {
        alice_id: AliceId,
        outpoint: OutPoint,
    },
    InputConnectionConfirmationStarted,
    InputConnectionConfirmed {
        alice_id: AliceId,
        coin: Coin,
        ownership_proof: OwnershipProof,
    },
    OutputRegistrationStarted,
    OutputRegistered {
        output: TxOut,
    },
    SigningStarted,
    InputReadyToSign {
        alice_id: AliceId,
    },
    SignatureAdded {
        outpoint: OutPoint,
        witness: Witness,
    },
    RoundSucceeded,
    RoundEnded {
        outcome: RoundOutcome,
    },
}

impl RoundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoundEvent::RoundStarted { .. } => "RoundStarted",
            RoundEvent::AllInputsAllowed => "AllInputsAllowed",
            RoundEvent::SpecificInputsAllowed { .. } => "SpecificInputsAllowed",
            RoundEvent::InputRegistered { .. } => "InputRegistered",
            RoundEvent::CredentialsIssued { .. } => "CredentialsIssued",
            RoundEvent::InputUnregistered { .. } => "InputUnregistered",
            RoundEvent::InputConnectionConfirmationStarted => "InputConnectionConfirmationStarted",
            RoundEvent::InputConnectionConfirmed { .. } => "InputConnectionConfirmed",
            RoundEvent::OutputRegistrationStarted => "OutputRegistrationStarted",
            RoundEvent::OutputRegistered { .. } => "OutputRegistered",
            RoundEvent::SigningStarted => "SigningStarted",
            RoundEvent::InputReadyToSign { .. } => "InputReadyToSign",
            RoundEvent::SignatureAdded { .. } => "SignatureAdded",
            RoundEvent::RoundSucceeded => "RoundSucceeded",
            RoundEvent::RoundEnded { .. } => "RoundEnded",
        }
    }

    /// Whether participants need to see this event to make progress.
    ///
    /// Registration details, credential issuance and withdrawals stay
    /// internal: exposing them would link participants to their coins.
    pub fn is_client_visible(&self) -> bool {
        matches!(
            self,
            RoundEvent::RoundStarted { .. }
                | RoundEvent::InputConnectionConfirmationStarted
                | RoundEvent::InputConnectionConfirmed { .. }
                | RoundEvent::OutputRegistrationStarted
                | RoundEvent::OutputRegistered { .. }
                | RoundEvent::SigningStarted
                | RoundEvent::SignatureAdded { .. }
                | RoundEvent::RoundSucceeded
                | RoundEvent::RoundEnded { .. }
        )
    }
}
