//! Commands accepted by the round aggregate.
//!
//! Every command carries an [`IdempotenceId`]. Constructors derive it from
//! the command's semantic content so that byte-identical retries collapse
//! onto one committed result; [`RoundCommand::with_idempotence_id`] lets a
//! caller that has its own token override it.

use crate::domain::{CredentialsRequest, OwnershipProof, RoundParameters};
use shared_types::{AliceId, Coin, ContentHasher, IdempotenceId, OutPoint, TxOut, Witness};
use std::collections::BTreeSet;
use ws_02_event_store::Command;

#[derive(Clone, Debug)]
pub enum RoundCommand {
    StartRound {
        parameters: RoundParameters,
        /// `None` allows every input.
        allowed_inputs: Option<BTreeSet<OutPoint>>,
        idempotence_id: IdempotenceId,
    },
    RegisterInput {
        coin: Coin,
        ownership_proof: OwnershipProof,
        /// Freshly generated participant secret; not part of the token.
        alice_id: AliceId,
        zero_amount_credential_requests: CredentialsRequest,
        zero_vsize_credential_requests: CredentialsRequest,
        /// Unix milliseconds; not part of the token.
        received_at: u64,
        idempotence_id: IdempotenceId,
    },
    ConfirmInputConnection {
        alice_id: AliceId,
        coin: Coin,
        ownership_proof: OwnershipProof,
        idempotence_id: IdempotenceId,
    },
    RemoveInput {
        alice_id: AliceId,
        idempotence_id: IdempotenceId,
    },
    RegisterOutput {
        output: TxOut,
        idempotence_id: IdempotenceId,
    },
    StartConnectionConfirmation {
        idempotence_id: IdempotenceId,
    },
    StartOutputRegistration {
        idempotence_id: IdempotenceId,
    },
    StartTransactionSigning {
        idempotence_id: IdempotenceId,
    },
    SucceedRound {
        idempotence_id: IdempotenceId,
    },
    NotifyInputReadyToSign {
        alice_id: AliceId,
        idempotence_id: IdempotenceId,
    },
    AddSignature {
        outpoint: OutPoint,
        witness: Witness,
        idempotence_id: IdempotenceId,
    },
    EndRound {
        idempotence_id: IdempotenceId,
    },
}

impl RoundCommand {
    pub fn start_round(
        parameters: RoundParameters,
        allowed_inputs: Option<BTreeSet<OutPoint>>,
    ) -> Self {
        let mut hasher = ContentHasher::new("StartRound").field(&parameters);
        hasher = match &allowed_inputs {
            None => hasher.bool(false),
            Some(set) => set
                .iter()
                .fold(hasher.bool(true).u64(set.len() as u64), |h, o| h.field(o)),
        };
        RoundCommand::StartRound {
            parameters,
            allowed_inputs,
            idempotence_id: hasher.finish(),
        }
    }

    pub fn register_input(
        coin: Coin,
        ownership_proof: OwnershipProof,
        alice_id: AliceId,
        zero_amount_credential_requests: CredentialsRequest,
        zero_vsize_credential_requests: CredentialsRequest,
        received_at: u64,
    ) -> Self {
        let idempotence_id = ContentHasher::new("RegisterInput")
            .field(&coin)
            .field(&ownership_proof)
            .field(&zero_amount_credential_requests)
            .field(&zero_vsize_credential_requests)
            .finish();
        RoundCommand::RegisterInput {
            coin,
            ownership_proof,
            alice_id,
            zero_amount_credential_requests,
            zero_vsize_credential_requests,
            received_at,
            idempotence_id,
        }
    }

    pub fn confirm_input_connection(
        alice_id: AliceId,
        coin: Coin,
        ownership_proof: OwnershipProof,
    ) -> Self {
        let idempotence_id = ContentHasher::new("ConfirmInputConnection")
            .field(&alice_id)
            .field(&coin)
            .field(&ownership_proof)
            .finish();
        RoundCommand::ConfirmInputConnection {
            alice_id,
            coin,
            ownership_proof,
            idempotence_id,
        }
    }

    pub fn remove_input(alice_id: AliceId) -> Self {
        RoundCommand::RemoveInput {
            idempotence_id: ContentHasher::new("RemoveInput").field(&alice_id).finish(),
            alice_id,
        }
    }

    pub fn register_output(output: TxOut) -> Self {
        RoundCommand::RegisterOutput {
            idempotence_id: ContentHasher::new("RegisterOutput").field(&output).finish(),
            output,
        }
    }

    pub fn start_connection_confirmation() -> Self {
        RoundCommand::StartConnectionConfirmation {
            idempotence_id: ContentHasher::new("StartConnectionConfirmation").finish(),
        }
    }

    pub fn start_output_registration() -> Self {
        RoundCommand::StartOutputRegistration {
            idempotence_id: ContentHasher::new("StartOutputRegistration").finish(),
        }
    }

    pub fn start_transaction_signing() -> Self {
        RoundCommand::StartTransactionSigning {
            idempotence_id: ContentHasher::new("StartTransactionSigning").finish(),
        }
    }

    pub fn succeed_round() -> Self {
        RoundCommand::SucceedRound {
            idempotence_id: ContentHasher::new("SucceedRound").finish(),
        }
    }

    pub fn notify_input_ready_to_sign(alice_id: AliceId) -> Self {
        RoundCommand::NotifyInputReadyToSign {
            idempotence_id: ContentHasher::new("NotifyInputReadyToSign")
                .field(&alice_id)
                .finish(),
            alice_id,
        }
    }

    pub fn add_signature(outpoint: OutPoint, witness: Witness) -> Self {
        RoundCommand::AddSignature {
            idempotence_id: ContentHasher::new("AddSignature")
                .field(&outpoint)
                .field(&witness)
                .finish(),
            outpoint,
            witness,
        }
    }

    pub fn end_round() -> Self {
        RoundCommand::EndRound {
            idempotence_id: ContentHasher::new("EndRound").finish(),
        }
    }

    /// Replace the content-derived token with a caller-supplied one.
    #[must_use]
    pub fn with_idempotence_id(mut self, id: IdempotenceId) -> Self {
        *self.idempotence_id_mut() = id;
        self
    }

    fn idempotence_id_mut(&mut self) -> &mut IdempotenceId {
        match self {
            RoundCommand::StartRound { idempotence_id, .. }
            | RoundCommand::RegisterInput { idempotence_id, .. }
            | RoundCommand::ConfirmInputConnection { idempotence_id, .. }
            | RoundCommand::RemoveInput { idempotence_id, .. }
            | RoundCommand::RegisterOutput { idempotence_id, .. }
            | RoundCommand::StartConnectionConfirmation { idempotence_id }
            | RoundCommand::StartOutputRegistration { idempotence_id }
            | RoundCommand::StartTransactionSigning { idempotence_id }
            | RoundCommand::SucceedRound { idempotence_id }
            | RoundCommand::NotifyInputReadyToSign { idempotence_id, .. }
            | RoundCommand::AddSignature { idempotence_id, .. }
            | RoundCommand::EndRound { idempotence_id } => idempotence_id,
        }
    }
}

impl Command for RoundCommand {
    fn idempotence_id(&self) -> IdempotenceId {
        match self {
            RoundCommand::StartRound { idempotence_id, .. }
            | RoundCommand::RegisterInput { idempotence_id, .. }
            | RoundCommand::ConfirmInputConnection { idempotence_id, .. }
            | RoundCommand::RemoveInput { idempotence_id, .. }
            | RoundCommand::RegisterOutput { idempotence_id, .. }
            | RoundCommand::StartConnectionConfirmation { idempotence_id }
            | RoundCommand::StartOutputRegistration { idempotence_id }
            | RoundCommand::StartTransactionSigning { idempotence_id }
            | RoundCommand::SucceedRound { idempotence_id }
            | RoundCommand::NotifyInputReadyToSign { idempotence_id, .. }
            | RoundCommand::AddSignature { idempotence_id, .. }
            | RoundCommand::EndRound { idempotence_id } => *idempotence_id,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RoundCommand::StartRound { .. } => "StartRound",
            RoundCommand::RegisterInput { .. } => "RegisterInput",
            RoundCommand::ConfirmInputConnection { .. } => "ConfirmInputConnection",
            RoundCommand::RemoveInput { .. } => "RemoveInput",
            RoundCommand::RegisterOutput { .. } => "RegisterOutput",
            RoundCommand::StartConnectionConfirmation { .. } => "StartConnectionConfirmation",
            RoundCommand::StartOutputRegistration { .. } => "StartOutputRegistration",
            RoundCommand::StartTransactionSigning { .. } => "StartTransactionSigning",
            RoundCommand::SucceedRound { .. } => "SucceedRound",
            RoundCommand::NotifyInputReadyToSign { .. } => "NotifyInputReadyToSign",
            RoundCommand::AddSignature { .. } => "AddSignature",
            RoundCommand::EndRound { .. } => "EndRound",
        }
    }
}
