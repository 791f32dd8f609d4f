//! # Round Command Processor
//!
//! `(RoundCommand, RoundState) → Result<Vec<RoundEvent>, Vec<RoundError>>`
//!
//! One rule per command, selected by an exhaustive match. Every check runs
//! before any event is built, so a command either yields its full event
//! sequence or only errors. The processor keeps no state of its own; the
//! event store serializes calls per round and deduplicates retries.
//!
//! ## Input Registration
//!
//! ```text
//! phase ─► whitelist ─► construction rules ─► ownership proof ─► quotas ─► request shape
//!   │          │                 └──────────────┬───────────────────┘           │
//!   │          │                          (errors collected)                    │
//!   ▼          ▼                                                                ▼
//! PhaseMismatch  InputNotWhitelisted                        try_join!(amount issuer, vsize issuer)
//!                                                                               │
//!                                                           InputRegistered + CredentialsIssued
//! ```

use crate::commands::RoundCommand;
use crate::domain::{
    CredentialKind, CredentialsRequest, OwnershipProof, Phase, RoundParameters, RoundState,
};
use crate::error::{ProcessResult, RoundError};
use crate::events::{RoundEvent, RoundOutcome};
use crate::ports::CredentialIssuer;
use async_trait::async_trait;
use shared_crypto::hash160;
use shared_types::{AliceId, Coin, OutPoint, ScriptType, TxOut, Witness};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};
use ws_02_event_store::{Command, CommandProcessor};

/// Validates round commands and turns them into events.
pub struct RoundCommandProcessor {
    amount_issuer: Arc<dyn CredentialIssuer>,
    vsize_issuer: Arc<dyn CredentialIssuer>,
}

impl RoundCommandProcessor {
    pub fn new(
        amount_issuer: Arc<dyn CredentialIssuer>,
        vsize_issuer: Arc<dyn CredentialIssuer>,
    ) -> Self {
        Self {
            amount_issuer,
            vsize_issuer,
        }
    }

    /// Handle one command against the current state.
    pub async fn handle(&self, command: &RoundCommand, state: &RoundState) -> ProcessResult {
        match command {
            RoundCommand::StartRound {
                parameters,
                allowed_inputs,
                ..
            } => start_round(command, state, parameters, allowed_inputs.as_ref()),
            RoundCommand::RegisterInput {
                coin,
                ownership_proof,
                alice_id,
                zero_amount_credential_requests,
                zero_vsize_credential_requests,
                received_at,
                ..
            } => {
                self.register_input(
                    command,
                    state,
                    Registration {
                        coin,
                        ownership_proof,
                        alice_id: *alice_id,
                        amount_request: zero_amount_credential_requests,
                        vsize_request: zero_vsize_credential_requests,
                        received_at: *received_at,
                    },
                )
                .await
            }
            RoundCommand::ConfirmInputConnection {
                alice_id,
                coin,
                ownership_proof,
                ..
            } => confirm_input_connection(command, state, *alice_id, coin, ownership_proof),
            RoundCommand::RemoveInput { alice_id, .. } => remove_input(command, state, *alice_id),
            RoundCommand::RegisterOutput { output, .. } => register_output(command, state, output),
            RoundCommand::StartConnectionConfirmation { .. } => {
                require_phase(command, state, &[Phase::InputRegistration])?;
                Ok(vec![RoundEvent::InputConnectionConfirmationStarted])
            }
            RoundCommand::StartOutputRegistration { .. } => {
                start_output_registration(command, state)
            }
            RoundCommand::StartTransactionSigning { .. } => {
                require_phase(command, state, &[Phase::OutputRegistration])?;
                Ok(vec![RoundEvent::SigningStarted])
            }
            RoundCommand::SucceedRound { .. } => succeed_round(command, state),
            RoundCommand::NotifyInputReadyToSign { alice_id, .. } => {
                notify_input_ready_to_sign(command, state, *alice_id)
            }
            RoundCommand::AddSignature {
                outpoint, witness, ..
            } => add_signature(command, state, outpoint, witness),
            RoundCommand::EndRound { .. } => Ok(vec![RoundEvent::RoundEnded {
                outcome: end_outcome(state),
            }]),
        }
    }

    async fn register_input(
        &self,
        command: &RoundCommand,
        state: &RoundState,
        registration: Registration<'_>,
    ) -> ProcessResult {
        require_phase(command, state, &[Phase::InputRegistration])?;
        let Registration {
            coin,
            ownership_proof,
            alice_id,
            amount_request,
            vsize_request,
            received_at,
        } = registration;
        let params = &state.parameters;

        if !state.allowed_inputs.contains(&coin.outpoint) {
            return Err(vec![RoundError::InputNotWhitelisted(coin.outpoint)]);
        }

        let mut errors = Vec::new();
        if state.inputs.contains_key(&alice_id) {
            errors.push(RoundError::AliceIdCollision);
        }

        match state.transaction.as_construction() {
            Some(construction) => errors.extend(construction.validate_input(params, coin)),
            None => errors.push(phase_mismatch(command, state, &[Phase::InputRegistration])),
        }

        if ownership_proof
            .verify(coin.script_pubkey(), &state.commitment_data())
            .is_err()
        {
            errors.push(RoundError::WrongOwnershipProof);
        }

        let input_vsize = coin.input_vsize();
        if params.max_vsize_allocation_per_alice > state.remaining_vsize_allocation {
            errors.push(RoundError::VsizeQuotaExceeded {
                requested: params.max_vsize_allocation_per_alice,
                remaining: state.remaining_vsize_allocation,
            });
        }
        if coin.amount() > state.remaining_amount_allocation {
            errors.push(RoundError::AmountQuotaExceeded {
                requested: coin.amount(),
                remaining: state.remaining_amount_allocation,
            });
        }

        if !amount_request.is_zero_request(params.credential_count) {
            errors.push(RoundError::MalformedCredentialRequest(
                CredentialKind::Amount,
            ));
        }
        if !vsize_request.is_zero_request(params.credential_count) {
            errors.push(RoundError::MalformedCredentialRequest(CredentialKind::Vsize));
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        let (Some(vsize), Some(script_type)) = (input_vsize, coin.script_type()) else {
            return Err(vec![RoundError::ScriptNotAllowed]);
        };

        let (amount_credentials, vsize_credentials) = tokio::try_join!(
            self.issue(CredentialKind::Amount, amount_request),
            self.issue(CredentialKind::Vsize, vsize_request),
        )
        .map_err(|e| vec![e])?;

        let deadline = received_at.saturating_add(duration_millis(
            params.connection_confirmation_timeout,
        ));

        Ok(vec![
            RoundEvent::InputRegistered {
                alice_id,
                coin: coin.clone(),
                ownership_proof: ownership_proof.clone(),
                deadline,
                amount_credential_value: coin
                    .amount()
                    .saturating_sub(params.input_fee(script_type)),
                vsize_credential_value: params
                    .max_vsize_allocation_per_alice
                    .saturating_sub(vsize),
            },
            RoundEvent::CredentialsIssued {
                alice_id,
                amount_credentials,
                vsize_credentials,
            },
        ])
    }

    async fn issue(
        &self,
        kind: CredentialKind,
        request: &CredentialsRequest,
    ) -> Result<crate::domain::CredentialsResponse, RoundError> {
        let issuer = match kind {
            CredentialKind::Amount => &self.amount_issuer,
            CredentialKind::Vsize => &self.vsize_issuer,
        };
        issuer.handle_request(request).await.map_err(|e| {
            warn!(%kind, error = %e, "Credential issuance failed");
            RoundError::CredentialIssuanceFailed {
                kind,
                reason: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl CommandProcessor for RoundCommandProcessor {
    type Aggregate = RoundState;
    type Command = RoundCommand;
    type Rejection = Vec<RoundError>;

    async fn process(
        &self,
        command: &RoundCommand,
        state: &RoundState,
    ) -> Result<Vec<RoundEvent>, Vec<RoundError>> {
        let result = self.handle(command, state).await;
        match &result {
            Ok(events) => debug!(
                round_id = %state.id,
                command = command.name(),
                phase = %state.phase,
                events = events.len(),
                "Command accepted"
            ),
            Err(errors) => debug!(
                round_id = %state.id,
                command = command.name(),
                phase = %state.phase,
                ?errors,
                "Command rejected"
            ),
        }
        result
    }
}

// =============================================================================
// RULES
// =============================================================================

struct Registration<'a> {
    coin: &'a Coin,
    ownership_proof: &'a OwnershipProof,
    alice_id: AliceId,
    amount_request: &'a CredentialsRequest,
    vsize_request: &'a CredentialsRequest,
    received_at: u64,
}

fn phase_mismatch(command: &RoundCommand, state: &RoundState, expected: &[Phase]) -> RoundError {
    RoundError::PhaseMismatch {
        command: command.name(),
        expected: expected.to_vec(),
        actual: state.phase,
    }
}

fn require_phase(
    command: &RoundCommand,
    state: &RoundState,
    expected: &[Phase],
) -> Result<(), Vec<RoundError>> {
    if expected.contains(&state.phase) {
        Ok(())
    } else {
        Err(vec![phase_mismatch(command, state, expected)])
    }
}

fn duration_millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn start_round(
    command: &RoundCommand,
    state: &RoundState,
    parameters: &RoundParameters,
    allowed_inputs: Option<&BTreeSet<OutPoint>>,
) -> ProcessResult {
    require_phase(command, state, &[Phase::New])?;
    parameters.validate().map_err(|e| vec![e])?;

    let allowed = match allowed_inputs {
        None => RoundEvent::AllInputsAllowed,
        Some(outpoints) => RoundEvent::SpecificInputsAllowed {
            outpoints: outpoints.clone(),
        },
    };
    Ok(vec![
        RoundEvent::RoundStarted {
            parameters: parameters.clone(),
        },
        allowed,
    ])
}

fn confirm_input_connection(
    command: &RoundCommand,
    state: &RoundState,
    alice_id: AliceId,
    coin: &Coin,
    ownership_proof: &OwnershipProof,
) -> ProcessResult {
    require_phase(command, state, &[Phase::ConnectionConfirmation])?;
    let input = state
        .alice(&alice_id)
        .ok_or_else(|| vec![RoundError::AliceNotFound(alice_id)])?;

    if input.confirmed {
        return Err(vec![RoundError::AliceAlreadyConfirmed(alice_id)]);
    }
    if input.coin != *coin || input.ownership_proof != *ownership_proof {
        return Err(vec![RoundError::CoinMismatch]);
    }

    Ok(vec![RoundEvent::InputConnectionConfirmed {
        alice_id,
        coin: coin.clone(),
        ownership_proof: ownership_proof.clone(),
    }])
}

fn remove_input(command: &RoundCommand, state: &RoundState, alice_id: AliceId) -> ProcessResult {
    require_phase(
        command,
        state,
        &[Phase::InputRegistration, Phase::ConnectionConfirmation],
    )?;
    let input = state
        .alice(&alice_id)
        .ok_or_else(|| vec![RoundError::AliceNotFound(alice_id)])?;

    Ok(vec![RoundEvent::InputUnregistered {
        alice_id,
        outpoint: input.coin.outpoint,
    }])
}

fn register_output(command: &RoundCommand, state: &RoundState, output: &TxOut) -> ProcessResult {
    require_phase(command, state, &[Phase::OutputRegistration])?;
    let construction = state
        .transaction
        .as_construction()
        .ok_or_else(|| vec![phase_mismatch(command, state, &[Phase::OutputRegistration])])?;

    let errors = construction.validate_output(&state.parameters, output);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(vec![RoundEvent::OutputRegistered {
        output: output.clone(),
    }])
}

/// Drops every unconfirmed alice before opening output registration.
fn start_output_registration(command: &RoundCommand, state: &RoundState) -> ProcessResult {
    require_phase(command, state, &[Phase::ConnectionConfirmation])?;

    let mut events: Vec<RoundEvent> = state
        .inputs
        .iter()
        .filter(|(_, input)| !input.confirmed)
        .map(|(alice_id, input)| RoundEvent::InputUnregistered {
            alice_id: *alice_id,
            outpoint: input.coin.outpoint,
        })
        .collect();
    events.push(RoundEvent::OutputRegistrationStarted);
    Ok(events)
}

fn succeed_round(command: &RoundCommand, state: &RoundState) -> ProcessResult {
    require_phase(command, state, &[Phase::Signing])?;
    // An empty transaction cannot be broadcast, so it never succeeds.
    if state.transaction.inputs().is_empty() {
        return Err(vec![RoundError::NoInputs]);
    }
    let missing = state
        .transaction
        .as_signing()
        .map(|s| s.missing_signatures())
        .unwrap_or(0);
    if missing > 0 {
        return Err(vec![RoundError::MissingSignatures { missing }]);
    }
    Ok(vec![
        RoundEvent::RoundSucceeded,
        RoundEvent::RoundEnded {
            outcome: RoundOutcome::Succeeded,
        },
    ])
}

fn notify_input_ready_to_sign(
    command: &RoundCommand,
    state: &RoundState,
    alice_id: AliceId,
) -> ProcessResult {
    require_phase(command, state, &[Phase::OutputRegistration, Phase::Signing])?;
    let input = state
        .alice(&alice_id)
        .ok_or_else(|| vec![RoundError::AliceNotFound(alice_id)])?;
    if input.ready_to_sign {
        return Err(vec![RoundError::AliceAlreadyReadyToSign(alice_id)]);
    }
    Ok(vec![RoundEvent::InputReadyToSign { alice_id }])
}

fn add_signature(
    command: &RoundCommand,
    state: &RoundState,
    outpoint: &OutPoint,
    witness: &Witness,
) -> ProcessResult {
    require_phase(command, state, &[Phase::Signing])?;
    let signing = state
        .transaction
        .as_signing()
        .ok_or_else(|| vec![phase_mismatch(command, state, &[Phase::Signing])])?;

    let coin = signing
        .input(outpoint)
        .ok_or_else(|| vec![RoundError::UnknownInput(*outpoint)])?;
    if signing.is_signed(outpoint) {
        return Err(vec![RoundError::WitnessAlreadyProvided(*outpoint)]);
    }
    check_witness_shape(coin, witness)
        .map_err(|reason| vec![RoundError::InvalidWitness(reason)])?;

    Ok(vec![RoundEvent::SignatureAdded {
        outpoint: *outpoint,
        witness: witness.clone(),
    }])
}

fn end_outcome(state: &RoundState) -> RoundOutcome {
    state.outcome.unwrap_or(match state.phase {
        Phase::Succeeded => RoundOutcome::Succeeded,
        _ => RoundOutcome::Aborted,
    })
}

/// Structural witness check. Signatures are not validated against a sighash.
fn check_witness_shape(coin: &Coin, witness: &Witness) -> Result<(), String> {
    match (coin.script_type(), witness.items()) {
        (Some(ScriptType::P2wpkh), [signature, public_key]) => {
            if !(64..=73).contains(&signature.len()) {
                return Err(format!("signature length {}", signature.len()));
            }
            if public_key.len() != 33 {
                return Err(format!("public key length {}", public_key.len()));
            }
            if coin.script_pubkey().witness_program() != Some(hash160(public_key).as_slice()) {
                return Err("public key does not match the script".to_string());
            }
            Ok(())
        }
        (Some(ScriptType::P2tr), [signature]) => match signature.len() {
            64 | 65 => Ok(()),
            n => Err(format!("signature length {n}")),
        },
        (Some(script_type), items) => Err(format!(
            "{script_type} witness with {} items",
            items.len()
        )),
        (None, _) => Err("non-standard input".to_string()),
    }
}
