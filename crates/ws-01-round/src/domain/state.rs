//! # Round State
//!
//! The round aggregate. Built only by folding [`RoundEvent`]s in log order;
//! [`RoundState::apply`] is the single place state changes.

use crate::domain::{
    commitment_data, MultipartyTransactionState, OwnershipProof, Phase, RoundParameters,
};
use crate::error::ReplayError;
use crate::events::{RoundEvent, RoundOutcome};
use shared_types::{AliceId, Amount, Coin, OutPoint, RoundId, TxOut};
use std::collections::{BTreeMap, BTreeSet};
use ws_02_event_store::Aggregate;

/// Outpoints a round accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowedInputs {
    All,
    Specific(BTreeSet<OutPoint>),
}

impl Default for AllowedInputs {
    fn default() -> Self {
        AllowedInputs::Specific(BTreeSet::new())
    }
}

impl AllowedInputs {
    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        match self {
            AllowedInputs::All => true,
            AllowedInputs::Specific(set) => set.contains(outpoint),
        }
    }
}

/// A registered input and everything recorded about it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredInput {
    pub coin: Coin,
    pub ownership_proof: OwnershipProof,
    /// Unix milliseconds by which the connection must be confirmed.
    pub deadline: u64,
    pub amount_credential_value: Amount,
    pub vsize_credential_value: u64,
    pub credentials_issued: bool,
    pub confirmed: bool,
    pub ready_to_sign: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundState {
    pub id: RoundId,
    pub phase: Phase,
    pub parameters: RoundParameters,
    pub allowed_inputs: AllowedInputs,
    pub inputs: BTreeMap<AliceId, RegisteredInput>,
    pub transaction: MultipartyTransactionState,
    pub remaining_vsize_allocation: u64,
    pub remaining_amount_allocation: Amount,
    pub outcome: Option<RoundOutcome>,
}

impl RoundState {
    pub fn alice(&self, alice_id: &AliceId) -> Option<&RegisteredInput> {
        self.inputs.get(alice_id)
    }

    pub fn alice_by_outpoint(&self, outpoint: &OutPoint) -> Option<(&AliceId, &RegisteredInput)> {
        self.inputs
            .iter()
            .find(|(_, input)| input.coin.outpoint == *outpoint)
    }

    pub fn registered_outputs(&self) -> &[TxOut] {
        self.transaction.outputs()
    }

    /// Bytes ownership proofs for this round must commit to.
    pub fn commitment_data(&self) -> Vec<u8> {
        commitment_data(&self.parameters.coordinator_identifier, &self.id)
    }

    pub fn is_ended(&self) -> bool {
        self.phase.is_terminal()
    }

    fn expect_phase(&self, event: &RoundEvent, allowed: &[Phase]) -> Result<(), ReplayError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(ReplayError::UnexpectedPhase {
                event: event.name(),
                phase: self.phase,
            })
        }
    }

    fn construction_mut(
        &mut self,
        event: &RoundEvent,
    ) -> Result<&mut crate::domain::ConstructionState, ReplayError> {
        match &mut self.transaction {
            MultipartyTransactionState::Construction(c) => Ok(c),
            MultipartyTransactionState::Signing(_) => Err(ReplayError::UnexpectedPhase {
                event: event.name(),
                phase: self.phase,
            }),
        }
    }

    fn alice_mut(&mut self, alice_id: &AliceId) -> Result<&mut RegisteredInput, ReplayError> {
        self.inputs
            .get_mut(alice_id)
            .ok_or(ReplayError::UnknownAlice(*alice_id))
    }
}

impl Aggregate for RoundState {
    type Id = RoundId;
    type Event = RoundEvent;
    type ReplayError = ReplayError;
    const AGGREGATE_TYPE: &'static str = "Round";

    fn new(id: RoundId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    fn id(&self) -> &RoundId {
        &self.id
    }

    fn apply(mut self, event: &RoundEvent) -> Result<Self, ReplayError> {
        use Phase::*;

        match event {
            RoundEvent::RoundStarted { parameters } => {
                self.expect_phase(event, &[New])?;
                self.phase = InputRegistration;
                self.remaining_vsize_allocation = parameters.initial_input_vsize_allocation;
                self.remaining_amount_allocation = parameters.max_total_input_amount;
                self.parameters = parameters.clone();
            }
            RoundEvent::AllInputsAllowed => {
                self.expect_phase(event, &[InputRegistration])?;
                self.allowed_inputs = AllowedInputs::All;
            }
            RoundEvent::SpecificInputsAllowed { outpoints } => {
                self.expect_phase(event, &[InputRegistration])?;
                self.allowed_inputs = AllowedInputs::Specific(outpoints.clone());
            }
            RoundEvent::InputRegistered {
                alice_id,
                coin,
                ownership_proof,
                deadline,
                amount_credential_value,
                vsize_credential_value,
            } => {
                self.expect_phase(event, &[InputRegistration])?;
                if self.inputs.contains_key(alice_id) {
                    return Err(ReplayError::DuplicateAlice(*alice_id));
                }
                if coin.input_vsize().is_none() {
                    return Err(ReplayError::NonStandardInput(coin.outpoint));
                }
                // A registration commits the full per-alice allocation, input and credential alike.
                self.remaining_vsize_allocation = self
                    .remaining_vsize_allocation
                    .checked_sub(self.parameters.max_vsize_allocation_per_alice)
                    .ok_or(ReplayError::QuotaUnderflow { quota: "vsize" })?;
                self.remaining_amount_allocation = self
                    .remaining_amount_allocation
                    .checked_sub(coin.amount())
                    .ok_or(ReplayError::QuotaUnderflow { quota: "amount" })?;

                let construction = self.construction_mut(event)?;
                *construction = std::mem::take(construction).add_input(coin.clone());

                self.inputs.insert(
                    *alice_id,
                    RegisteredInput {
                        coin: coin.clone(),
                        ownership_proof: ownership_proof.clone(),
                        deadline: *deadline,
                        amount_credential_value: *amount_credential_value,
                        vsize_credential_value: *vsize_credential_value,
                        credentials_issued: false,
                        confirmed: false,
                        ready_to_sign: false,
                    },
                );
            }
            RoundEvent::CredentialsIssued { alice_id, .. } => {
                self.expect_phase(event, &[InputRegistration])?;
                self.alice_mut(alice_id)?.credentials_issued = true;
            }
            RoundEvent::InputUnregistered { alice_id, outpoint } => {
                self.expect_phase(event, &[InputRegistration, ConnectionConfirmation])?;
                let removed = self
                    .inputs
                    .remove(alice_id)
                    .ok_or(ReplayError::UnknownAlice(*alice_id))?;
                self.remaining_vsize_allocation = self
                    .remaining_vsize_allocation
                    .saturating_add(self.parameters.max_vsize_allocation_per_alice);
                self.remaining_amount_allocation = self
                    .remaining_amount_allocation
                    .saturating_add(removed.coin.amount());

                let construction = self.construction_mut(event)?;
                *construction = std::mem::take(construction).remove_input(outpoint);
            }
            RoundEvent::InputConnectionConfirmationStarted => {
                self.expect_phase(event, &[InputRegistration])?;
                self.phase = ConnectionConfirmation;
            }
            RoundEvent::InputConnectionConfirmed { alice_id, .. } => {
                self.expect_phase(event, &[ConnectionConfirmation])?;
                self.alice_mut(alice_id)?.confirmed = true;
            }
            RoundEvent::OutputRegistrationStarted => {
                self.expect_phase(event, &[ConnectionConfirmation])?;
                self.phase = OutputRegistration;
            }
            RoundEvent::OutputRegistered { output } => {
                self.expect_phase(event, &[OutputRegistration])?;
                let construction = self.construction_mut(event)?;
                *construction = std::mem::take(construction).add_output(output.clone());
            }
            RoundEvent::SigningStarted => {
                self.expect_phase(event, &[OutputRegistration])?;
                let construction = std::mem::take(self.construction_mut(event)?);
                self.transaction = MultipartyTransactionState::Signing(construction.finalize());
                self.phase = Signing;
            }
            RoundEvent::InputReadyToSign { alice_id } => {
                self.expect_phase(event, &[OutputRegistration, Signing])?;
                self.alice_mut(alice_id)?.ready_to_sign = true;
            }
            RoundEvent::SignatureAdded { outpoint, witness } => {
                self.expect_phase(event, &[Signing])?;
                let signing = match std::mem::take(&mut self.transaction) {
                    MultipartyTransactionState::Signing(s) => s,
                    MultipartyTransactionState::Construction(_) => {
                        return Err(ReplayError::UnexpectedPhase {
                            event: event.name(),
                            phase: self.phase,
                        })
                    }
                };
                if signing.input(outpoint).is_none() {
                    return Err(ReplayError::UnknownInput(*outpoint));
                }
                self.transaction = MultipartyTransactionState::Signing(
                    signing.add_witness(*outpoint, witness.clone()),
                );
            }
            RoundEvent::RoundSucceeded => {
                self.expect_phase(event, &[Signing])?;
                self.phase = Succeeded;
                self.outcome = Some(RoundOutcome::Succeeded);
            }
            RoundEvent::RoundEnded { outcome } => {
                // Ending an ended round repeats the fact without changing it.
                if self.phase != Ended {
                    self.phase = Ended;
                    self.outcome = Some(*outcome);
                }
            }
        }

        Ok(self)
    }
}
