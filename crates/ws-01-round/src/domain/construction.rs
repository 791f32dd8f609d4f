//! Transaction under construction.
//!
//! Inputs and outputs accumulate in a [`ConstructionState`]; once signing
//! starts it is frozen into a [`SigningState`] that only gains witnesses.

use crate::domain::RoundParameters;
use crate::error::RoundError;
use serde::{Deserialize, Serialize};
use shared_types::{Coin, OutPoint, TxOut, Witness, SHARED_OVERHEAD_VSIZE};
use std::collections::BTreeMap;

fn output_vsize(output: &TxOut) -> u64 {
    output
        .script_pubkey
        .script_type()
        .map(|t| t.output_vsize())
        .unwrap_or(0)
}

fn estimated_vsize(inputs: &[Coin], outputs: &[TxOut]) -> u64 {
    SHARED_OVERHEAD_VSIZE
        + inputs.iter().filter_map(Coin::input_vsize).sum::<u64>()
        + outputs.iter().map(output_vsize).sum::<u64>()
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionState {
    pub inputs: Vec<Coin>,
    pub outputs: Vec<TxOut>,
}

impl ConstructionState {
    pub fn estimated_vsize(&self) -> u64 {
        estimated_vsize(&self.inputs, &self.outputs)
    }

    /// Inputs minus outputs minus the mining fee for the current size.
    pub fn balance(&self, params: &RoundParameters) -> i128 {
        let inputs: i128 = self.inputs.iter().map(|c| i128::from(c.amount())).sum();
        let outputs: i128 = self.outputs.iter().map(|o| i128::from(o.value)).sum();
        let fee = i128::from(params.mining_fee_rate.fee(self.estimated_vsize()));
        inputs - outputs - fee
    }

    pub fn contains_input(&self, outpoint: &OutPoint) -> bool {
        self.inputs.iter().any(|c| c.outpoint == *outpoint)
    }

    /// Every transaction-level reason `coin` cannot be added.
    pub fn validate_input(&self, params: &RoundParameters, coin: &Coin) -> Vec<RoundError> {
        let mut errors = Vec::new();

        if self.contains_input(&coin.outpoint) {
            errors.push(RoundError::AliceAlreadyRegistered(coin.outpoint));
        }

        let amount = coin.amount();
        if amount < params.allowed_input_amounts.min {
            errors.push(RoundError::NotEnoughFunds {
                amount,
                min: params.allowed_input_amounts.min,
            });
        }
        if amount > params.allowed_input_amounts.max {
            errors.push(RoundError::TooMuchFunds {
                amount,
                max: params.allowed_input_amounts.max,
            });
        }

        let script_type = match coin.script_type() {
            Some(t) if params.allowed_input_types.contains(&t) => t,
            _ => {
                errors.push(RoundError::ScriptNotAllowed);
                return errors;
            }
        };

        if amount <= params.input_fee(script_type) {
            errors.push(RoundError::UneconomicalInput);
        }

        let vsize = script_type.input_vsize();
        if vsize > params.max_vsize_allocation_per_alice {
            errors.push(RoundError::TooMuchVsize {
                vsize,
                max: params.max_vsize_allocation_per_alice,
            });
        }
        if self.estimated_vsize() + vsize > params.max_transaction_vsize {
            errors.push(RoundError::SizeLimitExceeded);
        }

        errors
    }

    #[must_use]
    pub fn add_input(mut self, coin: Coin) -> Self {
        self.inputs.push(coin);
        self
    }

    #[must_use]
    pub fn remove_input(mut self, outpoint: &OutPoint) -> Self {
        self.inputs.retain(|c| c.outpoint != *outpoint);
        self
    }

    /// Every transaction-level reason `output` cannot be added.
    pub fn validate_output(&self, params: &RoundParameters, output: &TxOut) -> Vec<RoundError> {
        let mut errors = Vec::new();

        match output.script_pubkey.script_type() {
            Some(t) if params.allowed_output_types.contains(&t) => {}
            _ => {
                errors.push(RoundError::ScriptNotAllowed);
                return errors;
            }
        }

        if !params.allowed_output_amounts.contains(output.value) {
            errors.push(RoundError::OutputAmountOutOfRange {
                amount: output.value,
            });
        }
        if self
            .outputs
            .iter()
            .any(|o| o.script_pubkey == output.script_pubkey)
        {
            errors.push(RoundError::AlreadyRegisteredScript);
        }

        let with_output = self.clone().add_output(output.clone());
        if with_output.estimated_vsize() > params.max_transaction_vsize {
            errors.push(RoundError::SizeLimitExceeded);
        }
        if with_output.balance(params) < 0 {
            errors.push(RoundError::InsufficientBalance);
        }

        errors
    }

    #[must_use]
    pub fn add_output(mut self, output: TxOut) -> Self {
        self.outputs.push(output);
        self
    }

    /// Freeze inputs and outputs for signing.
    pub fn finalize(self) -> SigningState {
        SigningState {
            inputs: self.inputs,
            outputs: self.outputs,
            witnesses: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningState {
    pub inputs: Vec<Coin>,
    pub outputs: Vec<TxOut>,
    pub witnesses: BTreeMap<OutPoint, Witness>,
}

impl SigningState {
    pub fn input(&self, outpoint: &OutPoint) -> Option<&Coin> {
        self.inputs.iter().find(|c| c.outpoint == *outpoint)
    }

    pub fn is_signed(&self, outpoint: &OutPoint) -> bool {
        self.witnesses.contains_key(outpoint)
    }

    /// Inputs still lacking a witness.
    pub fn missing_signatures(&self) -> usize {
        self.inputs
            .iter()
            .filter(|c| !self.witnesses.contains_key(&c.outpoint))
            .count()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.missing_signatures() == 0
    }

    #[must_use]
    pub fn add_witness(mut self, outpoint: OutPoint, witness: Witness) -> Self {
        self.witnesses.insert(outpoint, witness);
        self
    }
}

/// The shared transaction in either of its two stages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultipartyTransactionState {
    Construction(ConstructionState),
    Signing(SigningState),
}

impl Default for MultipartyTransactionState {
    fn default() -> Self {
        MultipartyTransactionState::Construction(ConstructionState::default())
    }
}

impl MultipartyTransactionState {
    pub fn inputs(&self) -> &[Coin] {
        match self {
            Self::Construction(c) => &c.inputs,
            Self::Signing(s) => &s.inputs,
        }
    }

    pub fn outputs(&self) -> &[TxOut] {
        match self {
            Self::Construction(c) => &c.outputs,
            Self::Signing(s) => &s.outputs,
        }
    }

    pub fn estimated_vsize(&self) -> u64 {
        estimated_vsize(self.inputs(), self.outputs())
    }

    pub fn as_construction(&self) -> Option<&ConstructionState> {
        match self {
            Self::Construction(c) => Some(c),
            Self::Signing(_) => None,
        }
    }

    pub fn as_signing(&self) -> Option<&SigningState> {
        match self {
            Self::Construction(_) => None,
            Self::Signing(s) => Some(s),
        }
    }
}
