//! Static round configuration, fixed by `RoundStarted`.

use crate::error::RoundError;
use serde::{Deserialize, Serialize};
use shared_types::{Amount, ContentHash, ContentHasher, ScriptType, SHARED_OVERHEAD_VSIZE};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default identifier committed to by ownership proofs.
pub const DEFAULT_COORDINATOR_IDENTIFIER: &str = "CoinJoinCoordinatorIdentifier";

/// Largest amount that can exist (21M BTC).
pub const MAX_MONEY: Amount = 2_100_000_000_000_000;

/// Mining fee rate in satoshis per 1000 virtual bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRate(pub u64);

impl FeeRate {
    pub fn from_sat_per_kvb(rate: u64) -> Self {
        Self(rate)
    }

    /// Fee for `vsize` virtual bytes, rounded up.
    pub fn fee(self, vsize: u64) -> Amount {
        self.0.saturating_mul(vsize).div_ceil(1000)
    }
}

/// Inclusive amount range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: Amount,
    pub max: Amount,
}

impl AmountRange {
    pub fn new(min: Amount, max: Amount) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, amount: Amount) -> bool {
        (self.min..=self.max).contains(&amount)
    }
}

/// Round parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundParameters {
    /// Bound into every ownership proof to stop cross-coordinator replay
    pub coordinator_identifier: String,
    pub mining_fee_rate: FeeRate,
    pub allowed_input_amounts: AmountRange,
    pub allowed_output_amounts: AmountRange,
    pub allowed_input_types: BTreeSet<ScriptType>,
    pub allowed_output_types: BTreeSet<ScriptType>,
    /// Vsize budget of a single input's owner (input plus the outputs it pays for)
    pub max_vsize_allocation_per_alice: u64,
    pub max_transaction_vsize: u64,
    /// Starting value of the round's vsize quota
    pub initial_input_vsize_allocation: u64,
    /// Starting value of the round's amount quota
    pub max_total_input_amount: Amount,
    /// Credentials per request (k)
    pub credential_count: usize,
    pub input_registration_timeout: Duration,
    pub connection_confirmation_timeout: Duration,
    pub output_registration_timeout: Duration,
    pub transaction_signing_timeout: Duration,
}

impl Default for RoundParameters {
    fn default() -> Self {
        let max_transaction_vsize = 100_000;
        let both = BTreeSet::from([ScriptType::P2wpkh, ScriptType::P2tr]);
        Self {
            coordinator_identifier: DEFAULT_COORDINATOR_IDENTIFIER.to_string(),
            mining_fee_rate: FeeRate::from_sat_per_kvb(10_000),
            allowed_input_amounts: AmountRange::new(5_000, 4_300_000_000_000),
            allowed_output_amounts: AmountRange::new(5_000, 4_300_000_000_000),
            allowed_input_types: both.clone(),
            allowed_output_types: both,
            max_vsize_allocation_per_alice: 255,
            max_transaction_vsize,
            initial_input_vsize_allocation: max_transaction_vsize - SHARED_OVERHEAD_VSIZE,
            max_total_input_amount: MAX_MONEY,
            credential_count: 2,
            input_registration_timeout: Duration::from_secs(3600),
            connection_confirmation_timeout: Duration::from_secs(60),
            output_registration_timeout: Duration::from_secs(60),
            transaction_signing_timeout: Duration::from_secs(60),
        }
    }
}

impl RoundParameters {
    /// Fee paid for spending an input of `script_type`.
    pub fn input_fee(&self, script_type: ScriptType) -> Amount {
        self.mining_fee_rate.fee(script_type.input_vsize())
    }

    /// Fee paid for creating an output of `script_type`.
    pub fn output_fee(&self, script_type: ScriptType) -> Amount {
        self.mining_fee_rate.fee(script_type.output_vsize())
    }

    /// Reject inconsistent parameter sets.
    pub fn validate(&self) -> Result<(), RoundError> {
        let invalid = |reason: &str| Err(RoundError::InvalidRoundParameters(reason.to_string()));

        if self.coordinator_identifier.is_empty() {
            return invalid("coordinator identifier is empty");
        }
        if self.allowed_input_amounts.min > self.allowed_input_amounts.max {
            return invalid("input amount range is empty");
        }
        if self.allowed_output_amounts.min > self.allowed_output_amounts.max {
            return invalid("output amount range is empty");
        }
        if self.allowed_input_types.is_empty() || self.allowed_output_types.is_empty() {
            return invalid("no script types allowed");
        }
        if self.credential_count == 0 {
            return invalid("credential count must be positive");
        }
        if self.max_transaction_vsize <= SHARED_OVERHEAD_VSIZE {
            return invalid("transaction vsize cannot hold the shared overhead");
        }
        if self.initial_input_vsize_allocation > self.max_transaction_vsize - SHARED_OVERHEAD_VSIZE
        {
            return invalid("input vsize allocation exceeds the transaction size");
        }
        let smallest_input = self
            .allowed_input_types
            .iter()
            .map(|t| t.input_vsize())
            .min()
            .unwrap_or(u64::MAX);
        if self.max_vsize_allocation_per_alice < smallest_input {
            return invalid("per-alice vsize allocation cannot fit any allowed input");
        }
        if self.max_total_input_amount == 0 || self.max_total_input_amount > MAX_MONEY {
            return invalid("total input amount out of range");
        }
        Ok(())
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn script_types_hash(types: &BTreeSet<ScriptType>, hasher: ContentHasher) -> ContentHasher {
    types.iter().fold(hasher.u64(types.len() as u64), |h, t| {
        h.u32(match t {
            ScriptType::P2wpkh => 0,
            ScriptType::P2tr => 1,
        })
    })
}

impl ContentHash for RoundParameters {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        let hasher = hasher
            .bytes(self.coordinator_identifier.as_bytes())
            .u64(self.mining_fee_rate.0)
            .u64(self.allowed_input_amounts.min)
            .u64(self.allowed_input_amounts.max)
            .u64(self.allowed_output_amounts.min)
            .u64(self.allowed_output_amounts.max);
        let hasher = script_types_hash(&self.allowed_input_types, hasher);
        let hasher = script_types_hash(&self.allowed_output_types, hasher);
        hasher
            .u64(self.max_vsize_allocation_per_alice)
            .u64(self.max_transaction_vsize)
            .u64(self.initial_input_vsize_allocation)
            .u64(self.max_total_input_amount)
            .u64(self.credential_count as u64)
            .u64(duration_millis(self.input_registration_timeout))
            .u64(duration_millis(self.connection_confirmation_timeout))
            .u64(duration_millis(self.output_registration_timeout))
            .u64(duration_millis(self.transaction_signing_timeout))
    }
}
