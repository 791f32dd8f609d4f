//! Error types for the round aggregate.

use crate::domain::{CredentialKind, Phase};
use shared_types::{AliceId, Amount, OutPoint};
use thiserror::Error;

/// Reason a command was rejected. Rejections never change the round.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("Unexpected state: {command} requires phase {expected:?}, round is in {actual}")]
    PhaseMismatch {
        command: &'static str,
        expected: Vec<Phase>,
        actual: Phase,
    },

    #[error("Invalid round parameters: {0}")]
    InvalidRoundParameters(String),

    #[error("Input {0} is not allowed in this round")]
    InputNotWhitelisted(OutPoint),

    #[error("Input {0} is already registered")]
    AliceAlreadyRegistered(OutPoint),

    #[error("Alice id is already in use")]
    AliceIdCollision,

    #[error("Script type not allowed")]
    ScriptNotAllowed,

    #[error("Amount {amount} is below the minimum {min}")]
    NotEnoughFunds { amount: Amount, min: Amount },

    #[error("Amount {amount} is above the maximum {max}")]
    TooMuchFunds { amount: Amount, max: Amount },

    #[error("Input does not cover its own fee")]
    UneconomicalInput,

    #[error("Input vsize {vsize} exceeds the per-alice allocation {max}")]
    TooMuchVsize { vsize: u64, max: u64 },

    #[error("Transaction size limit exceeded")]
    SizeLimitExceeded,

    #[error("Ownership proof does not verify")]
    WrongOwnershipProof,

    #[error("Vsize quota exceeded: requested {requested}, remaining {remaining}")]
    VsizeQuotaExceeded { requested: u64, remaining: u64 },

    #[error("Amount quota exceeded: requested {requested}, remaining {remaining}")]
    AmountQuotaExceeded { requested: Amount, remaining: Amount },

    #[error("Malformed {0} credential request")]
    MalformedCredentialRequest(CredentialKind),

    #[error("Issuing {kind} credentials failed: {reason}")]
    CredentialIssuanceFailed { kind: CredentialKind, reason: String },

    #[error("Alice {0} not found")]
    AliceNotFound(AliceId),

    #[error("Alice {0} already confirmed")]
    AliceAlreadyConfirmed(AliceId),

    #[error("Coin or ownership proof differs from the registered one")]
    CoinMismatch,

    #[error("Output amount {amount} out of range")]
    OutputAmountOutOfRange { amount: Amount },

    #[error("Output script already registered")]
    AlreadyRegisteredScript,

    #[error("Outputs and fee exceed the registered inputs")]
    InsufficientBalance,

    #[error("Alice {0} already ready to sign")]
    AliceAlreadyReadyToSign(AliceId),

    #[error("Outpoint {0} is not an input of this transaction")]
    UnknownInput(OutPoint),

    #[error("Witness already provided for {0}")]
    WitnessAlreadyProvided(OutPoint),

    #[error("Invalid witness: {0}")]
    InvalidWitness(String),

    #[error("{missing} inputs are not signed")]
    MissingSignatures { missing: usize },

    #[error("Transaction has no inputs")]
    NoInputs,

    #[error("Input {0} is spent or does not exist")]
    InputSpent(OutPoint),

    #[error("Input {outpoint} has {confirmations} confirmations, {required} required")]
    InputUnconfirmed {
        outpoint: OutPoint,
        confirmations: u32,
        required: u32,
    },

    #[error("Coinbase input {0} is not mature")]
    InputImmature(OutPoint),
}

/// Coarse classification for metrics and client reaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PhaseMismatch,
    WhitelistViolation,
    ProofVerification,
    QuotaExceeded,
    ExternalDependency,
    InvalidRequest,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::PhaseMismatch => "phase_mismatch",
            ErrorKind::WhitelistViolation => "whitelist_violation",
            ErrorKind::ProofVerification => "proof_verification",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::ExternalDependency => "external_dependency",
            ErrorKind::InvalidRequest => "invalid_request",
        }
    }
}

impl RoundError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoundError::PhaseMismatch { .. } => ErrorKind::PhaseMismatch,
            RoundError::InputNotWhitelisted(_) => ErrorKind::WhitelistViolation,
            RoundError::WrongOwnershipProof => ErrorKind::ProofVerification,
            RoundError::VsizeQuotaExceeded { .. } | RoundError::AmountQuotaExceeded { .. } => {
                ErrorKind::QuotaExceeded
            }
            RoundError::CredentialIssuanceFailed { .. }
            | RoundError::InputSpent(_)
            | RoundError::InputUnconfirmed { .. }
            | RoundError::InputImmature(_) => ErrorKind::ExternalDependency,
            _ => ErrorKind::InvalidRequest,
        }
    }
}

/// An event that cannot be folded onto the state it was applied to.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    #[error("{event} cannot be applied in phase {phase}")]
    UnexpectedPhase { event: &'static str, phase: Phase },

    #[error("Alice {0} is not registered")]
    UnknownAlice(AliceId),

    #[error("Alice {0} is already registered")]
    DuplicateAlice(AliceId),

    #[error("Coin {0} has a non-standard script")]
    NonStandardInput(OutPoint),

    #[error("{quota} allocation would become negative")]
    QuotaUnderflow { quota: &'static str },

    #[error("Outpoint {0} is not a transaction input")]
    UnknownInput(OutPoint),
}

/// Outcome of handling one command: events, or every reason it was refused.
pub type ProcessResult = Result<Vec<crate::events::RoundEvent>, Vec<RoundError>>;
