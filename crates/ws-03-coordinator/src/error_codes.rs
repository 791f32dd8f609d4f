//! # Protocol Error Codes
//!
//! Stable classification returned to round participants. Clients branch on
//! the code (retry, abandon, resubmit), never on the message text.

use serde::{Deserialize, Serialize};
use std::fmt;
use ws_01_round::{CredentialKind, RoundError};

/// Error code exposed on the participant-facing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolErrorCode {
    RoundNotFound,
    WrongPhase,
    InvalidRoundParameters,
    InputNotWhitelisted,
    AliceAlreadyRegistered,
    ScriptNotAllowed,
    NotEnoughFunds,
    TooMuchFunds,
    UneconomicalInput,
    TooMuchVsize,
    SizeLimitExceeded,
    WrongOwnershipProof,
    VsizeQuotaExceeded,
    AmountQuotaExceeded,
    IncorrectRequestedAmountCredentials,
    IncorrectRequestedVsizeCredentials,
    CryptoException,
    AliceNotFound,
    AliceAlreadyConfirmedConnection,
    CoinMismatch,
    OutputAmountOutOfRange,
    AlreadyRegisteredScript,
    InsufficientBalance,
    AliceAlreadySignalled,
    UnknownInput,
    WitnessAlreadyProvided,
    InvalidWitness,
    MissingSignatures,
    NoInputs,
    InputSpent,
    InputUnconfirmed,
    InputImmature,
    /// Internal failure not attributable to the request
    InternalError,
}

impl ProtocolErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoundNotFound => "RoundNotFound",
            Self::WrongPhase => "WrongPhase",
            Self::InvalidRoundParameters => "InvalidRoundParameters",
            Self::InputNotWhitelisted => "InputNotWhitelisted",
            Self::AliceAlreadyRegistered => "AliceAlreadyRegistered",
            Self::ScriptNotAllowed => "ScriptNotAllowed",
            Self::NotEnoughFunds => "NotEnoughFunds",
            Self::TooMuchFunds => "TooMuchFunds",
            Self::UneconomicalInput => "UneconomicalInput",
            Self::TooMuchVsize => "TooMuchVsize",
            Self::SizeLimitExceeded => "SizeLimitExceeded",
            Self::WrongOwnershipProof => "WrongOwnershipProof",
            Self::VsizeQuotaExceeded => "VsizeQuotaExceeded",
            Self::AmountQuotaExceeded => "AmountQuotaExceeded",
            Self::IncorrectRequestedAmountCredentials => "IncorrectRequestedAmountCredentials",
            Self::IncorrectRequestedVsizeCredentials => "IncorrectRequestedVsizeCredentials",
            Self::CryptoException => "CryptoException",
            Self::AliceNotFound => "AliceNotFound",
            Self::AliceAlreadyConfirmedConnection => "AliceAlreadyConfirmedConnection",
            Self::CoinMismatch => "CoinMismatch",
            Self::OutputAmountOutOfRange => "OutputAmountOutOfRange",
            Self::AlreadyRegisteredScript => "AlreadyRegisteredScript",
            Self::InsufficientBalance => "InsufficientBalance",
            Self::AliceAlreadySignalled => "AliceAlreadySignalled",
            Self::UnknownInput => "UnknownInput",
            Self::WitnessAlreadyProvided => "WitnessAlreadyProvided",
            Self::InvalidWitness => "InvalidWitness",
            Self::MissingSignatures => "MissingSignatures",
            Self::NoInputs => "NoInputs",
            Self::InputSpent => "InputSpent",
            Self::InputUnconfirmed => "InputUnconfirmed",
            Self::InputImmature => "InputImmature",
            Self::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ProtocolErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&RoundError> for ProtocolErrorCode {
    fn from(error: &RoundError) -> Self {
        match error {
            RoundError::PhaseMismatch { .. } => Self::WrongPhase,
            RoundError::InvalidRoundParameters(_) => Self::InvalidRoundParameters,
            RoundError::InputNotWhitelisted(_) => Self::InputNotWhitelisted,
            RoundError::AliceAlreadyRegistered(_) | RoundError::AliceIdCollision => {
                Self::AliceAlreadyRegistered
            }
            RoundError::ScriptNotAllowed => Self::ScriptNotAllowed,
            RoundError::NotEnoughFunds { .. } => Self::NotEnoughFunds,
            RoundError::TooMuchFunds { .. } => Self::TooMuchFunds,
            RoundError::UneconomicalInput => Self::UneconomicalInput,
            RoundError::TooMuchVsize { .. } => Self::TooMuchVsize,
            RoundError::SizeLimitExceeded => Self::SizeLimitExceeded,
            RoundError::WrongOwnershipProof => Self::WrongOwnershipProof,
            RoundError::VsizeQuotaExceeded { .. } => Self::VsizeQuotaExceeded,
            RoundError::AmountQuotaExceeded { .. } => Self::AmountQuotaExceeded,
            RoundError::MalformedCredentialRequest(CredentialKind::Amount) => {
                Self::IncorrectRequestedAmountCredentials
            }
            RoundError::MalformedCredentialRequest(CredentialKind::Vsize) => {
                Self::IncorrectRequestedVsizeCredentials
            }
            RoundError::CredentialIssuanceFailed { .. } => Self::CryptoException,
            RoundError::AliceNotFound(_) => Self::AliceNotFound,
            RoundError::AliceAlreadyConfirmed(_) => Self::AliceAlreadyConfirmedConnection,
            RoundError::CoinMismatch => Self::CoinMismatch,
            RoundError::OutputAmountOutOfRange { .. } => Self::OutputAmountOutOfRange,
            RoundError::AlreadyRegisteredScript => Self::AlreadyRegisteredScript,
            RoundError::InsufficientBalance => Self::InsufficientBalance,
            RoundError::AliceAlreadyReadyToSign(_) => Self::AliceAlreadySignalled,
            RoundError::UnknownInput(_) => Self::UnknownInput,
            RoundError::WitnessAlreadyProvided(_) => Self::WitnessAlreadyProvided,
            RoundError::InvalidWitness(_) => Self::InvalidWitness,
            RoundError::MissingSignatures { .. } => Self::MissingSignatures,
            RoundError::NoInputs => Self::NoInputs,
            RoundError::InputSpent(_) => Self::InputSpent,
            RoundError::InputUnconfirmed { .. } => Self::InputUnconfirmed,
            RoundError::InputImmature(_) => Self::InputImmature,
        }
    }
}
