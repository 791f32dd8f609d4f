//! Error types for the coordination service.

use crate::error_codes::ProtocolErrorCode;
use crate::ports::RpcError;
use shared_types::RoundId;
use thiserror::Error;
use ws_01_round::RoundError;
use ws_02_event_store::EventStoreError;

/// Errors returned by [`crate::CoordinatorService`] operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// No round with this id was started.
    #[error("Round {0} not found")]
    RoundNotFound(RoundId),

    /// The round refused the request. `errors` is never empty.
    #[error("{code}: {}", first_message(.errors))]
    Protocol {
        code: ProtocolErrorCode,
        errors: Vec<RoundError>,
    },

    /// The node could not answer an outpoint lookup.
    #[error("Node RPC failed: {0}")]
    Rpc(#[from] RpcError),

    /// The event store could not serve the round.
    #[error("Event store failure: {0}")]
    Store(String),

    /// Configuration was rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

fn first_message(errors: &[RoundError]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl CoordinatorError {
    /// Code a participant sees for this error.
    pub fn code(&self) -> ProtocolErrorCode {
        match self {
            Self::RoundNotFound(_) => ProtocolErrorCode::RoundNotFound,
            Self::Protocol { code, .. } => *code,
            Self::Rpc(_) | Self::Store(_) | Self::Config(_) => ProtocolErrorCode::InternalError,
        }
    }

    /// Domain errors behind a protocol rejection.
    pub fn round_errors(&self) -> &[RoundError] {
        match self {
            Self::Protocol { errors, .. } => errors.as_slice(),
            _ => &[],
        }
    }
}

impl From<RoundError> for CoordinatorError {
    fn from(error: RoundError) -> Self {
        Self::from(vec![error])
    }
}

/// The first error decides the code; the processor reports the blocking
/// check first.
impl From<Vec<RoundError>> for CoordinatorError {
    fn from(errors: Vec<RoundError>) -> Self {
        let code = errors
            .first()
            .map(ProtocolErrorCode::from)
            .unwrap_or(ProtocolErrorCode::InternalError);
        Self::Protocol { code, errors }
    }
}

impl From<EventStoreError<Vec<RoundError>>> for CoordinatorError {
    fn from(error: EventStoreError<Vec<RoundError>>) -> Self {
        match error {
            EventStoreError::Rejected(errors) => Self::from(errors),
            other => Self::Store(other.to_string()),
        }
    }
}
