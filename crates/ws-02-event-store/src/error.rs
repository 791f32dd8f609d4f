//! Error types for the event store.

use std::fmt;
use thiserror::Error;

/// Errors returned by [`crate::EventStore`] operations.
#[derive(Debug, Error)]
pub enum EventStoreError<R: fmt::Debug> {
    /// The processor rejected the command. Nothing was stored.
    #[error("Command rejected: {0:?}")]
    Rejected(R),

    /// A stored log does not fold into a valid state.
    #[error("Event log of {aggregate_type} {aggregate_id} is corrupted at sequence {sequence}: {reason}")]
    CorruptedLog {
        aggregate_type: &'static str,
        aggregate_id: String,
        sequence: u64,
        reason: String,
    },
}

impl<R: fmt::Debug> EventStoreError<R> {
    /// The rejection, if the command was rejected by the processor.
    pub fn rejection(&self) -> Option<&R> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            Self::CorruptedLog { .. } => None,
        }
    }
}
