//! # WS-01 Round
//!
//! The round aggregate of the WabiSabi coordinator: phase state machine,
//! commands, events and the command processor that turns one into the other.
//!
//! ## Overview
//!
//! A round is rebuilt by folding its events ([`RoundState::apply`]). Commands
//! are checked against the folded state by [`RoundCommandProcessor`], which
//! either returns the events to append or every reason the command was
//! refused. Persistence, serialization per round and deduplication of retried
//! commands are provided by `ws-02-event-store`.
//!
//! ## Phases
//!
//! ```text
//! New ─StartRound─► InputRegistration ─StartConnectionConfirmation─► ConnectionConfirmation
//!                                                                           │
//!                        ┌──────────────StartOutputRegistration─────────────┘
//!                        ▼
//!                 OutputRegistration ─StartTransactionSigning─► Signing ─SucceedRound─► Succeeded
//!                                                                                          │
//!   any phase ────────────────────────────EndRound─────────────────────────────────► Ended ◄┘
//! ```
//!
//! ## Command Gating
//!
//! | Command | Legal Phases |
//! |---------|--------------|
//! | StartRound | New |
//! | RegisterInput | InputRegistration |
//! | RemoveInput | InputRegistration, ConnectionConfirmation |
//! | ConfirmInputConnection | ConnectionConfirmation |
//! | RegisterOutput | OutputRegistration |
//! | NotifyInputReadyToSign | OutputRegistration, Signing |
//! | AddSignature | Signing |
//! | SucceedRound | Signing |
//! | EndRound | any |
//!
//! ## Quotas
//!
//! `remaining_vsize_allocation` and `remaining_amount_allocation` change only
//! through committed `InputRegistered` / `InputUnregistered` events. Each
//! registration takes `max_vsize_allocation_per_alice` from the vsize quota,
//! which covers the input and the vsize credential issued with it, and the
//! coin's value from the amount quota. A registration that exactly exhausts
//! a quota is accepted; one unit more is refused.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! domain/       - Phase, RoundParameters, RoundState, construction state, ownership proofs
//! commands.rs   - RoundCommand and content-derived idempotency tokens
//! events.rs     - RoundEvent, RoundOutcome
//! processor.rs  - RoundCommandProcessor
//! ports/        - CredentialIssuer (driven port)
//! error.rs      - RoundError, ErrorKind, ReplayError
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod commands;
pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod processor;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use commands::RoundCommand;
pub use domain::{
    AllowedInputs, AmountRange, CredentialKind, CredentialsRequest, CredentialsResponse, FeeRate,
    OwnershipProof, Phase, RegisteredInput, RoundParameters, RoundState,
};
pub use error::{ErrorKind, ProcessResult, ReplayError, RoundError};
pub use events::{RoundEvent, RoundOutcome};
pub use ports::{CredentialIssuer, CredentialIssuerError};
pub use processor::RoundCommandProcessor;
