//! Domain layer for the round aggregate.

pub mod construction;
pub mod credentials;
pub mod ownership;
pub mod parameters;
pub mod phase;
pub mod state;

pub use construction::{ConstructionState, MultipartyTransactionState, SigningState};
pub use credentials::{CredentialKind, CredentialsRequest, CredentialsResponse};
pub use ownership::{commitment_data, OwnershipProof, OWNERSHIP_PROOF_TAG};
pub use parameters::{
    AmountRange, FeeRate, RoundParameters, DEFAULT_COORDINATOR_IDENTIFIER, MAX_MONEY,
};
pub use phase::Phase;
pub use state::{AllowedInputs, RegisteredInput, RoundState};
