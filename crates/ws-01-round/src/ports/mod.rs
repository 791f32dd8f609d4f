//! Ports for the round aggregate.

pub mod outbound;

pub use outbound::{CredentialIssuer, CredentialIssuerError};
