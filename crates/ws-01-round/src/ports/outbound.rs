//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::{CredentialsRequest, CredentialsResponse};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CredentialIssuerError {
    /// The issuer refused the request (bad proofs, wrong shape).
    #[error("Credential request rejected: {0}")]
    Rejected(String),

    #[error("Credential issuer unavailable: {0}")]
    Unavailable(String),
}

/// Anonymous credential issuer.
///
/// Invoked once for amount credentials and once for vsize credentials per
/// input registration; the two calls may run concurrently.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn handle_request(
        &self,
        request: &CredentialsRequest,
    ) -> Result<CredentialsResponse, CredentialIssuerError>;
}
