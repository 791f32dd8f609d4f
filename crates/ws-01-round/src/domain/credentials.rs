//! Credential request/response envelopes.
//!
//! The blinded contents are opaque here; only their shape is checked before
//! the issuer is called.

use serde::{Deserialize, Serialize};
use shared_types::{ContentHash, ContentHasher};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKind {
    Amount,
    Vsize,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Amount => f.write_str("amount"),
            CredentialKind::Vsize => f.write_str("vsize"),
        }
    }
}

/// A credential request as sent by a client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsRequest {
    /// Net value being moved into (positive) or out of (negative) credentials.
    pub delta: i64,
    /// Credentials being redeemed.
    pub presented: Vec<Vec<u8>>,
    /// Blinded credentials being requested.
    pub requested: Vec<Vec<u8>>,
    /// Proofs over the requested credentials.
    pub proofs: Vec<Vec<u8>>,
}

impl CredentialsRequest {
    /// Request for `requested.len()` zero-valued credentials.
    pub fn zero(requested: Vec<Vec<u8>>, proofs: Vec<Vec<u8>>) -> Self {
        Self {
            delta: 0,
            presented: Vec::new(),
            requested,
            proofs,
        }
    }

    /// Whether this is a well-formed zero-value request for `k` credentials.
    pub fn is_zero_request(&self, k: usize) -> bool {
        self.delta == 0
            && self.presented.is_empty()
            && self.requested.len() == k
            && self.proofs.len() == k
    }
}

impl ContentHash for CredentialsRequest {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        hasher
            .u64(self.delta as u64)
            .field(self.presented.as_slice())
            .field(self.requested.as_slice())
            .field(self.proofs.as_slice())
    }
}

/// Issuer's answer to a [`CredentialsRequest`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsResponse {
    pub issued: Vec<Vec<u8>>,
    pub proofs: Vec<Vec<u8>>,
}
