//! # Identifiers
//!
//! Round ids, participant secrets and idempotency tokens, plus the canonical
//! content hasher that derives tokens from command payloads.

use crate::entities::Hash;
use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ROUND ID
// =============================================================================

/// Identifier of a CoinJoin round (a 32-byte hash).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct RoundId(pub Hash);

impl RoundId {
    pub fn from_bytes(bytes: Hash) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoundId({})", self)
    }
}

impl FromStr for RoundId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
        let hash: Hash = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(hash))
    }
}

impl ContentHash for RoundId {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        hasher.bytes(&self.0)
    }
}

// =============================================================================
// ALICE ID
// =============================================================================

/// Participant secret handed to Alice when her input is registered.
///
/// Must come from an unguessable source; knowledge of it authorizes every
/// later operation on the input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AliceId(pub Uuid);

impl AliceId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AliceId({})", self.0)
    }
}

impl ContentHash for AliceId {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        hasher.bytes(self.0.as_bytes())
    }
}

// =============================================================================
// IDEMPOTENCE ID
// =============================================================================

/// Token identifying a logical command; repeats with the same token replay the
/// first successful outcome.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdempotenceId(pub Uuid);

impl IdempotenceId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Fresh random token, for callers that do not want content dedup.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IdempotenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for IdempotenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdempotenceId({})", self.0)
    }
}

// =============================================================================
// CONTENT HASHING
// =============================================================================

/// Types with a canonical byte encoding for content-derived tokens.
pub trait ContentHash {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher;
}

impl ContentHash for u32 {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        hasher.u32(*self)
    }
}

impl ContentHash for u64 {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        hasher.u64(*self)
    }
}

impl ContentHash for Vec<u8> {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        hasher.bytes(self)
    }
}

impl<T: ContentHash> ContentHash for [T] {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        self.iter()
            .fold(hasher.u64(self.len() as u64), |h, item| item.hash_into(h))
    }
}

/// SHA-256 builder over a domain tag and length-prefixed fields.
///
/// Every variable-length field is prefixed with its length, so distinct
/// field sequences never collide on concatenation.
#[derive(Clone)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    /// Start a hash scoped to `domain` (typically the command name).
    pub fn new(domain: &str) -> Self {
        Self {
            inner: Sha256::new(),
        }
        .bytes(domain.as_bytes())
    }

    #[must_use]
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.inner.update((data.len() as u64).to_le_bytes());
        self.inner.update(data);
        self
    }

    #[must_use]
    pub fn u32(mut self, value: u32) -> Self {
        self.inner.update(value.to_le_bytes());
        self
    }

    #[must_use]
    pub fn u64(mut self, value: u64) -> Self {
        self.inner.update(value.to_le_bytes());
        self
    }

    #[must_use]
    pub fn bool(mut self, value: bool) -> Self {
        self.inner.update([value as u8]);
        self
    }

    #[must_use]
    pub fn field<T: ContentHash + ?Sized>(self, value: &T) -> Self {
        value.hash_into(self)
    }

    /// Full 32-byte digest.
    pub fn digest(self) -> Hash {
        self.inner.finalize().into()
    }

    /// Token from the first 16 bytes of the digest.
    pub fn finish(self) -> IdempotenceId {
        let digest = self.digest();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        IdempotenceId(Uuid::from_bytes(bytes))
    }
}

impl fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentHasher").finish_non_exhaustive()
    }
}
