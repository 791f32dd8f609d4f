//! # Ownership Proofs
//!
//! A participant proves control of a coin by signing a commitment to the
//! coordinator identifier and the round id with the coin's key.
//!
//! ```text
//! commitment = u32_le(len(identifier)) || identifier || round_id
//! message    = tagged_hash("CJ/OwnershipProof", script_pubkey || commitment)
//! ```
//!
//! | Script | Proof key | Key binding | Signature |
//! |--------|-----------|-------------|-----------|
//! | P2WPKH | 33-byte compressed | `hash160(key) == program` | ECDSA |
//! | P2TR   | 32-byte x-only | `key == program` | BIP-340 Schnorr |

use serde::{Deserialize, Serialize};
use shared_crypto::{
    tagged_hash, CryptoError, SchnorrKeyPair, SchnorrPublicKey, SchnorrSignature,
    Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature,
};
use shared_types::{ContentHash, ContentHasher, Hash, RoundId, ScriptPubKey, ScriptType};
use std::fmt;

pub const OWNERSHIP_PROOF_TAG: &str = "CJ/OwnershipProof";

/// Bytes every proof for this coordinator and round commits to.
pub fn commitment_data(coordinator_identifier: &str, round_id: &RoundId) -> Vec<u8> {
    let identifier = coordinator_identifier.as_bytes();
    let mut data = Vec::with_capacity(4 + identifier.len() + 32);
    data.extend_from_slice(&(identifier.len() as u32).to_le_bytes());
    data.extend_from_slice(identifier);
    data.extend_from_slice(round_id.as_bytes());
    data
}

/// Proof that the registrant controls the key locking a coin.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnershipProof {
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl OwnershipProof {
    fn message(script_pubkey: &ScriptPubKey, commitment_data: &[u8]) -> Hash {
        tagged_hash(
            OWNERSHIP_PROOF_TAG,
            &[script_pubkey.as_bytes(), commitment_data],
        )
    }

    /// Prove ownership of a P2WPKH coin.
    pub fn sign_p2wpkh(
        key: &Secp256k1KeyPair,
        script_pubkey: &ScriptPubKey,
        commitment_data: &[u8],
    ) -> Self {
        let message = Self::message(script_pubkey, commitment_data);
        Self {
            public_key: key.public_key().to_bytes().to_vec(),
            signature: key.sign(&message).to_bytes().to_vec(),
        }
    }

    /// Prove ownership of a P2TR coin through the key path.
    pub fn sign_p2tr(
        key: &SchnorrKeyPair,
        script_pubkey: &ScriptPubKey,
        commitment_data: &[u8],
    ) -> Self {
        let message = Self::message(script_pubkey, commitment_data);
        Self {
            public_key: key.public_key().to_bytes().to_vec(),
            signature: key.sign(&message).to_bytes().to_vec(),
        }
    }

    /// Verify against the coin's locking script and the round commitment.
    pub fn verify(
        &self,
        script_pubkey: &ScriptPubKey,
        commitment_data: &[u8],
    ) -> Result<(), CryptoError> {
        let program = script_pubkey
            .witness_program()
            .ok_or(CryptoError::UnsupportedScript)?;
        let message = Self::message(script_pubkey, commitment_data);

        match script_pubkey.script_type() {
            Some(ScriptType::P2wpkh) => {
                let key = Secp256k1PublicKey::from_slice(&self.public_key)?;
                if key.key_hash().as_slice() != program {
                    return Err(CryptoError::ProgramMismatch);
                }
                key.verify(&message, &Secp256k1Signature::from_slice(&self.signature)?)
            }
            Some(ScriptType::P2tr) => {
                let key = SchnorrPublicKey::from_slice(&self.public_key)?;
                if key.to_bytes().as_slice() != program {
                    return Err(CryptoError::ProgramMismatch);
                }
                key.verify(&message, &SchnorrSignature::from_slice(&self.signature)?)
            }
            None => Err(CryptoError::UnsupportedScript),
        }
    }
}

impl fmt::Debug for OwnershipProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipProof")
            .field("public_key_len", &self.public_key.len())
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

impl ContentHash for OwnershipProof {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        hasher.bytes(&self.public_key).bytes(&self.signature)
    }
}
