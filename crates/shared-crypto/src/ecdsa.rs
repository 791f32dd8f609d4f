//! # secp256k1 ECDSA
//!
//! Keys travel in SEC1 compressed form (33 bytes), signatures as fixed-size
//! `r || s` (64 bytes). Nonces follow RFC 6979 and `k256` emits low-S
//! signatures only.

use crate::hashing::hash160;
use crate::CryptoError;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

pub const COMPRESSED_KEY_LEN: usize = 33;
pub const SIGNATURE_LEN: usize = 64;

/// Parsed public key; always a valid curve point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey(VerifyingKey);

impl Secp256k1PublicKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != COMPRESSED_KEY_LEN {
            return Err(CryptoError::MalformedKey {
                expected: COMPRESSED_KEY_LEN,
                actual: bytes.len(),
            });
        }
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::NotOnCurve)
    }

    pub fn to_bytes(&self) -> [u8; COMPRESSED_KEY_LEN] {
        let mut bytes = [0u8; COMPRESSED_KEY_LEN];
        bytes.copy_from_slice(self.0.to_encoded_point(true).as_bytes());
        bytes
    }

    /// Witness program of the P2WPKH output this key locks.
    pub fn key_hash(&self) -> [u8; 20] {
        hash160(&self.to_bytes())
    }

    pub fn verify(
        &self,
        message: &[u8],
        signature: &Secp256k1Signature,
    ) -> Result<(), CryptoError> {
        self.0
            .verify(message, &signature.0)
            .map_err(|_| CryptoError::BadSignature)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Secp256k1Signature(Signature);

impl Secp256k1Signature {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(CryptoError::MalformedSignature {
                expected: SIGNATURE_LEN,
                actual: bytes.len(),
            });
        }
        // Zero r or s.
        Signature::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::BadSignature)
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0.to_bytes().into()
    }
}

pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    pub fn from_secret(secret: [u8; 32]) -> Result<Self, CryptoError> {
        let secret = Zeroizing::new(secret);
        SigningKey::from_bytes((&*secret).into())
            .map(|signing_key| Self { signing_key })
            .map_err(|_| CryptoError::InvalidSecret)
    }

    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey(VerifyingKey::from(&self.signing_key))
    }

    pub fn sign(&self, message: &[u8]) -> Secp256k1Signature {
        Secp256k1Signature(self.signing_key.sign(message))
    }
}
