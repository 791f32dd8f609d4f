//! # BIP-340 Schnorr
//!
//! x-only keys (32 bytes) as they appear in a P2TR witness program, and
//! 64-byte signatures. Signing uses all-zero auxiliary randomness so that
//! proofs are reproducible.

use crate::CryptoError;
use k256::schnorr::signature::{Signer, Verifier};
use k256::schnorr::{Signature, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

pub const XONLY_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

/// x-only key known to lift to a curve point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchnorrPublicKey([u8; XONLY_KEY_LEN]);

impl SchnorrPublicKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; XONLY_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::MalformedKey {
                expected: XONLY_KEY_LEN,
                actual: bytes.len(),
            })?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::NotOnCurve)?;
        Ok(Self(bytes))
    }

    pub fn to_bytes(&self) -> [u8; XONLY_KEY_LEN] {
        self.0
    }

    pub fn verify(&self, message: &[u8], signature: &SchnorrSignature) -> Result<(), CryptoError> {
        let key = VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::NotOnCurve)?;
        let signature =
            Signature::try_from(signature.0.as_slice()).map_err(|_| CryptoError::BadSignature)?;
        key.verify(message, &signature)
            .map_err(|_| CryptoError::BadSignature)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchnorrSignature([u8; SIGNATURE_LEN]);

impl SchnorrSignature {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| CryptoError::MalformedSignature {
                expected: SIGNATURE_LEN,
                actual: bytes.len(),
            })
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0
    }
}

pub struct SchnorrKeyPair {
    signing_key: SigningKey,
}

impl SchnorrKeyPair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Odd-y secrets are negated internally; the x-only key is unaffected.
    pub fn from_secret(secret: [u8; 32]) -> Result<Self, CryptoError> {
        let secret = Zeroizing::new(secret);
        SigningKey::from_bytes(secret.as_slice())
            .map(|signing_key| Self { signing_key })
            .map_err(|_| CryptoError::InvalidSecret)
    }

    pub fn public_key(&self) -> SchnorrPublicKey {
        SchnorrPublicKey(self.signing_key.verifying_key().to_bytes().into())
    }

    pub fn sign(&self, message: &[u8]) -> SchnorrSignature {
        let signature: Signature = self.signing_key.sign(message);
        SchnorrSignature(signature.to_bytes())
    }
}
