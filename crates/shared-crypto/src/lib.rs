//! # Shared Crypto
//!
//! The primitives ownership proofs are built from.
//!
//! | Module | Provides | Used for |
//! |--------|----------|----------|
//! | `hashing` | SHA-256, BIP-340 tagged hash, HASH160 | proof messages, P2WPKH programs, content tokens |
//! | `ecdsa` | secp256k1 ECDSA, compressed keys | P2WPKH proofs |
//! | `schnorr` | BIP-340 Schnorr, x-only keys | P2TR key-path proofs |
//!
//! Both signers are deterministic: the same key and message always give the
//! same signature bytes, so a retried proof is byte-identical to the first.

pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod schnorr;

pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{hash160, sha256, tagged_hash};
pub use schnorr::{SchnorrKeyPair, SchnorrPublicKey, SchnorrSignature};
