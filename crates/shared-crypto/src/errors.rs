//! Why a key, secret or signature was refused.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Key must be {expected} bytes, got {actual}")]
    MalformedKey { expected: usize, actual: usize },

    #[error("Key is not a point on secp256k1")]
    NotOnCurve,

    /// Zero, or not below the curve order.
    #[error("Secret key out of range")]
    InvalidSecret,

    #[error("Signature must be {expected} bytes, got {actual}")]
    MalformedSignature { expected: usize, actual: usize },

    #[error("Signature does not verify")]
    BadSignature,

    /// The proof key is valid but does not lock the coin.
    #[error("Key does not match the witness program")]
    ProgramMismatch,

    #[error("Script type cannot carry an ownership proof")]
    UnsupportedScript,
}
