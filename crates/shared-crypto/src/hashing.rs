//! Digests used for proof messages and witness programs.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub type Hash = [u8; 32];

pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// BIP-340 tagged hash: `SHA256(SHA256(tag) || SHA256(tag) || parts...)`.
///
/// `parts` are fed without separators, so callers must length-prefix any
/// field whose boundary matters.
pub fn tagged_hash(tag: &str, parts: &[&[u8]]) -> Hash {
    let tag = Sha256::digest(tag.as_bytes());
    let mut engine = Sha256::new_with_prefix(tag);
    engine.update(tag);
    for part in parts {
        engine.update(part);
    }
    engine.finalize().into()
}

/// `RIPEMD160(SHA256(data))`, the P2WPKH key hash.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}
