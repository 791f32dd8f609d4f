//! # Core Domain Entities
//!
//! Bitcoin primitives used by the coordinator. Only the parts of a transaction
//! the round aggregate actually reasons about are modelled: outpoints, outputs,
//! witness programs and witness stacks.
//!
//! ## Supported Scripts
//!
//! | Script | Witness program | Input vsize | Output vsize |
//! |--------|-----------------|-------------|--------------|
//! | P2WPKH | `OP_0 <20-byte key hash>` | 68 | 31 |
//! | P2TR | `OP_1 <32-byte x-only key>` | 58 | 43 |

use crate::errors::ParseError;
use crate::identifiers::{ContentHash, ContentHasher};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte hash (SHA-256 or double SHA-256).
pub type Hash = [u8; 32];

/// An amount in satoshis.
pub type Amount = u64;

/// Fixed vsize shared by every transaction (version, locktime, counts, marker).
pub const SHARED_OVERHEAD_VSIZE: u64 = 11;

// =============================================================================
// TRANSACTION IDENTIFIERS
// =============================================================================

/// Transaction identifier.
///
/// Stored in internal byte order; displayed reversed, as Bitcoin Core does.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Txid(pub Hash);

impl Txid {
    /// Create from internal byte order.
    pub fn from_bytes(bytes: Hash) -> Self {
        Self(bytes)
    }

    /// Raw bytes in internal order.
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", self)
    }
}

impl FromStr for Txid {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(ParseError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        hash.reverse();
        Ok(Self(hash))
    }
}

/// Reference to a transaction output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transaction that created the output.
    pub txid: Txid,
    /// Output index within that transaction.
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Txid, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl FromStr for OutPoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, vout) = s
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidOutPoint(s.to_string()))?;
        let vout = vout
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidOutPoint(s.to_string()))?;
        Ok(Self::new(txid.parse()?, vout))
    }
}

impl ContentHash for OutPoint {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        hasher.bytes(&self.txid.0).u32(self.vout)
    }
}

// =============================================================================
// SCRIPTS
// =============================================================================

/// Standard output script templates accepted by the coordinator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum ScriptType {
    /// Native SegWit v0 pay-to-witness-public-key-hash.
    P2wpkh,
    /// SegWit v1 pay-to-taproot (key path).
    P2tr,
}

impl ScriptType {
    /// Virtual size of an input spending this script type.
    pub fn input_vsize(self) -> u64 {
        match self {
            ScriptType::P2wpkh => 68,
            ScriptType::P2tr => 58,
        }
    }

    /// Virtual size of an output paying to this script type.
    pub fn output_vsize(self) -> u64 {
        match self {
            ScriptType::P2wpkh => 31,
            ScriptType::P2tr => 43,
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptType::P2wpkh => write!(f, "P2WPKH"),
            ScriptType::P2tr => write!(f, "P2TR"),
        }
    }
}

/// Locking script of a transaction output.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ScriptPubKey(pub Vec<u8>);

impl ScriptPubKey {
    const OP_0: u8 = 0x00;
    const OP_1: u8 = 0x51;

    /// `OP_0 <hash160(pubkey)>`
    pub fn new_p2wpkh(key_hash: [u8; 20]) -> Self {
        let mut script = Vec::with_capacity(22);
        script.push(Self::OP_0);
        script.push(20);
        script.extend_from_slice(&key_hash);
        Self(script)
    }

    /// `OP_1 <x-only output key>`
    pub fn new_p2tr(output_key: [u8; 32]) -> Self {
        let mut script = Vec::with_capacity(34);
        script.push(Self::OP_1);
        script.push(32);
        script.extend_from_slice(&output_key);
        Self(script)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Classify the script, returning `None` for anything non-standard.
    pub fn script_type(&self) -> Option<ScriptType> {
        match self.0.as_slice() {
            [Self::OP_0, 20, program @ ..] if program.len() == 20 => Some(ScriptType::P2wpkh),
            [Self::OP_1, 32, program @ ..] if program.len() == 32 => Some(ScriptType::P2tr),
            _ => None,
        }
    }

    /// Witness program bytes (key hash or output key) for standard scripts.
    pub fn witness_program(&self) -> Option<&[u8]> {
        self.script_type().map(|_| &self.0[2..])
    }
}

impl fmt::Debug for ScriptPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptPubKey({})", hex::encode(&self.0))
    }
}

impl ContentHash for ScriptPubKey {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        hasher.bytes(&self.0)
    }
}

// =============================================================================
// OUTPUTS AND COINS
// =============================================================================

/// A transaction output.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TxOut {
    /// Value in satoshis.
    pub value: Amount,
    /// Locking script.
    pub script_pubkey: ScriptPubKey,
}

impl TxOut {
    pub fn new(value: Amount, script_pubkey: ScriptPubKey) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }
}

impl ContentHash for TxOut {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        self.script_pubkey.hash_into(hasher.u64(self.value))
    }
}

/// An unspent output together with the outpoint that references it.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Coin {
    pub outpoint: OutPoint,
    pub txout: TxOut,
}

impl Coin {
    pub fn new(outpoint: OutPoint, txout: TxOut) -> Self {
        Self { outpoint, txout }
    }

    pub fn amount(&self) -> Amount {
        self.txout.value
    }

    pub fn script_pubkey(&self) -> &ScriptPubKey {
        &self.txout.script_pubkey
    }

    pub fn script_type(&self) -> Option<ScriptType> {
        self.txout.script_pubkey.script_type()
    }

    /// Virtual size this coin adds when spent, if its script is standard.
    pub fn input_vsize(&self) -> Option<u64> {
        self.script_type().map(ScriptType::input_vsize)
    }
}

impl ContentHash for Coin {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        self.txout.hash_into(self.outpoint.hash_into(hasher))
    }
}

// =============================================================================
// WITNESSES
// =============================================================================

/// Segregated witness stack for one input.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Witness(pub Vec<Vec<u8>>);

impl Witness {
    pub fn new(items: Vec<Vec<u8>>) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &[Vec<u8>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(hex::encode))
            .finish()
    }
}

impl ContentHash for Witness {
    fn hash_into(&self, hasher: ContentHasher) -> ContentHasher {
        self.0
            .iter()
            .fold(hasher.u64(self.0.len() as u64), |h, item| h.bytes(item))
    }
}
