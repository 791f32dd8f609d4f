//! Driven Ports (SPI - Outbound Dependencies)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{OutPoint, TxOut};
use thiserror::Error;
use uuid::Uuid;

/// Node RPC failures. A missing outpoint is not an error, see
/// [`OutpointResolver::get_tx_out`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("Node unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid node response: {0}")]
    InvalidResponse(String),
}

/// Unspent output as reported by the node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutInfo {
    pub txout: TxOut,
    /// Zero for mempool outputs
    pub confirmations: u32,
    pub is_coinbase: bool,
}

/// Resolves outpoints to unspent outputs (node RPC `gettxout`).
#[async_trait]
pub trait OutpointResolver: Send + Sync {
    /// `Ok(None)` when the outpoint is spent or never existed.
    async fn get_tx_out(
        &self,
        outpoint: &OutPoint,
        include_mempool: bool,
    ) -> Result<Option<TxOutInfo>, RpcError>;
}

/// Source of participant secrets and round nonces.
///
/// Values must be unpredictable to anyone but the coordinator.
pub trait UnguessableIdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Wall clock, in Unix milliseconds.
pub trait TimeSource: Send + Sync {
    fn now_millis(&self) -> u64;
}
