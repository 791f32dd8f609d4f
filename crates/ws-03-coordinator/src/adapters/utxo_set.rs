//! In-memory UTXO set.
//!
//! Stands in for the node on regtest-style setups and in tests. Outputs are
//! added and spent explicitly; lookups follow `gettxout` semantics.

use crate::ports::{OutpointResolver, RpcError, TxOutInfo};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Coin, OutPoint};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

#[derive(Default)]
pub struct InMemoryUtxoSet {
    outputs: RwLock<HashMap<OutPoint, TxOutInfo>>,
    unavailable: AtomicBool,
    lookups: AtomicUsize,
}

impl InMemoryUtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, outpoint: OutPoint, info: TxOutInfo) {
        self.outputs.write().insert(outpoint, info);
    }

    /// Add a non-coinbase output with `confirmations`.
    pub fn insert_coin(&self, coin: &Coin, confirmations: u32) {
        self.insert(
            coin.outpoint,
            TxOutInfo {
                txout: coin.txout.clone(),
                confirmations,
                is_coinbase: false,
            },
        );
    }

    /// Remove the output. Returns whether it was unspent.
    pub fn spend(&self, outpoint: &OutPoint) -> bool {
        self.outputs.write().remove(outpoint).is_some()
    }

    /// Make every lookup fail as if the node were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutpointResolver for InMemoryUtxoSet {
    async fn get_tx_out(
        &self,
        outpoint: &OutPoint,
        include_mempool: bool,
    ) -> Result<Option<TxOutInfo>, RpcError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RpcError::Unavailable("utxo set offline".into()));
        }
        let info = self
            .outputs
            .read()
            .get(outpoint)
            .filter(|info| include_mempool || info.confirmations > 0)
            .cloned();
        debug!(%outpoint, found = info.is_some(), "UTXO lookup");
        Ok(info)
    }
}
