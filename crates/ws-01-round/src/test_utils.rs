//! Fixtures for round tests: keys, coins, proofs and a mock credential issuer.

#![allow(clippy::expect_used)]

use crate::commands::RoundCommand;
use crate::domain::{
    commitment_data, CredentialsRequest, CredentialsResponse, OwnershipProof, RoundParameters,
    RoundState, DEFAULT_COORDINATOR_IDENTIFIER,
};
use crate::events::RoundEvent;
use crate::ports::{CredentialIssuer, CredentialIssuerError};
use crate::processor::RoundCommandProcessor;
use async_trait::async_trait;
use shared_crypto::{sha256, SchnorrKeyPair, Secp256k1KeyPair};
use shared_types::{AliceId, Amount, Coin, OutPoint, RoundId, ScriptPubKey, Txid, TxOut, Witness};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use ws_02_event_store::Aggregate;

/// Round id used by [`started_round`].
pub const TEST_ROUND_ID: RoundId = RoundId([0x42; 32]);

// =============================================================================
// CREDENTIAL ISSUER
// =============================================================================

/// Issuer that echoes one fake credential per requested one.
#[derive(Default)]
pub struct MockCredentialIssuer {
    fail: AtomicBool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockCredentialIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let issuer = Self::default();
        issuer.set_failing(true);
        issuer
    }

    /// Issuer that sleeps before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialIssuer for MockCredentialIssuer {
    async fn handle_request(
        &self,
        request: &CredentialsRequest,
    ) -> Result<CredentialsResponse, CredentialIssuerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CredentialIssuerError::Unavailable("injected failure".into()));
        }
        Ok(CredentialsResponse {
            issued: request.requested.iter().map(|r| sha256(r).to_vec()).collect(),
            proofs: request.proofs.clone(),
        })
    }
}

pub fn processor() -> RoundCommandProcessor {
    processor_with(
        Arc::new(MockCredentialIssuer::new()),
        Arc::new(MockCredentialIssuer::new()),
    )
}

pub fn processor_with(
    amount_issuer: Arc<dyn CredentialIssuer>,
    vsize_issuer: Arc<dyn CredentialIssuer>,
) -> RoundCommandProcessor {
    RoundCommandProcessor::new(amount_issuer, vsize_issuer)
}

// =============================================================================
// ROUND FIXTURES
// =============================================================================

/// Well-formed zero-value request for `k` credentials.
pub fn zero_requests(k: usize) -> CredentialsRequest {
    CredentialsRequest::zero(
        (0..k).map(|i| vec![i as u8; 32]).collect(),
        (0..k).map(|i| vec![0x80 | i as u8; 64]).collect(),
    )
}

/// Default-parameter round in input registration. `None` allows every input.
pub fn started_round(allowed: Option<Vec<OutPoint>>) -> RoundState {
    let allowed = match allowed {
        None => RoundEvent::AllInputsAllowed,
        Some(outpoints) => RoundEvent::SpecificInputsAllowed {
            outpoints: outpoints.into_iter().collect::<BTreeSet<_>>(),
        },
    };
    RoundState::replay(
        TEST_ROUND_ID,
        &[
            RoundEvent::RoundStarted {
                parameters: RoundParameters::default(),
            },
            allowed,
        ],
    )
    .expect("fixture events replay")
}

pub enum TestKey {
    Ecdsa(Secp256k1KeyPair),
    Schnorr(SchnorrKeyPair),
}

/// A participant owning one coin.
pub struct TestAlice {
    pub key: TestKey,
    pub coin: Coin,
}

fn secret(seed: u8) -> [u8; 32] {
    // Leading 0x01 keeps the scalar below the curve order.
    let mut bytes = [seed; 32];
    bytes[0] = 0x01;
    bytes
}

impl TestAlice {
    /// P2WPKH coin at `seed`'s outpoint (vout 0).
    pub fn p2wpkh(seed: u8, value: Amount) -> Self {
        let key = Secp256k1KeyPair::from_secret(secret(seed)).expect("valid secret");
        let script = ScriptPubKey::new_p2wpkh(key.public_key().key_hash());
        Self {
            coin: Coin::new(
                OutPoint::new(Txid::from_bytes([seed; 32]), 0),
                TxOut::new(value, script),
            ),
            key: TestKey::Ecdsa(key),
        }
    }

    /// P2TR coin at `seed`'s outpoint (vout 1).
    pub fn p2tr(seed: u8, value: Amount) -> Self {
        let key = SchnorrKeyPair::from_secret(secret(seed)).expect("valid secret");
        let script = ScriptPubKey::new_p2tr(key.public_key().to_bytes());
        Self {
            coin: Coin::new(
                OutPoint::new(Txid::from_bytes([seed; 32]), 1),
                TxOut::new(value, script),
            ),
            key: TestKey::Schnorr(key),
        }
    }

    pub fn proof_for(&self, commitment: &[u8]) -> OwnershipProof {
        let script = self.coin.script_pubkey();
        match &self.key {
            TestKey::Ecdsa(key) => OwnershipProof::sign_p2wpkh(key, script, commitment),
            TestKey::Schnorr(key) => OwnershipProof::sign_p2tr(key, script, commitment),
        }
    }

    /// Valid proof for `state`'s round.
    pub fn proof(&self, state: &RoundState) -> OwnershipProof {
        self.proof_for(&state.commitment_data())
    }

    /// Correctly signed proof committing to a different round.
    pub fn wrong_round_proof(&self) -> OwnershipProof {
        self.proof_for(&commitment_data(
            DEFAULT_COORDINATOR_IDENTIFIER,
            &RoundId([0xEE; 32]),
        ))
    }

    /// Registration with a valid proof, a fresh alice id and `received_at = 0`.
    pub fn register(&self, state: &RoundState) -> RoundCommand {
        self.register_with_proof(state, self.proof(state))
    }

    pub fn register_with_proof(&self, state: &RoundState, proof: OwnershipProof) -> RoundCommand {
        let k = state.parameters.credential_count;
        RoundCommand::register_input(
            self.coin.clone(),
            proof,
            AliceId::new(shared_types::Uuid::new_v4()),
            zero_requests(k),
            zero_requests(k),
            0,
        )
    }

    pub fn confirm(&self, state: &RoundState, alice_id: AliceId) -> RoundCommand {
        RoundCommand::confirm_input_connection(alice_id, self.coin.clone(), self.proof(state))
    }

    /// Witness with the right shape for the coin's script.
    pub fn witness(&self) -> Witness {
        match &self.key {
            TestKey::Ecdsa(key) => {
                Witness::new(vec![vec![0x30; 72], key.public_key().to_bytes().to_vec()])
            }
            TestKey::Schnorr(_) => Witness::new(vec![vec![0x01; 64]]),
        }
    }
}
