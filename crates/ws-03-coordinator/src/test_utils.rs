//! Deterministic collaborators and a wired-up service for tests.

#![allow(clippy::expect_used)]

use crate::adapters::InMemoryUtxoSet;
use crate::api::{InputRegistrationRequest, StartRoundRequest};
use crate::config::CoordinatorConfig;
use crate::ports::{CoordinatorApi, TimeSource, UnguessableIdGenerator};
use crate::service::CoordinatorService;
use shared_types::{OutPoint, RoundId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;
use ws_01_round::test_utils::{zero_requests, MockCredentialIssuer, TestAlice};
use ws_01_round::{RoundCommandProcessor, RoundState};
use ws_02_event_store::{EventStore, InMemoryEventStore};

/// Ids 1, 2, 3, ... Predictable, so never use outside tests.
#[derive(Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnguessableIdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

/// Clock that only moves when told to.
#[derive(Default)]
pub struct FixedTimeSource {
    now: AtomicU64,
}

impl FixedTimeSource {
    pub fn new(now_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: u64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub type TestStore = InMemoryEventStore<RoundCommandProcessor>;

pub type TestService =
    CoordinatorService<TestStore, InMemoryUtxoSet, SequentialIdGenerator, FixedTimeSource>;

/// Service wired to in-memory collaborators, with handles to each of them.
pub struct TestCoordinator {
    pub service: TestService,
    pub store: Arc<TestStore>,
    pub utxos: Arc<InMemoryUtxoSet>,
    pub amount_issuer: Arc<MockCredentialIssuer>,
    pub vsize_issuer: Arc<MockCredentialIssuer>,
    pub clock: Arc<FixedTimeSource>,
}

impl Default for TestCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCoordinator {
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    pub fn with_config(config: CoordinatorConfig) -> Self {
        Self::with_issuers(
            config,
            Arc::new(MockCredentialIssuer::new()),
            Arc::new(MockCredentialIssuer::new()),
        )
    }

    pub fn with_issuers(
        config: CoordinatorConfig,
        amount_issuer: Arc<MockCredentialIssuer>,
        vsize_issuer: Arc<MockCredentialIssuer>,
    ) -> Self {
        let processor = RoundCommandProcessor::new(amount_issuer.clone(), vsize_issuer.clone());
        let store = Arc::new(InMemoryEventStore::new(Arc::new(processor)));
        let utxos = Arc::new(InMemoryUtxoSet::new());
        let clock = Arc::new(FixedTimeSource::new(0));
        let service = CoordinatorService::new(
            config,
            store.clone(),
            utxos.clone(),
            Arc::new(SequentialIdGenerator::new()),
            clock.clone(),
        );
        Self {
            service,
            store,
            utxos,
            amount_issuer,
            vsize_issuer,
            clock,
        }
    }

    /// Start a round with the configured parameters.
    pub async fn start_round(&self, allowed: Option<Vec<OutPoint>>) -> RoundId {
        self.service
            .start_round(StartRoundRequest {
                parameters: None,
                allowed_inputs: allowed.map(|outpoints| outpoints.into_iter().collect()),
            })
            .await
            .expect("round starts")
            .round_id
    }

    /// Make the alice's coin a confirmed unspent output.
    pub fn fund(&self, alice: &TestAlice) {
        self.utxos.insert_coin(&alice.coin, 6);
    }

    pub async fn round_state(&self, round_id: &RoundId) -> RoundState {
        self.store.load(round_id).await
    }

    /// Well-formed registration of `alice` into `state`'s round.
    pub fn registration(&self, state: &RoundState, alice: &TestAlice) -> InputRegistrationRequest {
        let k = state.parameters.credential_count;
        InputRegistrationRequest {
            round_id: state.id,
            input: alice.coin.outpoint,
            ownership_proof: alice.proof(state),
            zero_amount_credential_requests: zero_requests(k),
            zero_vsize_credential_requests: zero_requests(k),
        }
    }
}
