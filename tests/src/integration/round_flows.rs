//! # Round Flows
//!
//! The round command processor running inside the in-memory event store.
//!
//! ## Flows Tested:
//!
//! 1. **Whitelisted registration**: events, quota decrement, rejection of
//!    outpoints outside the allow list without any state change
//! 2. **Phase discipline**: out-of-phase commands name expected and actual phase
//! 3. **Lifecycle**: every advance command in order, terminal after `Ended`
//! 4. **Idempotency**: retries served from the committed log, across restores
//! 5. **Serialization**: concurrent registrations into one round

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use shared_types::{AliceId, IdempotenceId, OutPoint, RoundId, ScriptPubKey, TxOut};
    use ws_01_round::test_utils::{processor, processor_with, MockCredentialIssuer, TestAlice};
    use ws_01_round::{
        Phase, RoundCommand, RoundCommandProcessor, RoundError, RoundEvent, RoundOutcome,
        RoundParameters, RoundState,
    };
    use ws_02_event_store::{CommandOutcome, EventStore, EventStoreError, InMemoryEventStore};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const ROUND: RoundId = RoundId([0x07; 32]);

    /// Vsize every registration commits, whatever its script type.
    const ALICE_ALLOCATION: u64 = 255;

    type Store = InMemoryEventStore<RoundCommandProcessor>;

    fn store() -> Arc<Store> {
        Arc::new(InMemoryEventStore::new(Arc::new(processor())))
    }

    async fn start(store: &Store, allowed: Option<Vec<OutPoint>>) -> RoundState {
        let command = RoundCommand::start_round(
            RoundParameters::default(),
            allowed.map(|outpoints| outpoints.into_iter().collect()),
        );
        store.process_command(command, &ROUND).await.unwrap().state
    }

    fn rejection(error: EventStoreError<Vec<RoundError>>) -> Vec<RoundError> {
        error.rejection().cloned().expect("command rejected")
    }

    fn registered_alice(outcome: &CommandOutcome<RoundState>) -> AliceId {
        outcome
            .events()
            .find_map(|event| match event {
                RoundEvent::InputRegistered { alice_id, .. } => Some(*alice_id),
                _ => None,
            })
            .expect("registration event")
    }

    fn names(outcome: &CommandOutcome<RoundState>) -> Vec<&'static str> {
        outcome.events().map(RoundEvent::name).collect()
    }

    /// Same command under a token no earlier command used.
    fn fresh(command: RoundCommand) -> RoundCommand {
        command.with_idempotence_id(IdempotenceId::new_random())
    }

    // =============================================================================
    // REGISTRATION
    // =============================================================================

    #[tokio::test]
    async fn test_whitelisted_registration_and_foreign_outpoint() {
        let store = store();
        let alice = TestAlice::p2wpkh(1, 100_000);
        let stranger = TestAlice::p2wpkh(2, 100_000);
        let state = start(&store, Some(vec![alice.coin.outpoint])).await;

        let outcome = store
            .process_command(alice.register(&state), &ROUND)
            .await
            .unwrap();
        assert_eq!(names(&outcome), vec!["InputRegistered", "CredentialsIssued"]);
        assert_eq!(
            outcome.state.remaining_vsize_allocation,
            state.remaining_vsize_allocation - ALICE_ALLOCATION
        );

        let log_len = store.events(&ROUND).await.len();
        let error = store
            .process_command(stranger.register(&outcome.state), &ROUND)
            .await
            .unwrap_err();
        assert_eq!(
            rejection(error),
            vec![RoundError::InputNotWhitelisted(stranger.coin.outpoint)]
        );
        assert_eq!(store.events(&ROUND).await.len(), log_len);
        assert_eq!(store.load(&ROUND).await, outcome.state);
    }

    #[tokio::test]
    async fn test_whitelist_wins_over_bad_proof() {
        let store = store();
        let stranger = TestAlice::p2wpkh(2, 100_000);
        let state = start(&store, Some(vec![])).await;

        let command = stranger.register_with_proof(&state, stranger.wrong_round_proof());
        let error = store.process_command(command, &ROUND).await.unwrap_err();
        assert_eq!(
            rejection(error),
            vec![RoundError::InputNotWhitelisted(stranger.coin.outpoint)]
        );
    }

    #[tokio::test]
    async fn test_invalid_proof_produces_no_events() {
        let store = store();
        let alice = TestAlice::p2tr(3, 100_000);
        let state = start(&store, Some(vec![alice.coin.outpoint])).await;

        let command = alice.register_with_proof(&state, alice.wrong_round_proof());
        let error = store.process_command(command, &ROUND).await.unwrap_err();
        assert!(rejection(error).contains(&RoundError::WrongOwnershipProof));
        assert_eq!(store.events(&ROUND).await.len(), 2);
        assert_eq!(store.load(&ROUND).await, state);
    }

    // =============================================================================
    // PHASES
    // =============================================================================

    #[tokio::test]
    async fn test_registration_during_output_registration() {
        let store = store();
        let state = start(&store, None).await;
        store
            .process_command(RoundCommand::start_connection_confirmation(), &ROUND)
            .await
            .unwrap();
        let before = store
            .process_command(RoundCommand::start_output_registration(), &ROUND)
            .await
            .unwrap()
            .state;

        let alice = TestAlice::p2wpkh(1, 100_000);
        let error = store
            .process_command(alice.register(&state), &ROUND)
            .await
            .unwrap_err();
        assert_eq!(
            rejection(error),
            vec![RoundError::PhaseMismatch {
                command: "RegisterInput",
                expected: vec![Phase::InputRegistration],
                actual: Phase::OutputRegistration,
            }]
        );

        let after = store.load(&ROUND).await;
        assert_eq!(after, before);
        assert_eq!(after.phase, Phase::OutputRegistration);
    }

    #[tokio::test]
    async fn test_full_lifecycle_is_terminal() {
        let store = store();
        let alice = TestAlice::p2wpkh(1, 100_000);
        let state = start(&store, None).await;
        assert_eq!(state.phase, Phase::InputRegistration);

        let registration = store
            .process_command(alice.register(&state), &ROUND)
            .await
            .unwrap();
        let alice_id = registered_alice(&registration);

        let steps = [
            (
                RoundCommand::start_connection_confirmation(),
                Phase::ConnectionConfirmation,
            ),
            (alice.confirm(&state, alice_id), Phase::ConnectionConfirmation),
            (
                RoundCommand::start_output_registration(),
                Phase::OutputRegistration,
            ),
            (
                RoundCommand::register_output(TxOut::new(
                    90_000,
                    ScriptPubKey::new_p2wpkh([0xA1; 20]),
                )),
                Phase::OutputRegistration,
            ),
            (RoundCommand::start_transaction_signing(), Phase::Signing),
            (
                RoundCommand::notify_input_ready_to_sign(alice_id),
                Phase::Signing,
            ),
            (
                RoundCommand::add_signature(alice.coin.outpoint, alice.witness()),
                Phase::Signing,
            ),
            (RoundCommand::succeed_round(), Phase::Ended),
        ];
        for (command, phase) in steps {
            let name = ws_02_event_store::Command::name(&command);
            let outcome = store.process_command(command, &ROUND).await.unwrap();
            assert_eq!(outcome.state.phase, phase, "after {name}");
        }
        let ended = store.load(&ROUND).await;
        assert_eq!(ended.outcome, Some(RoundOutcome::Succeeded));

        for command in [
            RoundCommand::start_round(RoundParameters::default(), None),
            RoundCommand::start_connection_confirmation(),
            RoundCommand::start_output_registration(),
            RoundCommand::start_transaction_signing(),
            RoundCommand::succeed_round(),
        ] {
            let error = store.process_command(fresh(command), &ROUND).await.unwrap_err();
            assert!(matches!(
                rejection(error)[..],
                [RoundError::PhaseMismatch {
                    actual: Phase::Ended,
                    ..
                }]
            ));
        }

        let again = store
            .process_command(fresh(RoundCommand::end_round()), &ROUND)
            .await
            .unwrap();
        assert!(!again.replayed);
        assert_eq!(again.state.phase, Phase::Ended);
        assert_eq!(again.state.outcome, Some(RoundOutcome::Succeeded));
        assert_eq!(store.rebuild(&ROUND).await.unwrap(), again.state);
    }

    // =============================================================================
    // IDEMPOTENCY
    // =============================================================================

    #[tokio::test]
    async fn test_retried_registration_is_served_from_the_log() {
        let amount_issuer = Arc::new(MockCredentialIssuer::new());
        let vsize_issuer = Arc::new(MockCredentialIssuer::new());
        let store = Arc::new(InMemoryEventStore::new(Arc::new(processor_with(
            amount_issuer.clone(),
            vsize_issuer.clone(),
        ))));
        let alice = TestAlice::p2wpkh(1, 100_000);
        let state = start(&store, None).await;

        let first = store
            .process_command(alice.register(&state), &ROUND)
            .await
            .unwrap();
        let log = store.events(&ROUND).await;

        // The retry carries a new alice id; the original one comes back.
        let retry = store
            .process_command(alice.register(&state), &ROUND)
            .await
            .unwrap();
        assert!(retry.replayed);
        assert_eq!(retry.new_events, first.new_events);
        assert_eq!(registered_alice(&retry), registered_alice(&first));
        assert_eq!(store.events(&ROUND).await, log);
        assert_eq!(amount_issuer.calls(), 1);
        assert_eq!(vsize_issuer.calls(), 1);
        assert_eq!(store.replays_served(), 1);
    }

    #[tokio::test]
    async fn test_rejections_are_not_cached() {
        let store = store();
        let alice = TestAlice::p2wpkh(1, 100_000);
        let state = start(&store, None).await;

        let early = store
            .process_command(RoundCommand::start_transaction_signing(), &ROUND)
            .await;
        assert!(early.is_err());

        store
            .process_command(alice.register(&state), &ROUND)
            .await
            .unwrap();
        for command in [
            RoundCommand::start_connection_confirmation(),
            RoundCommand::start_output_registration(),
        ] {
            store.process_command(command, &ROUND).await.unwrap();
        }
        let outcome = store
            .process_command(RoundCommand::start_transaction_signing(), &ROUND)
            .await
            .unwrap();
        assert!(!outcome.replayed);
        assert_eq!(outcome.state.phase, Phase::Signing);
    }

    #[tokio::test]
    async fn test_restored_store_keeps_idempotency() {
        let source = store();
        let alice = TestAlice::p2wpkh(1, 100_000);
        let state = start(&source, None).await;
        let first = source
            .process_command(alice.register(&state), &ROUND)
            .await
            .unwrap();

        let target = store();
        let restored = target
            .restore(&ROUND, source.events(&ROUND).await)
            .await
            .unwrap();
        assert_eq!(restored, source.load(&ROUND).await);

        let retry = target
            .process_command(alice.register(&state), &ROUND)
            .await
            .unwrap();
        assert!(retry.replayed);
        assert_eq!(registered_alice(&retry), registered_alice(&first));
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_commit_atomically() {
        let issuer = Arc::new(MockCredentialIssuer::with_delay(Duration::from_millis(5)));
        let store = Arc::new(InMemoryEventStore::new(Arc::new(processor_with(
            issuer.clone(),
            issuer,
        ))));
        let state = start(&store, None).await;

        let handles: Vec<_> = (1..=8u8)
            .map(|seed| {
                let store = store.clone();
                let state = state.clone();
                tokio::spawn(async move {
                    let alice = TestAlice::p2wpkh(seed, 100_000);
                    store.process_command(alice.register(&state), &ROUND).await
                })
            })
            .collect();
        for handle in handles {
            assert!(!handle.await.unwrap().unwrap().replayed);
        }

        let after = store.load(&ROUND).await;
        assert_eq!(after.inputs.len(), 8);
        assert_eq!(
            after.remaining_vsize_allocation,
            state.remaining_vsize_allocation - 8 * ALICE_ALLOCATION
        );

        let log = store.events(&ROUND).await;
        let sequences: Vec<u64> = log.iter().map(|stored| stored.sequence).collect();
        assert_eq!(sequences, (1..=log.len() as u64).collect::<Vec<_>>());

        // Each registration's two events sit next to each other.
        for pair in log[2..].chunks(2) {
            match (&pair[0].event, &pair[1].event) {
                (
                    RoundEvent::InputRegistered { alice_id: a, .. },
                    RoundEvent::CredentialsIssued { alice_id: b, .. },
                ) => assert_eq!(a, b),
                other => panic!("interleaved registration: {other:?}"),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_retries_commit_once() {
        let store = store();
        let state = start(&store, None).await;

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let state = state.clone();
                tokio::spawn(async move {
                    let alice = TestAlice::p2wpkh(9, 200_000);
                    store
                        .process_command(alice.register(&state), &ROUND)
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }
        assert_eq!(outcomes.iter().filter(|o| !o.replayed).count(), 1);
        let alice_id = registered_alice(&outcomes[0]);
        assert!(outcomes.iter().all(|o| registered_alice(o) == alice_id));
        assert_eq!(store.load(&ROUND).await.inputs.len(), 1);
    }
}
