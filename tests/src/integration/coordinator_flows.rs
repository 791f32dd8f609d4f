//! # Coordinator Flows
//!
//! The coordination service driven over its inbound port, with the
//! in-memory UTXO set standing in for the node.
//!
//! ## Flows Tested:
//!
//! 1. **Isolation**: concurrent registrations into independent rounds
//! 2. **Notifications**: round-scoped subscriptions over `shared-bus`
//! 3. **Input policy**: spends between phases, configured confirmation depth
//! 4. **Recovery**: issuer outages are retryable, nothing is cached

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_bus::EventFilter;
    use shared_types::RoundId;
    use ws_01_round::test_utils::{MockCredentialIssuer, TestAlice};
    use ws_01_round::{Phase, RoundEvent};
    use ws_03_coordinator::test_utils::TestCoordinator;
    use ws_03_coordinator::{
        ConnectionConfirmationRequest, CoordinatorApi, CoordinatorConfig, ProtocolErrorCode,
        RoundNotification,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn drain(
        subscription: &mut shared_bus::Subscription<RoundNotification>,
    ) -> Vec<RoundNotification> {
        let mut received = Vec::new();
        while let Ok(Some(notification)) = subscription.try_recv() {
            received.push(notification);
        }
        received
    }

    async fn confirm(
        harness: &TestCoordinator,
        round_id: RoundId,
        alice: &TestAlice,
        alice_id: shared_types::AliceId,
    ) -> Result<(), ws_03_coordinator::CoordinatorError> {
        let state = harness.round_state(&round_id).await;
        harness
            .service
            .confirm_connection(ConnectionConfirmationRequest {
                round_id,
                alice_id,
                input: alice.coin.outpoint,
                ownership_proof: alice.proof(&state),
            })
            .await
    }

    // =============================================================================
    // ISOLATION
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_across_rounds() {
        let harness = Arc::new(TestCoordinator::new());
        let rounds = [harness.start_round(None).await, harness.start_round(None).await];

        let mut handles = Vec::new();
        for seed in 1..=6u8 {
            let round_id = rounds[usize::from(seed % 2)];
            let alice = TestAlice::p2wpkh(seed, 100_000 + u64::from(seed));
            harness.fund(&alice);
            let state = harness.round_state(&round_id).await;
            let request = harness.registration(&state, &alice);
            let harness = harness.clone();
            handles.push(tokio::spawn(async move {
                let response = harness.service.register_input(request).await.unwrap();
                (round_id, alice.coin.outpoint, response.alice_id)
            }));
        }

        let mut registered = Vec::new();
        for handle in handles {
            registered.push(handle.await.unwrap());
        }
        for (round_id, outpoint, alice_id) in &registered {
            let state = harness.round_state(round_id).await;
            let (found, _) = state.alice_by_outpoint(outpoint).unwrap();
            assert_eq!(found, alice_id);
        }

        for round_id in rounds {
            let status = harness.service.get_status(&round_id).await.unwrap();
            assert_eq!(status.input_count, 3);
            assert_eq!(status.phase, Phase::InputRegistration);
        }
        let mut secrets: Vec<_> = registered.iter().map(|(_, _, id)| *id).collect();
        secrets.sort();
        secrets.dedup();
        assert_eq!(secrets.len(), 6);
    }

    // =============================================================================
    // NOTIFICATIONS
    // =============================================================================

    #[tokio::test]
    async fn test_round_scoped_subscription() {
        let harness = TestCoordinator::new();
        let watched = harness.start_round(None).await;
        let other = harness.start_round(None).await;
        let mut subscription = harness.service.subscribe(EventFilter::round(watched));

        for round_id in [other, watched] {
            harness
                .service
                .start_connection_confirmation(&round_id)
                .await
                .unwrap();
            harness.service.end_round(&round_id).await.unwrap();
        }

        let received = drain(&mut subscription);
        assert!(received.iter().all(|n| n.round_id == watched));
        let names: Vec<_> = received.iter().map(|n| n.event.name()).collect();
        assert_eq!(names, vec!["InputConnectionConfirmationStarted", "RoundEnded"]);
    }

    #[tokio::test]
    async fn test_registration_details_stay_private() {
        let harness = TestCoordinator::new();
        let mut everything = harness.service.subscribe(EventFilter::all());
        let round_id = harness.start_round(None).await;
        let alice = TestAlice::p2tr(4, 120_000);
        harness.fund(&alice);
        let state = harness.round_state(&round_id).await;
        harness
            .service
            .register_input(harness.registration(&state, &alice))
            .await
            .unwrap();

        let received = drain(&mut everything);
        assert_eq!(received.len(), 1);
        assert!(matches!(received[0].event, RoundEvent::RoundStarted { .. }));

        let status = harness.service.get_status(&round_id).await.unwrap();
        assert!(status.events.iter().all(|e| e.event.is_client_visible()));
        assert_eq!(status.input_count, 1);
    }

    // =============================================================================
    // INPUT POLICY
    // =============================================================================

    #[tokio::test]
    async fn test_input_spent_before_confirmation_is_dropped() {
        let harness = TestCoordinator::new();
        let round_id = harness.start_round(None).await;
        let state = harness.round_state(&round_id).await;
        let honest = TestAlice::p2wpkh(1, 100_000);
        let spender = TestAlice::p2wpkh(2, 100_000);

        let mut secrets = Vec::new();
        for alice in [&honest, &spender] {
            harness.fund(alice);
            let response = harness
                .service
                .register_input(harness.registration(&state, alice))
                .await
                .unwrap();
            secrets.push(response.alice_id);
        }
        harness
            .service
            .start_connection_confirmation(&round_id)
            .await
            .unwrap();

        confirm(&harness, round_id, &honest, secrets[0]).await.unwrap();
        assert!(harness.utxos.spend(&spender.coin.outpoint));
        let error = confirm(&harness, round_id, &spender, secrets[1])
            .await
            .unwrap_err();
        assert_eq!(error.code(), ProtocolErrorCode::InputSpent);

        assert_eq!(
            harness
                .service
                .start_output_registration(&round_id)
                .await
                .unwrap(),
            Phase::OutputRegistration
        );
        let status = harness.service.get_status(&round_id).await.unwrap();
        assert_eq!(status.input_count, 1);
        assert_eq!(status.confirmed_input_count, 1);
        assert_eq!(
            status.remaining_vsize_allocation,
            state.remaining_vsize_allocation - 255
        );
    }

    #[tokio::test]
    async fn test_configured_confirmation_depth() {
        let config = CoordinatorConfig::from_lookup(|key| {
            (key == "WS_MIN_INPUT_CONFIRMATIONS").then(|| "3".to_string())
        });
        let harness = TestCoordinator::with_config(config);
        let round_id = harness.start_round(None).await;
        let state = harness.round_state(&round_id).await;
        let alice = TestAlice::p2wpkh(1, 100_000);

        harness.utxos.insert_coin(&alice.coin, 2);
        let error = harness
            .service
            .register_input(harness.registration(&state, &alice))
            .await
            .unwrap_err();
        assert_eq!(error.code(), ProtocolErrorCode::InputUnconfirmed);
        assert!(harness.round_state(&round_id).await.inputs.is_empty());

        harness.utxos.insert_coin(&alice.coin, 3);
        assert!(harness
            .service
            .register_input(harness.registration(&state, &alice))
            .await
            .is_ok());
    }

    // =============================================================================
    // RECOVERY
    // =============================================================================

    #[tokio::test]
    async fn test_issuer_outage_is_retryable() {
        let amount_issuer = Arc::new(MockCredentialIssuer::new());
        let harness = TestCoordinator::with_issuers(
            CoordinatorConfig::default(),
            amount_issuer.clone(),
            Arc::new(MockCredentialIssuer::new()),
        );
        let round_id = harness.start_round(None).await;
        let state = harness.round_state(&round_id).await;
        let alice = TestAlice::p2wpkh(1, 100_000);
        harness.fund(&alice);

        amount_issuer.set_failing(true);
        let error = harness
            .service
            .register_input(harness.registration(&state, &alice))
            .await
            .unwrap_err();
        assert_eq!(error.code(), ProtocolErrorCode::CryptoException);
        assert_eq!(harness.round_state(&round_id).await, state);

        amount_issuer.set_failing(false);
        let response = harness
            .service
            .register_input(harness.registration(&state, &alice))
            .await
            .unwrap();
        let after = harness.round_state(&round_id).await;
        assert!(after.alice(&response.alice_id).is_some());
        assert_eq!(harness.store.replays_served(), 0);
    }
}
