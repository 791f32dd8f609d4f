//! # Round Coordination Service
//!
//! Turns participant requests into round commands and runs them through the
//! event store. The service owns no round state: everything it reports is
//! read back from committed events.
//!
//! ## Request Flow
//!
//! ```text
//! request ─► known round? ─► resolve outpoint ─► command ─► EventStore::process_command
//!                │                  │                                │
//!          RoundNotFound     InputSpent                     committed events ─► response
//!                            InputUnconfirmed                        │
//!                            InputImmature               client-visible ─► bus
//! ```

use crate::api::{
    ConnectionConfirmationRequest, InputRegistrationRequest, InputRegistrationResponse,
    InputsRemovalRequest, OutputRegistrationRequest, ReadyToSignRequest, RoundStatus,
    StartRoundRequest, StartRoundResponse, TransactionSignatureRequest,
};
use crate::config::CoordinatorConfig;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::error_codes::ProtocolErrorCode;
use crate::metrics;
use crate::notification::RoundNotification;
use crate::ports::{CoordinatorApi, OutpointResolver, TimeSource, UnguessableIdGenerator};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_bus::{
    EventFilter, EventPublisher, EventStream, EventSubscriber, InMemoryEventBus, Subscription,
};
use shared_types::{AliceId, Coin, ContentHasher, IdempotenceId, OutPoint, RoundId, TxOut};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use ws_01_round::{
    Phase, RoundCommand, RoundCommandProcessor, RoundError, RoundEvent, RoundState,
};
use ws_02_event_store::{Command, CommandOutcome, EventStore, StoredEvent};

/// Round Coordination Service
pub struct CoordinatorService<S, R, G, T>
where
    S: EventStore<RoundCommandProcessor>,
    R: OutpointResolver,
    G: UnguessableIdGenerator,
    T: TimeSource,
{
    config: CoordinatorConfig,
    store: Arc<S>,
    resolver: Arc<R>,
    id_generator: Arc<G>,
    clock: Arc<T>,
    bus: Arc<InMemoryEventBus<RoundNotification>>,
    /// Rounds started through this service, for status listing
    rounds: RwLock<BTreeSet<RoundId>>,
}

impl<S, R, G, T> CoordinatorService<S, R, G, T>
where
    S: EventStore<RoundCommandProcessor>,
    R: OutpointResolver,
    G: UnguessableIdGenerator,
    T: TimeSource,
{
    pub fn new(
        config: CoordinatorConfig,
        store: Arc<S>,
        resolver: Arc<R>,
        id_generator: Arc<G>,
        clock: Arc<T>,
    ) -> Self {
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_bus_capacity));
        Self {
            config,
            store,
            resolver,
            id_generator,
            clock,
            bus,
            rounds: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Rounds started through this service.
    pub fn round_ids(&self) -> Vec<RoundId> {
        self.rounds.read().iter().copied().collect()
    }

    /// Receive client-visible events of committed commands.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription<RoundNotification> {
        self.bus.subscribe(filter)
    }

    pub fn event_stream(&self, filter: EventFilter) -> EventStream<RoundNotification> {
        self.bus.event_stream(filter)
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    /// Current state of a started round.
    async fn known_round(&self, round_id: &RoundId) -> CoordinatorResult<RoundState> {
        let state = self.store.load(round_id).await;
        if state.phase == Phase::New {
            return Err(CoordinatorError::RoundNotFound(*round_id));
        }
        Ok(state)
    }

    /// Resolve an outpoint through the node and apply the input policy.
    async fn resolve_coin(
        &self,
        command: &'static str,
        outpoint: &OutPoint,
    ) -> CoordinatorResult<Coin> {
        let info = self
            .resolver
            .get_tx_out(outpoint, self.config.include_mempool)
            .await
            .map_err(|e| {
                warn!(%outpoint, error = %e, "Outpoint lookup failed");
                e
            })?;

        let Some(info) = info else {
            return Err(self.refuse(command, RoundError::InputSpent(*outpoint)));
        };
        if info.confirmations < self.config.min_input_confirmations {
            return Err(self.refuse(
                command,
                RoundError::InputUnconfirmed {
                    outpoint: *outpoint,
                    confirmations: info.confirmations,
                    required: self.config.min_input_confirmations,
                },
            ));
        }
        if info.is_coinbase && info.confirmations <= self.config.coinbase_maturity {
            return Err(self.refuse(command, RoundError::InputImmature(*outpoint)));
        }
        Ok(Coin::new(*outpoint, info.txout))
    }

    /// Rejection raised before a command reaches the round.
    fn refuse(&self, command: &'static str, error: RoundError) -> CoordinatorError {
        warn!(command, error = %error, "Input refused by outpoint policy");
        metrics::record_command_rejected(command, error.kind().as_str());
        CoordinatorError::from(error)
    }

    /// Run one command and account for its outcome.
    async fn dispatch(
        &self,
        round_id: RoundId,
        previous_phase: Phase,
        command: RoundCommand,
    ) -> CoordinatorResult<CommandOutcome<RoundState>> {
        let name = command.name();
        match self.store.process_command(command, &round_id).await {
            Ok(outcome) if outcome.replayed => {
                debug!(round_id = %round_id, command = name, "Command replayed");
                metrics::record_command_replayed(name);
                Ok(outcome)
            }
            Ok(outcome) => {
                metrics::record_command_accepted(name);
                self.observe(round_id, previous_phase, &outcome.new_events)
                    .await;
                Ok(outcome)
            }
            Err(e) => {
                match e.rejection() {
                    Some(errors) => {
                        let kind = errors
                            .first()
                            .map(|e| e.kind().as_str())
                            .unwrap_or("unknown");
                        let code = errors
                            .first()
                            .map(ProtocolErrorCode::from)
                            .unwrap_or(ProtocolErrorCode::InternalError);
                        info!(round_id = %round_id, command = name, %code, "Command rejected");
                        metrics::record_command_rejected(name, kind);
                    }
                    None => error!(
                        round_id = %round_id,
                        command = name,
                        error = %e,
                        "Event store failure"
                    ),
                }
                Err(e.into())
            }
        }
    }

    /// Log, count and publish freshly committed events.
    async fn observe(
        &self,
        round_id: RoundId,
        previous_phase: Phase,
        events: &[StoredEvent<RoundEvent>],
    ) {
        for stored in events {
            match &stored.event {
                RoundEvent::RoundStarted { .. } => {
                    metrics::record_round_started();
                    info!(round_id = %round_id, "Round started");
                }
                RoundEvent::InputRegistered { alice_id, coin, .. } => {
                    metrics::record_input_registered();
                    debug!(
                        round_id = %round_id,
                        alice_id = %alice_id,
                        outpoint = %coin.outpoint,
                        "Input registered"
                    );
                }
                RoundEvent::InputUnregistered { alice_id, outpoint } => {
                    debug!(
                        round_id = %round_id,
                        alice_id = %alice_id,
                        %outpoint,
                        "Input unregistered"
                    );
                }
                RoundEvent::InputConnectionConfirmationStarted => {
                    info!(
                        round_id = %round_id,
                        phase = %Phase::ConnectionConfirmation,
                        "Phase changed"
                    );
                }
                RoundEvent::OutputRegistrationStarted => {
                    info!(
                        round_id = %round_id,
                        phase = %Phase::OutputRegistration,
                        "Phase changed"
                    );
                }
                RoundEvent::SigningStarted => {
                    info!(
                        round_id = %round_id,
                        phase = %Phase::Signing,
                        "Phase changed"
                    );
                }
                RoundEvent::RoundEnded { outcome } if previous_phase != Phase::Ended => {
                    metrics::record_round_ended(outcome.as_str());
                    info!(round_id = %round_id, outcome = outcome.as_str(), "Round ended");
                }
                _ => {}
            }

            if let Some(notification) = RoundNotification::from_stored(round_id, stored) {
                self.bus.publish(notification).await;
            }
        }
    }

    /// Phase advance decided by the coordinator.
    ///
    /// Each call is a new decision, so it gets a fresh token instead of the
    /// content-derived one: repeating an advance after the round moved on is
    /// refused rather than replayed. Ending is the exception, see `end_round`.
    async fn advance(&self, round_id: &RoundId, command: RoundCommand) -> CoordinatorResult<Phase> {
        let state = self.known_round(round_id).await?;
        let token = IdempotenceId::new(self.id_generator.next_id());
        let command = command.with_idempotence_id(token);
        let outcome = self.dispatch(*round_id, state.phase, command).await?;
        Ok(outcome.state.phase)
    }

    async fn status_of(&self, round_id: &RoundId) -> CoordinatorResult<RoundStatus> {
        let state = self.known_round(round_id).await?;
        let log = self.store.events(round_id).await;
        Ok(RoundStatus::new(&state, &log))
    }
}

/// Extract the registration response from committed events.
fn registration_response(
    round_id: &RoundId,
    events: &[StoredEvent<RoundEvent>],
) -> CoordinatorResult<InputRegistrationResponse> {
    let registered = events.iter().find_map(|stored| match &stored.event {
        RoundEvent::InputRegistered { alice_id, .. } => Some(*alice_id),
        _ => None,
    });
    let issued = events.iter().find_map(|stored| match &stored.event {
        RoundEvent::CredentialsIssued {
            alice_id,
            amount_credentials,
            vsize_credentials,
        } if Some(*alice_id) == registered => Some(InputRegistrationResponse {
            alice_id: *alice_id,
            amount_credentials: amount_credentials.clone(),
            vsize_credentials: vsize_credentials.clone(),
        }),
        _ => None,
    });
    issued.ok_or_else(|| {
        CoordinatorError::Store(format!(
            "registration in round {round_id} committed without credentials"
        ))
    })
}

#[async_trait]
impl<S, R, G, T> CoordinatorApi for CoordinatorService<S, R, G, T>
where
    S: EventStore<RoundCommandProcessor>,
    R: OutpointResolver,
    G: UnguessableIdGenerator,
    T: TimeSource,
{
    async fn start_round(
        &self,
        request: StartRoundRequest,
    ) -> CoordinatorResult<StartRoundResponse> {
        let parameters = request
            .parameters
            .unwrap_or_else(|| self.config.round_parameters.clone());
        // The nonce keeps rounds with equal parameters apart.
        let round_id = RoundId(
            ContentHasher::new("RoundId")
                .field(&parameters)
                .bytes(self.id_generator.next_id().as_bytes())
                .digest(),
        );

        let command = RoundCommand::start_round(parameters, request.allowed_inputs);
        self.dispatch(round_id, Phase::New, command).await?;
        self.rounds.write().insert(round_id);
        Ok(StartRoundResponse { round_id })
    }

    async fn register_input(
        &self,
        request: InputRegistrationRequest,
    ) -> CoordinatorResult<InputRegistrationResponse> {
        let state = self.known_round(&request.round_id).await?;
        let coin = self.resolve_coin("RegisterInput", &request.input).await?;

        let command = RoundCommand::register_input(
            coin,
            request.ownership_proof,
            AliceId::new(self.id_generator.next_id()),
            request.zero_amount_credential_requests,
            request.zero_vsize_credential_requests,
            self.clock.now_millis(),
        );
        let outcome = self.dispatch(request.round_id, state.phase, command).await?;
        registration_response(&request.round_id, &outcome.new_events)
    }

    async fn confirm_connection(
        &self,
        request: ConnectionConfirmationRequest,
    ) -> CoordinatorResult<()> {
        let state = self.known_round(&request.round_id).await?;
        // Resolving again also catches inputs spent since registration.
        let coin = self
            .resolve_coin("ConfirmInputConnection", &request.input)
            .await?;
        let command =
            RoundCommand::confirm_input_connection(request.alice_id, coin, request.ownership_proof);
        self.dispatch(request.round_id, state.phase, command).await?;
        Ok(())
    }

    async fn register_output(&self, request: OutputRegistrationRequest) -> CoordinatorResult<()> {
        let state = self.known_round(&request.round_id).await?;
        let output = TxOut::new(request.value, request.script_pubkey);
        // Output requests are anonymous, so the output alone cannot tell two
        // senders apart. A duplicate script must be refused, not replayed.
        let token = IdempotenceId::new(self.id_generator.next_id());
        let command = RoundCommand::register_output(output).with_idempotence_id(token);
        self.dispatch(request.round_id, state.phase, command).await?;
        Ok(())
    }

    async fn ready_to_sign(&self, request: ReadyToSignRequest) -> CoordinatorResult<()> {
        let state = self.known_round(&request.round_id).await?;
        let command = RoundCommand::notify_input_ready_to_sign(request.alice_id);
        self.dispatch(request.round_id, state.phase, command).await?;
        Ok(())
    }

    async fn sign_transaction(
        &self,
        request: TransactionSignatureRequest,
    ) -> CoordinatorResult<()> {
        let state = self.known_round(&request.round_id).await?;
        let command = RoundCommand::add_signature(request.input, request.witness);
        self.dispatch(request.round_id, state.phase, command).await?;
        Ok(())
    }

    async fn remove_input(&self, request: InputsRemovalRequest) -> CoordinatorResult<()> {
        let state = self.known_round(&request.round_id).await?;
        let command = RoundCommand::remove_input(request.alice_id);
        self.dispatch(request.round_id, state.phase, command).await?;
        Ok(())
    }

    async fn get_status(&self, round_id: &RoundId) -> CoordinatorResult<RoundStatus> {
        self.status_of(round_id).await
    }

    async fn get_all_statuses(&self) -> Vec<RoundStatus> {
        let mut statuses = Vec::new();
        for round_id in self.round_ids() {
            if let Ok(status) = self.status_of(&round_id).await {
                statuses.push(status);
            }
        }
        statuses
    }

    async fn start_connection_confirmation(&self, round_id: &RoundId) -> CoordinatorResult<Phase> {
        self.advance(round_id, RoundCommand::start_connection_confirmation())
            .await
    }

    async fn start_output_registration(&self, round_id: &RoundId) -> CoordinatorResult<Phase> {
        self.advance(round_id, RoundCommand::start_output_registration())
            .await
    }

    async fn start_transaction_signing(&self, round_id: &RoundId) -> CoordinatorResult<Phase> {
        self.advance(round_id, RoundCommand::start_transaction_signing())
            .await
    }

    async fn succeed_round(&self, round_id: &RoundId) -> CoordinatorResult<Phase> {
        self.advance(round_id, RoundCommand::succeed_round()).await
    }

    async fn end_round(&self, round_id: &RoundId) -> CoordinatorResult<Phase> {
        let state = self.known_round(round_id).await?;
        if state.phase == Phase::Ended {
            debug!(round_id = %round_id, "Round already ended");
            return Ok(Phase::Ended);
        }
        // The content-derived token collapses racing ends into one commit.
        let outcome = self
            .dispatch(*round_id, state.phase, RoundCommand::end_round())
            .await?;
        Ok(outcome.state.phase)
    }
}
