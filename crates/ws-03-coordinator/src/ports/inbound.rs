//! Driving Ports (API - Inbound)

use crate::api::{
    ConnectionConfirmationRequest, InputRegistrationRequest, InputRegistrationResponse,
    InputsRemovalRequest, OutputRegistrationRequest, ReadyToSignRequest, RoundStatus,
    StartRoundRequest, StartRoundResponse, TransactionSignatureRequest,
};
use crate::error::CoordinatorResult;
use async_trait::async_trait;
use shared_types::RoundId;
use ws_01_round::Phase;

/// Participant-facing and coordinator-driven round operations.
///
/// Each operation maps to exactly one round command.
#[async_trait]
pub trait CoordinatorApi: Send + Sync {
    async fn start_round(&self, request: StartRoundRequest)
        -> CoordinatorResult<StartRoundResponse>;

    /// Resolve the input through the node, then register it.
    ///
    /// A retry of an identical request returns the original response,
    /// including the original alice id.
    async fn register_input(
        &self,
        request: InputRegistrationRequest,
    ) -> CoordinatorResult<InputRegistrationResponse>;

    async fn confirm_connection(
        &self,
        request: ConnectionConfirmationRequest,
    ) -> CoordinatorResult<()>;

    async fn register_output(&self, request: OutputRegistrationRequest) -> CoordinatorResult<()>;

    async fn ready_to_sign(&self, request: ReadyToSignRequest) -> CoordinatorResult<()>;

    async fn sign_transaction(&self, request: TransactionSignatureRequest)
        -> CoordinatorResult<()>;

    async fn remove_input(&self, request: InputsRemovalRequest) -> CoordinatorResult<()>;

    async fn get_status(&self, round_id: &RoundId) -> CoordinatorResult<RoundStatus>;

    /// Status of every round started by this coordinator.
    async fn get_all_statuses(&self) -> Vec<RoundStatus>;

    // Coordinator-driven phase changes; each returns the phase reached.

    async fn start_connection_confirmation(&self, round_id: &RoundId) -> CoordinatorResult<Phase>;

    async fn start_output_registration(&self, round_id: &RoundId) -> CoordinatorResult<Phase>;

    async fn start_transaction_signing(&self, round_id: &RoundId) -> CoordinatorResult<Phase>;

    async fn succeed_round(&self, round_id: &RoundId) -> CoordinatorResult<Phase>;

    async fn end_round(&self, round_id: &RoundId) -> CoordinatorResult<Phase>;
}
