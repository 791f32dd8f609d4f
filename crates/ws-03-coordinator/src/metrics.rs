//! # Coordinator Metrics
//!
//! Prometheus metrics for round processing.
//!
//! ## Usage
//!
//! Enabled by the default `metrics` feature. Collectors register on the
//! default registry; `coordinator_telemetry::encode_metrics()` renders them.
//!
//! ## Metrics Exported
//!
//! - `ws_commands_accepted_total` - Commands whose events were committed (by command)
//! - `ws_commands_rejected_total` - Rejected commands (by command and error kind)
//! - `ws_commands_replayed_total` - Commands answered from the idempotency cache
//! - `ws_inputs_registered_total` - Inputs registered across all rounds
//! - `ws_rounds_started_total` - Rounds started
//! - `ws_rounds_ended_total` - Rounds ended (by outcome)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Committed commands, labeled by command
    pub static ref COMMANDS_ACCEPTED: IntCounterVec = register_int_counter_vec!(
        "ws_commands_accepted_total",
        "Total number of commands whose events were committed",
        &["command"]
    )
    .expect("Failed to create COMMANDS_ACCEPTED metric");

    /// Rejected commands, labeled by command and error kind
    pub static ref COMMANDS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "ws_commands_rejected_total",
        "Total number of commands rejected by the round",
        &["command", "kind"]
    )
    .expect("Failed to create COMMANDS_REJECTED metric");

    /// Idempotent replays
    pub static ref COMMANDS_REPLAYED: IntCounterVec = register_int_counter_vec!(
        "ws_commands_replayed_total",
        "Total number of commands answered from the idempotency cache",
        &["command"]
    )
    .expect("Failed to create COMMANDS_REPLAYED metric");

    /// Registered inputs
    pub static ref INPUTS_REGISTERED: IntCounter = register_int_counter!(
        "ws_inputs_registered_total",
        "Total number of inputs registered"
    )
    .expect("Failed to create INPUTS_REGISTERED metric");

    /// Started rounds
    pub static ref ROUNDS_STARTED: IntCounter = register_int_counter!(
        "ws_rounds_started_total",
        "Total number of rounds started"
    )
    .expect("Failed to create ROUNDS_STARTED metric");

    /// Ended rounds, labeled by outcome
    pub static ref ROUNDS_ENDED: IntCounterVec = register_int_counter_vec!(
        "ws_rounds_ended_total",
        "Total number of rounds ended",
        &["outcome"]
    )
    .expect("Failed to create ROUNDS_ENDED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_command_accepted(command: &str) {
    COMMANDS_ACCEPTED.with_label_values(&[command]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_command_rejected(command: &str, kind: &str) {
    COMMANDS_REJECTED.with_label_values(&[command, kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_command_replayed(command: &str) {
    COMMANDS_REPLAYED.with_label_values(&[command]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_input_registered() {
    INPUTS_REGISTERED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_round_started() {
    ROUNDS_STARTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_round_ended(outcome: &str) {
    ROUNDS_ENDED.with_label_values(&[outcome]).inc();
}

// No-op implementations when metrics feature is disabled

#[cfg(not(feature = "metrics"))]
pub fn record_command_accepted(_command: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_command_rejected(_command: &str, _kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_command_replayed(_command: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_input_registered() {}

#[cfg(not(feature = "metrics"))]
pub fn record_round_started() {}

#[cfg(not(feature = "metrics"))]
pub fn record_round_ended(_outcome: &str) {}
