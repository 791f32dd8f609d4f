//! # WS-03 Coordinator
//!
//! The round coordination service: the thin layer between participants and
//! the round aggregate.
//!
//! ## Responsibilities
//!
//! | Concern | Where |
//! |---------|-------|
//! | Outpoint resolution and input policy | [`CoordinatorService`] via [`OutpointResolver`] |
//! | Participant secrets | [`UnguessableIdGenerator`] |
//! | Command dispatch | `ws-02-event-store` running `ws-01-round`'s processor |
//! | Stable error classification | [`ProtocolErrorCode`] |
//! | Client notifications | `shared-bus`, [`RoundNotification`] |
//! | Metrics | [`metrics`], default `metrics` feature |
//!
//! ## Input Policy
//!
//! Checked before a `RegisterInput` command is built, from the node's view of
//! the outpoint:
//!
//! | Node answer | Result |
//! |-------------|--------|
//! | not found / spent | `InputSpent` |
//! | confirmations < `min_input_confirmations` | `InputUnconfirmed` |
//! | coinbase, confirmations ≤ `coinbase_maturity` | `InputImmature` |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ports/inbound.rs   - CoordinatorApi (driving port)
//! ports/outbound.rs  - OutpointResolver, UnguessableIdGenerator, TimeSource
//! adapters/          - InMemoryUtxoSet, RandomIdGenerator, SystemTimeSource
//! service.rs         - CoordinatorService
//! api.rs             - request / response types
//! error_codes.rs     - ProtocolErrorCode
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod api;
pub mod config;
pub mod error;
pub mod error_codes;
pub mod metrics;
pub mod notification;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{InMemoryUtxoSet, RandomIdGenerator, SystemTimeSource};
pub use api::*;
pub use config::CoordinatorConfig;
pub use error::{CoordinatorError, CoordinatorResult};
pub use error_codes::ProtocolErrorCode;
pub use notification::RoundNotification;
pub use ports::{
    CoordinatorApi, OutpointResolver, RpcError, TimeSource, TxOutInfo, UnguessableIdGenerator,
};
pub use service::CoordinatorService;
