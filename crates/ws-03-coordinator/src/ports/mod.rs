//! Ports of the coordination service.

pub mod inbound;
pub mod outbound;

pub use inbound::CoordinatorApi;
pub use outbound::{OutpointResolver, RpcError, TimeSource, TxOutInfo, UnguessableIdGenerator};
