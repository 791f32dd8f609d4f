//! # Integration Flows
//!
//! Round commands driven through the event store, and the coordinator
//! service driven end to end over its inbound port.

pub mod coordinator_flows;
pub mod round_flows;
