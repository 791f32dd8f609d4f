//! Prometheus text exposition.
//!
//! Collectors live next to the code they measure and register on the default
//! registry; nothing here defines metrics.

use crate::TelemetryError;
use prometheus::{Encoder, Registry, TextEncoder};

/// Render the default registry.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    encode(&prometheus::gather())
}

pub fn encode_registry(registry: &Registry) -> Result<String, TelemetryError> {
    encode(&registry.gather())
}

fn encode(families: &[prometheus::proto::MetricFamily]) -> Result<String, TelemetryError> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
