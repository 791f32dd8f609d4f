//! Global `tracing` subscriber.
//!
//! Coordinator spans carry `round_id`, so JSON records can be grouped per
//! round by whatever ships the logs.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::Directive {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

/// Install the process-wide subscriber. Fails if one is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let registry = tracing_subscriber::registry().with(filter(&config.directive)?);
    let source = config.source_location;

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_file(source)
                    .with_line_number(source),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_file(source).with_line_number(source))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_file(source).with_line_number(source))
            .try_init(),
    };
    installed.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(format = ?config.format, directive = %config.directive, "Logging initialized");
    Ok(())
}
