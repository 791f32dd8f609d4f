//! # Coordinator Telemetry
//!
//! Process-wide logging and the Prometheus text rendering of the metrics the
//! coordinator crates register.
//!
//! | Variable | Default | Effect |
//! |----------|---------|--------|
//! | `WS_LOG` | `info` | `EnvFilter` directive, overridden by `RUST_LOG` |
//! | `WS_LOG_FORMAT` | `pretty` (`json` in containers) | `pretty`, `compact` or `json` |
//! | `WS_LOG_SOURCE` | `false` | Attach file and line to records |

mod config;
mod logging;
mod metrics;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::init_logging;
pub use metrics::{encode_metrics, encode_registry};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log directive {directive:?}: {reason}")]
    Directive { directive: String, reason: String },

    /// Another global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),

    #[error("Metrics exposition is not UTF-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}
