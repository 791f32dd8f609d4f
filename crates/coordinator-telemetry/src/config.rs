use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    /// One JSON object per record, with the current span's fields
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, ()> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub directive: String,
    pub format: LogFormat,
    pub source_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            directive: "info".to_string(),
            format: LogFormat::Pretty,
            source_location: false,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let containerized = lookup("KUBERNETES_SERVICE_HOST").is_some()
            || lookup("DOCKER_CONTAINER").is_some();
        let defaults = Self::default();

        Self {
            directive: lookup("RUST_LOG")
                .or_else(|| lookup("WS_LOG"))
                .unwrap_or(defaults.directive),
            format: lookup("WS_LOG_FORMAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(if containerized {
                    LogFormat::Json
                } else {
                    defaults.format
                }),
            source_location: lookup("WS_LOG_SOURCE")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.source_location),
        }
    }
}
