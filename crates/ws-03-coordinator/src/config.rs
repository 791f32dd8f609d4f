//! Coordinator configuration.

use crate::error::{CoordinatorError, CoordinatorResult};
use serde::{Deserialize, Serialize};
use shared_types::SHARED_OVERHEAD_VSIZE;
use std::env;
use ws_01_round::{FeeRate, RoundParameters};

/// Coinbase outputs need this many confirmations before they are spendable.
pub const DEFAULT_COINBASE_MATURITY: u32 = 100;

/// Service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Parameters of rounds started without explicit ones
    pub round_parameters: RoundParameters,
    /// Accept inputs that are only in the mempool
    pub include_mempool: bool,
    /// Inputs with fewer confirmations are refused as unconfirmed
    pub min_input_confirmations: u32,
    /// Coinbase inputs need strictly more confirmations than this
    pub coinbase_maturity: u32,
    /// Buffered notifications per subscriber
    pub event_bus_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            round_parameters: RoundParameters::default(),
            include_mempool: true,
            min_input_confirmations: 1,
            coinbase_maturity: DEFAULT_COINBASE_MATURITY,
            event_bus_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl CoordinatorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `WS_COORDINATOR_IDENTIFIER`: Identifier bound into ownership proofs
    /// - `WS_MINING_FEE_RATE`: Fee rate in sat/kvB (default: 10000)
    /// - `WS_MAX_TRANSACTION_VSIZE`: Transaction size cap; the input allocation follows it
    /// - `WS_INCLUDE_MEMPOOL`: Accept unconfirmed inputs from the mempool (default: true)
    /// - `WS_MIN_INPUT_CONFIRMATIONS`: Required confirmations (default: 1)
    /// - `WS_COINBASE_MATURITY`: Coinbase maturity (default: 100)
    /// - `WS_EVENT_BUS_CAPACITY`: Notification buffer per subscriber (default: 1024)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse_u64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let parse_u32 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u32>().ok());

        let mut config = Self::default();
        let params = &mut config.round_parameters;

        if let Some(identifier) = lookup("WS_COORDINATOR_IDENTIFIER") {
            params.coordinator_identifier = identifier;
        }
        if let Some(rate) = parse_u64("WS_MINING_FEE_RATE") {
            params.mining_fee_rate = FeeRate::from_sat_per_kvb(rate);
        }
        if let Some(vsize) = parse_u64("WS_MAX_TRANSACTION_VSIZE") {
            params.max_transaction_vsize = vsize;
            params.initial_input_vsize_allocation = vsize.saturating_sub(SHARED_OVERHEAD_VSIZE);
        }
        if let Some(flag) = lookup("WS_INCLUDE_MEMPOOL") {
            config.include_mempool = parse_flag(&flag);
        }
        if let Some(confirmations) = parse_u32("WS_MIN_INPUT_CONFIRMATIONS") {
            config.min_input_confirmations = confirmations;
        }
        if let Some(maturity) = parse_u32("WS_COINBASE_MATURITY") {
            config.coinbase_maturity = maturity;
        }
        if let Some(capacity) = parse_u64("WS_EVENT_BUS_CAPACITY") {
            config.event_bus_capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
        }
        config
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> CoordinatorResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CoordinatorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoordinatorResult<()> {
        self.round_parameters
            .validate()
            .map_err(|e| CoordinatorError::Config(e.to_string()))?;
        if self.event_bus_capacity == 0 {
            return Err(CoordinatorError::Config(
                "event bus capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert!(config.include_mempool);
        assert_eq!(config.min_input_confirmations, 1);
        assert_eq!(config.coinbase_maturity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("WS_COORDINATOR_IDENTIFIER", "TestCoordinator"),
            ("WS_MINING_FEE_RATE", "2000"),
            ("WS_MAX_TRANSACTION_VSIZE", "50000"),
            ("WS_INCLUDE_MEMPOOL", "false"),
            ("WS_MIN_INPUT_CONFIRMATIONS", "0"),
        ]
        .into_iter()
        .collect();
        let config = CoordinatorConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.round_parameters.coordinator_identifier, "TestCoordinator");
        assert_eq!(config.round_parameters.mining_fee_rate, FeeRate(2000));
        assert_eq!(config.round_parameters.initial_input_vsize_allocation, 49_989);
        assert!(!config.include_mempool);
        assert_eq!(config.min_input_confirmations, 0);
        assert_eq!(config.coinbase_maturity, 100);
    }

    #[test]
    fn test_unparsable_values_keep_defaults() {
        let config = CoordinatorConfig::from_lookup(|k| {
            (k == "WS_MIN_INPUT_CONFIRMATIONS").then(|| "many".to_string())
        });
        assert_eq!(config.min_input_confirmations, 1);
    }

    #[test]
    fn test_from_json_partial() {
        let config = CoordinatorConfig::from_json(
            r#"{"coinbase_maturity": 10, "round_parameters": {"credential_count": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.coinbase_maturity, 10);
        assert_eq!(config.round_parameters.credential_count, 3);
        assert_eq!(config.round_parameters.max_transaction_vsize, 100_000);
    }

    #[test]
    fn test_from_json_rejects_invalid_parameters() {
        let result =
            CoordinatorConfig::from_json(r#"{"round_parameters": {"credential_count": 0}}"#);
        assert!(matches!(result, Err(CoordinatorError::Config(_))));
        assert!(CoordinatorConfig::from_json("not json").is_err());
    }
}
