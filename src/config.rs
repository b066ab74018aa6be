// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Session Configuration

use serde::{Deserialize, Serialize};

use crate::dispatcher::PolicyKind;
use crate::types::Tick;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid session config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },
}

/// Tunables of one loot session. Every field may be omitted in JSON.
///
/// Tick windows are added with saturation, so `u64::MAX` means "never
/// expires" rather than wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Expiry window of a Need/Greed roll.
    pub roll_timeout_ticks: Tick,
    /// Retention limit of the history ledger.
    pub history_capacity: usize,
    /// Lifetime stamped on every grant.
    pub grant_lifetime_ticks: Tick,
    /// How long a trade request waits for the target.
    pub trade_request_timeout_ticks: Tick,
    pub initial_policy: PolicyKind,
    /// Roll RNG seed. `None` derives one from the host clock.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            roll_timeout_ticks: 300,
            history_capacity: 50,
            grant_lifetime_ticks: 3000,
            trade_request_timeout_ticks: 600,
            initial_policy: PolicyKind::FreeForAll,
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roll_timeout_ticks == 0 {
            return Err(ConfigError::NonPositive { field: "roll_timeout_ticks" });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::NonPositive { field: "history_capacity" });
        }
        if self.trade_request_timeout_ticks == 0 {
            return Err(ConfigError::NonPositive { field: "trade_request_timeout_ticks" });
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = SessionConfig::from_json("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config = SessionConfig::from_json(
            r#"{"roll_timeout_ticks": 20, "initial_policy": "RoundRobin", "seed": 9}"#,
        )
        .unwrap();
        assert_eq!(config.roll_timeout_ticks, 20);
        assert_eq!(config.initial_policy, PolicyKind::RoundRobin);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.history_capacity, 50);
    }

    #[test]
    fn maximal_timeouts_accepted() {
        let config = SessionConfig::from_json(
            r#"{"roll_timeout_ticks": 18446744073709551615, "grant_lifetime_ticks": 18446744073709551615}"#,
        )
        .unwrap();
        assert_eq!(config.roll_timeout_ticks, u64::MAX);
    }

    #[test]
    fn zero_history_capacity_rejected() {
        let err = SessionConfig::from_json(r#"{"history_capacity": 0}"#).unwrap_err();
        assert!(
            matches!(err, ConfigError::NonPositive { field: "history_capacity" }),
            "expected NonPositive, got {err:?}"
        );
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            SessionConfig::from_json("{roll"),
            Err(ConfigError::Parse(_))
        ));
    }
}
