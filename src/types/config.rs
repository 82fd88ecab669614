//! Configuration structures.
//!
//! Configuration is built from defaults and then overridden by environment
//! variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::errors::{Error, Result};

/// Environment variable naming the policy document.
pub const ENV_POLICY_PATH: &str = "RATE_LIMIT_CONFIG";
/// Environment variable naming the state document.
pub const ENV_STATE_PATH: &str = "RATE_LIMIT_STATE";
/// Environment variable selecting the denied-refill behaviour.
pub const ENV_DENIED_REFILL: &str = "TOOLBUCKET_DENIED_REFILL";
/// Environment variable selecting the log format (`json` or text).
pub const ENV_LOG_FORMAT: &str = "TOOLBUCKET_LOG_FORMAT";

/// Global configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Document locations.
    #[serde(default)]
    pub store: StoreConfig,

    /// Engine behaviour.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_POLICY_PATH) {
            config.store.policy_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_STATE_PATH) {
            config.store.state_path = PathBuf::from(path);
        }
        if let Some(mode) = lookup(ENV_DENIED_REFILL) {
            config.engine.denied_refill = mode.parse()?;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            config.observability.json_logs = format.eq_ignore_ascii_case("json");
        }

        Ok(config)
    }
}

/// Where the two durable documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Policy document (tool → capacity, refill_rate).
    pub policy_path: PathBuf,

    /// State document ("tool:user" → tokens, last_refill).
    pub state_path: PathBuf,
}

impl StoreConfig {
    pub fn new(policy_path: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            policy_path: policy_path.into(),
            state_path: state_path.into(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            policy_path: PathBuf::from("config.json"),
            state_path: PathBuf::from("state.json"),
        }
    }
}

/// What a denied check does with the refill it computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeniedRefill {
    /// Commit nothing; the next check refills from the old timestamp.
    #[default]
    Discard,
    /// Commit the refilled tokens and timestamp even though nothing was debited.
    Persist,
}

impl std::str::FromStr for DeniedRefill {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "persist" => Ok(Self::Persist),
            other => Err(Error::config(format!(
                "{} must be 'discard' or 'persist', got '{}'",
                ENV_DENIED_REFILL, other
            ))),
        }
    }
}

/// Engine behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Denied-check refill handling.
    pub denied_refill: DeniedRefill,

    /// Bounded request queue length for `EngineHandle`.
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            denied_refill: DeniedRefill::Discard,
            channel_capacity: 64,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.store.policy_path, PathBuf::from("config.json"));
        assert_eq!(config.store.state_path, PathBuf::from("state.json"));
        assert_eq!(config.engine.denied_refill, DeniedRefill::Discard);
        assert!(!config.observability.json_logs);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_POLICY_PATH, "/tmp/p.json"),
            (ENV_STATE_PATH, "/tmp/s.json"),
            (ENV_DENIED_REFILL, "Persist"),
            (ENV_LOG_FORMAT, "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.store.policy_path, PathBuf::from("/tmp/p.json"));
        assert_eq!(config.store.state_path, PathBuf::from("/tmp/s.json"));
        assert_eq!(config.engine.denied_refill, DeniedRefill::Persist);
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_invalid_denied_refill() {
        let err = Config::from_lookup(lookup(&[(ENV_DENIED_REFILL, "sometimes")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
