//! # Relayer Configuration
//!
//! Loaded from YAML (`.yaml`/`.yml`) or JSON (anything else). Every field
//! has a default; a handful can be overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `AMB_RECIPIENT` | `recipient` |
//! | `AMB_POLL_INTERVAL_MS` | `poll_interval_ms` |
//! | `AMB_CONFIRMATION_TIMEOUT_MS` | `confirmation_timeout_ms` |
//! | `AMB_STATE_PATH` | `state_path` |
//! | `AMB_DEPLOYMENT_PATH` | `deployment_path` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use amb_core::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Configuration loading or validation failure.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file did not parse.
    #[error("cannot parse config {path}: {reason}")]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// An environment override had an unusable value.
    #[error("environment variable {var} has invalid value {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Rejected value.
        value: String,
    },

    /// A field value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Relayer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayerConfig {
    /// Address minted tokens are issued to.
    pub recipient: Address,
    /// Interval between confirmation polls and idle subscription checks.
    pub poll_interval_ms: u64,
    /// Total time to wait for a submitted mint to become visible.
    pub confirmation_timeout_ms: u64,
    /// Budget for proof generation.
    pub proving_retry: RetryPolicy,
    /// Budget for transient submission and ledger-read failures.
    pub submission_retry: RetryPolicy,
    /// Maximum concurrent proof generations.
    pub max_concurrent_proofs: usize,
    /// Events fetched per subscription round.
    pub subscription_batch: usize,
    /// A ledger not reached within this window is reported unhealthy.
    pub health_staleness_secs: u64,
    /// Where relayer state is persisted. `None` keeps it in memory only.
    pub state_path: Option<PathBuf>,
    /// Deployment record read at startup.
    pub deployment_path: Option<PathBuf>,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            recipient: Address::ZERO,
            poll_interval_ms: 1_000,
            confirmation_timeout_ms: 60_000,
            proving_retry: RetryPolicy {
                max_attempts: 3,
                ..RetryPolicy::default()
            },
            submission_retry: RetryPolicy::default(),
            max_concurrent_proofs: 4,
            subscription_batch: 256,
            health_staleness_secs: 60,
            state_path: None,
            deployment_path: None,
        }
    }
}

impl RelayerConfig {
    /// Load from a file, apply environment overrides, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_file(path, |var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a file and apply `AMB_*` overrides read through `lookup`.
    /// The result is not validated.
    pub fn from_file(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(path, &raw)?;
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Parse file contents; the format follows the extension.
    pub fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let parsed = if is_yaml {
            serde_yaml::from_str(raw).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(raw).map_err(|e| e.to_string())
        };
        parsed.map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Apply `AMB_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = lookup("AMB_RECIPIENT") {
            self.recipient = v.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "AMB_RECIPIENT",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("AMB_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_u64("AMB_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("AMB_CONFIRMATION_TIMEOUT_MS") {
            self.confirmation_timeout_ms = parse_u64("AMB_CONFIRMATION_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("AMB_STATE_PATH") {
            self.state_path = (!v.is_empty()).then(|| PathBuf::from(v));
        }
        if let Some(v) = lookup("AMB_DEPLOYMENT_PATH") {
            self.deployment_path = (!v.is_empty()).then(|| PathBuf::from(v));
        }
        Ok(())
    }

    /// Reject settings the relayer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recipient == Address::ZERO {
            return Err(ConfigError::Invalid("recipient must be set".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".to_string()));
        }
        if self.confirmation_timeout_ms < self.poll_interval_ms {
            return Err(ConfigError::Invalid(format!(
                "confirmation_timeout_ms ({}) shorter than poll_interval_ms ({})",
                self.confirmation_timeout_ms, self.poll_interval_ms
            )));
        }
        if self.max_concurrent_proofs == 0 || self.subscription_batch == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_proofs and subscription_batch must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Confirmation poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Confirmation timeout.
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }
}

fn parse_u64(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    fn recipient() -> Address {
        Address::from_bytes([0x11; 20])
    }

    #[test]
    fn yaml_with_partial_fields_uses_defaults() {
        let yaml = format!(
            "recipient: \"{}\"\npoll_interval_ms: 250\nproving_retry:\n  max_attempts: 7\n",
            recipient()
        );
        let c = RelayerConfig::parse(Path::new("relayer.yaml"), &yaml).unwrap();
        assert_eq!(c.recipient, recipient());
        assert_eq!(c.poll_interval(), Duration::from_millis(250));
        assert_eq!(c.proving_retry.max_attempts, 7);
        assert_eq!(c.proving_retry.initial_delay_ms, RetryPolicy::default().initial_delay_ms);
        assert_eq!(c.confirmation_timeout_ms, 60_000);
        c.validate().unwrap();
    }

    #[test]
    fn json_config() {
        let json = format!(r#"{{"recipient": "{}", "confirmation_timeout_ms": 5000}}"#, recipient());
        let c = RelayerConfig::parse(Path::new("relayer.json"), &json).unwrap();
        assert_eq!(c.confirmation_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn parse_error_names_the_file() {
        let err = RelayerConfig::parse(Path::new("bad.json"), "{").unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn env_overrides() {
        let mut c = RelayerConfig::default();
        let other = Address::from_bytes([0x22; 20]);
        c.apply_env(env(&[
            ("AMB_RECIPIENT", &other.to_hex()),
            ("AMB_POLL_INTERVAL_MS", "10"),
            ("AMB_CONFIRMATION_TIMEOUT_MS", "100"),
            ("AMB_STATE_PATH", "/tmp/relayer.json"),
        ]))
        .unwrap();
        assert_eq!(c.recipient, other);
        assert_eq!(c.poll_interval_ms, 10);
        assert_eq!(c.confirmation_timeout_ms, 100);
        assert_eq!(c.state_path, Some(PathBuf::from("/tmp/relayer.json")));
    }

    #[test]
    fn bad_env_value_is_reported() {
        let mut c = RelayerConfig::default();
        let err = c.apply_env(env(&[("AMB_POLL_INTERVAL_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "AMB_POLL_INTERVAL_MS", .. }));
    }

    #[test]
    fn validation() {
        assert!(RelayerConfig::default().validate().is_err());
        let ok = RelayerConfig {
            recipient: recipient(),
            ..RelayerConfig::default()
        };
        ok.validate().unwrap();
        let short_timeout = RelayerConfig {
            confirmation_timeout_ms: 10,
            poll_interval_ms: 100,
            ..ok.clone()
        };
        assert!(short_timeout.validate().is_err());
        let zero_poll = RelayerConfig {
            poll_interval_ms: 0,
            ..ok
        };
        assert!(zero_poll.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relayer.yml");
        std::fs::write(&path, format!("recipient: \"{}\"\n", recipient())).unwrap();
        let c = RelayerConfig::load(&path).unwrap();
        assert_eq!(c.recipient, recipient());
    }
}
