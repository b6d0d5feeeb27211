//! Declarative, TOML-backed configuration for the relay client, driver, and
//! orchestrator, grounded on `agent::types::IdentityConfig::load`/`save`.
//! Every field has a default so a deployment only needs to override what it
//! changes from the built-in tuning.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Poll timing and retry budget for the relay client (mirrors
/// `vultisig-relay::RelayClientConfig`, but in a serializable, durations-as-
/// milliseconds form suitable for a TOML file).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub poll_deadline_ms: u64,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub transport_retry_attempts: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_deadline_ms: 300_000,
            backoff_base_ms: 500,
            backoff_max_ms: 5_000,
            transport_retry_attempts: 4,
        }
    }
}

impl RelayConfig {
    pub fn poll_deadline(&self) -> Duration {
        Duration::from_millis(self.poll_deadline_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

/// Round-loop tuning shared by keygen, key-import, and keysign ceremonies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Number of transport-failure retries `start_with_retry` allows before
    /// giving up on a single scheme's ceremony.
    pub max_ceremony_attempts: u32,
    pub round_poll_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_ceremony_attempts: 3,
            round_poll_interval_ms: 200,
        }
    }
}

impl DriverConfig {
    pub fn round_poll_interval(&self) -> Duration {
        Duration::from_millis(self.round_poll_interval_ms)
    }
}

/// Top-level tuning for a `VultisigClient`, composing the relay and driver
/// configs plus session-level deadlines that span both legs of a ceremony.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub relay: RelayConfig,
    pub driver: DriverConfig,
    /// How long `wait_for_quorum` waits for every peer to join a session
    /// before giving up (spec §4.2).
    pub quorum_deadline_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            driver: DriverConfig::default(),
            quorum_deadline_ms: 60_000,
        }
    }
}

impl OrchestratorConfig {
    pub fn quorum_deadline(&self) -> Duration {
        Duration::from_millis(self.quorum_deadline_ms)
    }

    /// Load config from a TOML file, falling back to field-level defaults
    /// for anything the file omits.
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: OrchestratorConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &str) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hardcoded_tuning() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.driver.max_ceremony_attempts, 3);
        assert_eq!(config.relay.poll_deadline(), Duration::from_secs(300));
    }

    #[test]
    fn round_trips_through_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vultisig.toml");
        let mut config = OrchestratorConfig::default();
        config.driver.max_ceremony_attempts = 7;
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = OrchestratorConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.driver.max_ceremony_attempts, 7);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[driver]\nmax_ceremony_attempts = 9\n").unwrap();

        let loaded = OrchestratorConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.driver.max_ceremony_attempts, 9);
        assert_eq!(loaded.driver.round_poll_interval_ms, 200);
        assert_eq!(loaded.relay.transport_retry_attempts, 4);
    }
}
