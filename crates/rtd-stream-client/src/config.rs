/*
[INPUT]:  Optional YAML configuration file
[OUTPUT]: Parsed and validated client configuration
[POS]:    Configuration layer - provider selection and loop timing
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use rtd_stream_adapter::ProviderSettings;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

const MIN_VALUE_BUFFER_LEN: usize = 16;

/// Top-level configuration for the streaming client
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Provider name and per-provider settings
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Dispatch loop timing and output bounds
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Dispatch loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Sleep between loop iterations, also used while paused
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Interval the callback object reports to the provider
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// How often to probe provider health; 0 disables the probe
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,
    /// Bound on a formatted value, terminator slot included
    #[serde(default = "default_value_buffer_len")]
    pub value_buffer_len: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            health_check_interval_ms: default_health_check_interval_ms(),
            value_buffer_len: default_value_buffer_len(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_heartbeat_interval_ms() -> u64 {
    100
}

fn default_health_check_interval_ms() -> u64 {
    5000
}

fn default_value_buffer_len() -> usize {
    128
}

impl DispatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn health_check_interval(&self) -> Option<Duration> {
        (self.health_check_interval_ms > 0)
            .then(|| Duration::from_millis(self.health_check_interval_ms))
    }
}

impl ClientConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        Ok(config)
    }

    /// Parse a YAML document; an empty document yields the defaults
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.dispatch.poll_interval_ms == 0 {
            return Err(ClientError::Config(
                "dispatch.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.dispatch.value_buffer_len < MIN_VALUE_BUFFER_LEN {
            return Err(ClientError::Config(format!(
                "dispatch.value_buffer_len must be at least {MIN_VALUE_BUFFER_LEN}"
            )));
        }
        let volatility = self.provider.sim.volatility;
        if !(volatility > 0.0 && volatility <= 1.0) {
            return Err(ClientError::Config(format!(
                "provider.sim.volatility must be within (0, 1], got {volatility}"
            )));
        }
        if self.provider.name.trim().is_empty() {
            return Err(ClientError::Config("provider.name must not be empty".to_string()));
        }
        Ok(())
    }
}
