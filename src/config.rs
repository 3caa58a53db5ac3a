//! Configuration management for hashledger

use crate::error::ChainError;
use crate::miner::MiningControl;
use crate::validator::{HashValidator, LeadingZeroBits, LeadingZeroBytes};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "hashledger.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub validator: ValidatorConfig,
    #[serde(default)]
    pub miner: MinerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default = "default_zero_bytes")]
    pub zero_bytes: usize,
    /// When set, takes precedence over `zero_bytes`.
    #[serde(default)]
    pub zero_bits: Option<u32>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            zero_bytes: default_zero_bytes(),
            zero_bits: None,
        }
    }
}

impl ValidatorConfig {
    pub fn build(&self) -> Arc<dyn HashValidator> {
        match self.zero_bits {
            Some(bits) => Arc::new(LeadingZeroBits(bits)),
            None => Arc::new(LeadingZeroBytes(self.zero_bytes)),
        }
    }

    pub fn describe(&self) -> String {
        match self.zero_bits {
            Some(bits) => LeadingZeroBits(bits).to_string(),
            None => LeadingZeroBytes(self.zero_bytes).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MinerConfig {
    /// Human-readable duration such as `"30s"` or `"2m"`.
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default)]
    pub max_attempts: Option<u64>,
}

impl MinerConfig {
    pub fn timeout(&self) -> Result<Option<Duration>, ChainError> {
        self.timeout
            .as_deref()
            .map(|raw| {
                humantime::parse_duration(raw)
                    .map_err(|e| ChainError::Config(format!("miner.timeout '{}': {}", raw, e)))
            })
            .transpose()
    }

    /// A fresh control for one search; the timeout starts counting now.
    pub fn control(&self) -> Result<MiningControl, ChainError> {
        let mut control = MiningControl::unbounded();
        if let Some(timeout) = self.timeout()? {
            control = control.with_timeout(timeout);
        }
        if let Some(max) = self.max_attempts {
            control = control.with_max_attempts(max);
        }
        Ok(control)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_zero_bytes() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn parse_config(config_str: &str) -> Result<Config, ChainError> {
    let config: Config = toml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

/// Loads `path`, falling back to defaults when the file does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)?;
    parse_config(&config_str)
}

impl Config {
    /// Checks values that deserialise fine but cannot be used.
    pub fn validate(&self) -> Result<(), ChainError> {
        // Neither digest format used here is longer than 32 bytes.
        if self.validator.zero_bytes > 32 {
            return Err(ChainError::Config(format!(
                "validator.zero_bytes must be at most 32, got {}",
                self.validator.zero_bytes
            )));
        }
        if let Some(bits) = self.validator.zero_bits {
            if bits > 256 {
                return Err(ChainError::Config(format!(
                    "validator.zero_bits must be at most 256, got {}",
                    bits
                )));
            }
        }
        if self.miner.max_attempts == Some(0) {
            return Err(ChainError::Config(
                "miner.max_attempts must be positive".to_string(),
            ));
        }
        self.miner.timeout()?;
        if self.logging.level.trim().is_empty() {
            return Err(ChainError::Config("logging.level must not be empty".to_string()));
        }
        Ok(())
    }
}
