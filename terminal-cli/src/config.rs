use std::{path::Path, str::FromStr};

use anyhow::{Context, Result};
use beatthebank_execution::GameConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error(transparent)]
    Game(#[from] beatthebank_execution::ConfigError),
}

/// Terminal configuration (from YAML file, overridden by flags).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub name: Option<String>,
    pub seed: Option<u64>,
    pub log_level: String,
    /// How long each spoken word stays on screen.
    pub speech_ms_per_word: u64,
    /// Whether `/speech` is granted microphone access.
    pub microphone: bool,
    pub game: GameConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            seed: None,
            log_level: "warn".to_string(),
            speech_ms_per_word: 120,
            microphone: true,
            game: GameConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("could not parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn log_level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
            value: self.log_level.clone(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level()?;
        self.game.validate()?;
        Ok(())
    }
}
