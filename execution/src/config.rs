use beatthebank_types::{
    default_payout_weights, PayoutTable, PayoutTableError, PayoutWeight,
    DEFAULT_AUTO_REVEAL_DELAY_MS, DEFAULT_INTRO_PAUSE_MS, DEFAULT_REVEAL_PAUSE_MS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Longest pause any announcement may be configured with.
pub const MAX_PAUSE_MS: u64 = 60_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid payout table: {0}")]
    Payouts(#[from] PayoutTableError),
    #[error("{field} must be <= {max} (got {value})")]
    PauseTooLong {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

/// Timing and payout configuration for a [`crate::Game`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Pause after the greeting and after "let's open it up".
    pub intro_pause_ms: u64,
    /// Pause after each vault reveal or stop sentence.
    pub reveal_pause_ms: u64,
    /// Delay between vaults opened automatically after a stop.
    pub auto_reveal_delay_ms: u64,
    pub payouts: Vec<PayoutWeight>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            intro_pause_ms: DEFAULT_INTRO_PAUSE_MS,
            reveal_pause_ms: DEFAULT_REVEAL_PAUSE_MS,
            auto_reveal_delay_ms: DEFAULT_AUTO_REVEAL_DELAY_MS,
            payouts: default_payout_weights(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("intro_pause_ms", self.intro_pause_ms),
            ("reveal_pause_ms", self.reveal_pause_ms),
            ("auto_reveal_delay_ms", self.auto_reveal_delay_ms),
        ] {
            if value > MAX_PAUSE_MS {
                return Err(ConfigError::PauseTooLong {
                    field,
                    value,
                    max: MAX_PAUSE_MS,
                });
            }
        }
        self.payout_table()?;
        Ok(())
    }

    pub fn payout_table(&self) -> Result<PayoutTable, ConfigError> {
        Ok(PayoutTable::new(self.payouts.clone())?)
    }

    /// Zero all pauses (handy for simulations and tests).
    pub fn without_pauses(mut self) -> Self {
        self.intro_pause_ms = 0;
        self.reveal_pause_ms = 0;
        self.auto_reveal_delay_ms = 0;
        self
    }

    pub fn intro_pause(&self) -> Duration {
        Duration::from_millis(self.intro_pause_ms)
    }

    pub fn reveal_pause(&self) -> Duration {
        Duration::from_millis(self.reveal_pause_ms)
    }

    pub fn auto_reveal_delay(&self) -> Duration {
        Duration::from_millis(self.auto_reveal_delay_ms)
    }
}
