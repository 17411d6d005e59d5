//! Round state machine.
//!
//! Pure and synchronous: no speech, sound or timing. The async [`crate::Game`]
//! driver wraps it with announcements.
//!
//! ## Transitions
//!
//! - `start` resets every counter and installs a fresh [`SessionLayout`].
//! - `advance` opens the next vault. Opening vault `rounds` resolves the session:
//!   a jackpot session wins [`JACKPOT_PAYOUT`], any other session loses everything.
//!   After a stop the resolution still happens (for show) but status and win
//!   amount are left alone.
//! - `stop` freezes the win amount and vault and moves to `WinStop`.

use beatthebank_types::{CommandKind, PayoutTable, PlayState, JACKPOT_PAYOUT};
use thiserror::Error;

use crate::rng::{GameRng, SessionLayout};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("{command} is not enabled")]
    CommandDisabled { command: CommandKind },
    #[error("session has not started")]
    NotStarted,
    #[error("session is complete")]
    SessionComplete,
}

/// What opening a vault produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// A non-final vault: `payout` was added to the running `amount`.
    Opened { vault: u32, payout: u64, amount: u64 },
    /// Final vault of a jackpot session.
    Jackpot { vault: u32, win_amount: u64 },
    /// Final vault of any other session.
    Bust { vault: u32 },
}

impl RoundOutcome {
    pub fn vault(&self) -> u32 {
        match self {
            RoundOutcome::Opened { vault, .. }
            | RoundOutcome::Jackpot { vault, .. }
            | RoundOutcome::Bust { vault } => *vault,
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, RoundOutcome::Opened { .. })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    vault: u32,
    amount: u64,
    win_amount: u64,
    stop_vault: u32,
    status: PlayState,
    layout: Option<SessionLayout>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, layout: SessionLayout) {
        *self = Self {
            layout: Some(layout),
            ..Self::default()
        };
    }

    pub fn vault(&self) -> u32 {
        self.vault
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn win_amount(&self) -> u64 {
        self.win_amount
    }

    pub fn stop_vault(&self) -> u32 {
        self.stop_vault
    }

    pub fn status(&self) -> PlayState {
        self.status
    }

    pub fn layout(&self) -> Option<SessionLayout> {
        self.layout
    }

    /// Total vaults in this session (0 before the first start).
    pub fn rounds(&self) -> u32 {
        self.layout.map_or(0, |layout| layout.rounds)
    }

    pub fn is_jackpot(&self) -> bool {
        self.layout.is_some_and(|layout| layout.jackpot)
    }

    /// Every vault has been opened.
    pub fn is_complete(&self) -> bool {
        self.layout.is_some() && self.vault >= self.rounds()
    }

    pub fn can_continue(&self) -> bool {
        self.status == PlayState::InProgress && self.vault < self.rounds()
    }

    pub fn can_stop(&self) -> bool {
        self.status == PlayState::InProgress && self.vault > 0
    }

    pub fn advance(
        &mut self,
        rng: &mut GameRng,
        table: &PayoutTable,
    ) -> Result<RoundOutcome, GameError> {
        let layout = self.layout.ok_or(GameError::NotStarted)?;
        if self.vault >= layout.rounds {
            return Err(GameError::SessionComplete);
        }

        self.vault += 1;
        let stopped = self.status == PlayState::WinStop;

        if self.vault == layout.rounds {
            if layout.jackpot {
                if !stopped {
                    self.status = PlayState::Win;
                    self.win_amount = JACKPOT_PAYOUT;
                }
                return Ok(RoundOutcome::Jackpot {
                    vault: self.vault,
                    win_amount: JACKPOT_PAYOUT,
                });
            }
            if !stopped {
                self.status = PlayState::Lose;
                self.win_amount = 0;
            }
            return Ok(RoundOutcome::Bust { vault: self.vault });
        }

        let payout = rng.payout(table);
        self.amount = self.amount.saturating_add(payout);
        Ok(RoundOutcome::Opened {
            vault: self.vault,
            payout,
            amount: self.amount,
        })
    }

    /// Walk away with the current amount. Returns the frozen win amount.
    pub fn stop(&mut self) -> Result<u64, GameError> {
        if !self.can_stop() {
            return Err(GameError::CommandDisabled {
                command: CommandKind::Stop,
            });
        }
        self.status = PlayState::WinStop;
        self.win_amount = self.amount;
        self.stop_vault = self.vault;
        Ok(self.win_amount)
    }
}
