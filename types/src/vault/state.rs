use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a session.
///
/// `WinStop` is the player's decision to walk away: the win amount is frozen
/// but the remaining vaults are still opened for show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    #[default]
    InProgress,
    Win,
    WinStop,
    Lose,
}

impl PlayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayState::InProgress => "in_progress",
            PlayState::Win => "win",
            PlayState::WinStop => "win_stop",
            PlayState::Lose => "lose",
        }
    }

    /// No further player choice is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PlayState::InProgress)
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of asking the platform for microphone/recognizer access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    Unknown,
    NotSupported,
    Disabled,
    Restricted,
    Denied,
    Available,
}

impl AccessState {
    pub fn is_available(&self) -> bool {
        matches!(self, AccessState::Available)
    }
}

/// Everything a presentation layer can observe about a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    pub vault: u32,
    pub stop_vault: u32,
    pub win_amount: u64,
    pub amount: u64,
    pub status: PlayState,

    pub can_start_over: bool,
    pub can_continue: bool,
    pub can_stop: bool,
    pub listening: bool,
}
