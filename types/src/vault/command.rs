use serde::{Deserialize, Serialize};
use std::fmt;

use super::CONTINUE_KEYWORD;

/// Commands a host can send to a running game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Command {
    SetName(String),
    StartOver,
    Continue,
    Stop,
    ToggleSpeech,
    Quit,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::SetName(_) => CommandKind::SetName,
            Command::StartOver => CommandKind::StartOver,
            Command::Continue => CommandKind::Continue,
            Command::Stop => CommandKind::Stop,
            Command::ToggleSpeech => CommandKind::ToggleSpeech,
            Command::Quit => CommandKind::Quit,
        }
    }
}

/// Payload-free discriminant of [`Command`], used in errors and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    SetName,
    StartOver,
    Continue,
    Stop,
    ToggleSpeech,
    Quit,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::SetName => "set_name",
            CommandKind::StartOver => "start_over",
            CommandKind::Continue => "continue",
            CommandKind::Stop => "stop",
            CommandKind::ToggleSpeech => "toggle_speech",
            CommandKind::Quit => "quit",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a recognized utterance asks to continue (case-insensitive substring match).
pub fn is_continue_utterance(utterance: &str) -> bool {
    utterance.to_lowercase().contains(CONTINUE_KEYWORD)
}
