//! Beatthebank execution layer.
//!
//! This crate contains the vault round state machine ([`Session`]), the async
//! driver that narrates it ([`Game`]), and a Monte-Carlo runner for the payout
//! math.
//!
//! ## Determinism requirements
//! - All randomness flows through one seedable [`GameRng`]; two games built
//!   from the same seed and fed the same commands make the same decisions.
//! - Delays go through the host's [`Clock`], never through wall-clock sleeps.
//!
//! ## Minimal game loop (example)
//! ```rust,ignore
//! use beatthebank_execution::{Game, GameConfig, GameRng};
//! use beatthebank_types::Command;
//!
//! # async fn example<E>(context: E) -> anyhow::Result<()>
//! # where E: beatthebank_execution::Clock
//! #     + beatthebank_execution::TextToSpeech
//! #     + beatthebank_execution::SpeechRecognizer
//! #     + beatthebank_execution::SoundEffects,
//! # {
//! let mut game = Game::new(context, GameConfig::default(), GameRng::from_seed(7))?;
//! game.set_name("Ada");
//! let (commands, receiver) = tokio::sync::mpsc::channel(16);
//! commands.send(Command::StartOver).await?;
//! commands.send(Command::Stop).await?;
//! drop(commands);
//! game.run(receiver).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod game;
pub mod rng;
pub mod session;
pub mod simulation;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use config::{ConfigError, GameConfig, MAX_PAUSE_MS};
pub use context::{Clock, SoundEffects, SpeechRecognizer, TextToSpeech};
pub use game::Game;
pub use rng::{GameRng, SessionLayout};
pub use session::{GameError, RoundOutcome, Session};
pub use simulation::{play_session, simulate, SimulationReport, StopStrategy};
