//! Async game driver.
//!
//! [`Game`] owns a [`Session`] and narrates it through the host's capabilities.
//! Every transition runs to completion (speak, pause, next) before the next
//! command is looked at, so there is a single logical thread of control and
//! no locking. Observers follow along through a `watch` channel of
//! [`Snapshot`]s that is refreshed after every mutation.

use beatthebank_types::{
    is_continue_utterance, Command, CommandKind, PayoutTable, PlayState, Snapshot,
};
use futures::{FutureExt, Stream, StreamExt};
use tokio::{select, sync::mpsc, sync::watch};
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigError, GameConfig},
    context::{Clock, SoundEffects, SpeechRecognizer, TextToSpeech},
    rng::{GameRng, SessionLayout},
    session::{GameError, RoundOutcome, Session},
};

const OPEN_IT_UP: &str = "Alright, let's open it up.";
const ASK_CONTINUE: &str = "Do you wish to continue?";
const COULD_HAVE_WON: &str = "Let's see what you could have won";

enum Event {
    Command(Option<Command>),
    Utterance(Option<String>),
}

pub struct Game<E>
where
    E: Clock + TextToSpeech + SpeechRecognizer + SoundEffects,
{
    context: E,
    config: GameConfig,
    table: PayoutTable,
    rng: GameRng,
    session: Session,
    name: String,
    busy: bool,
    transitions: u64,
    utterances: Option<E::Utterances>,
    snapshots: watch::Sender<Snapshot>,
}

impl<E> Game<E>
where
    E: Clock + TextToSpeech + SpeechRecognizer + SoundEffects,
{
    pub fn new(context: E, config: GameConfig, rng: GameRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = config.payout_table()?;
        let (snapshots, _) = watch::channel(Snapshot::default());
        Ok(Self {
            context,
            config,
            table,
            rng,
            session: Session::new(),
            name: String::new(),
            busy: false,
            transitions: 0,
            utterances: None,
            snapshots,
        })
    }

    pub fn context(&self) -> &E {
        &self.context
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_listening(&self) -> bool {
        self.utterances.is_some()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.publish();
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub fn can_start_over(&self) -> bool {
        !self.busy && !self.name.trim().is_empty()
    }

    pub fn can_continue(&self) -> bool {
        !self.busy && self.session.can_continue()
    }

    pub fn can_stop(&self) -> bool {
        !self.busy && self.session.can_stop()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            name: self.name.clone(),
            vault: self.session.vault(),
            stop_vault: self.session.stop_vault(),
            win_amount: self.session.win_amount(),
            amount: self.session.amount(),
            status: self.session.status(),
            can_start_over: self.can_start_over(),
            can_continue: self.can_continue(),
            can_stop: self.can_stop(),
            listening: self.is_listening(),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    fn begin(&mut self, command: CommandKind, enabled: bool) -> Result<(), GameError> {
        if !enabled {
            return Err(GameError::CommandDisabled { command });
        }
        self.busy = true;
        self.transitions += 1;
        self.publish();
        Ok(())
    }

    fn finish<T>(&mut self, result: Result<T, GameError>) -> Result<T, GameError> {
        self.busy = false;
        self.publish();
        result
    }

    /// Start a new session with a freshly drawn layout.
    pub async fn start_over(&mut self) -> Result<(), GameError> {
        if !self.can_start_over() {
            return Err(GameError::CommandDisabled {
                command: CommandKind::StartOver,
            });
        }
        let layout = self.rng.layout();
        self.start_over_with(layout).await
    }

    /// Start a new session with a predetermined layout (replays, scripted demos).
    pub async fn start_over_with(&mut self, layout: SessionLayout) -> Result<(), GameError> {
        self.begin(CommandKind::StartOver, self.can_start_over())?;
        let result = self.run_start_over(layout).await;
        self.finish(result)
    }

    pub async fn continue_round(&mut self) -> Result<(), GameError> {
        self.begin(CommandKind::Continue, self.can_continue())?;
        let result = self.next_round().await;
        self.finish(result)
    }

    pub async fn stop(&mut self) -> Result<(), GameError> {
        self.begin(CommandKind::Stop, self.can_stop())?;
        let result = self.run_stop().await;
        self.finish(result)
    }

    /// Turn voice continuation on or off. Returns whether the game is now listening.
    pub async fn toggle_speech(&mut self) -> bool {
        if self.utterances.take().is_some() {
            info!("Stopped listening");
            self.publish();
            return false;
        }

        let access = self.context.request_access().await;
        if !access.is_available() {
            warn!(?access, "Speech recognition unavailable");
            return false;
        }
        self.utterances = Some(self.context.listen());
        info!("Listening for continue");
        self.publish();
        true
    }

    /// Apply a single command. `Quit` is a no-op here; [`Game::run`] handles it.
    pub async fn handle(&mut self, command: Command) -> Result<(), GameError> {
        match command {
            Command::SetName(name) => self.set_name(name),
            Command::StartOver => self.start_over().await?,
            Command::Continue => self.continue_round().await?,
            Command::Stop => self.stop().await?,
            Command::ToggleSpeech => {
                self.toggle_speech().await;
            }
            Command::Quit => {}
        }
        Ok(())
    }

    /// React to a recognized utterance.
    pub async fn hear(&mut self, utterance: &str) {
        if !is_continue_utterance(utterance) {
            debug!(utterance, "Ignored utterance");
            return;
        }
        if !self.can_continue() {
            debug!(utterance, "Continue not enabled");
            return;
        }
        info!(utterance, "Heard continue");
        if let Err(err) = self.continue_round().await {
            warn!(%err, "Voice continue failed");
        }
    }

    /// Process commands (and utterances, while listening) until the command
    /// channel closes or `Quit` arrives.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        self.publish();
        loop {
            let transitions = self.transitions;
            let event = {
                let utterances = self.utterances.as_mut();
                select! {
                    command = commands.recv() => Event::Command(command),
                    utterance = next_utterance(utterances) => Event::Utterance(utterance),
                }
            };

            match event {
                Event::Command(None) => {
                    debug!("Command channel closed");
                    return;
                }
                Event::Command(Some(Command::Quit)) => {
                    info!("Quit");
                    return;
                }
                Event::Command(Some(command)) => {
                    let kind = command.kind();
                    if let Err(err) = self.handle(command).await {
                        warn!(command = %kind, %err, "Rejected command");
                    }
                }
                Event::Utterance(Some(utterance)) => self.hear(&utterance).await,
                Event::Utterance(None) => {
                    warn!("Speech recognizer stopped");
                    self.utterances = None;
                    self.publish();
                }
            }

            // Continue is disabled while a transition runs, so anything heard meanwhile is dropped
            if self.transitions != transitions {
                self.discard_pending_utterances();
            }
        }
    }

    fn discard_pending_utterances(&mut self) {
        let Some(utterances) = self.utterances.as_mut() else {
            return;
        };
        loop {
            match utterances.next().now_or_never() {
                Some(Some(utterance)) => {
                    debug!(utterance = utterance.as_str(), "Discarded utterance")
                }
                Some(None) => {
                    warn!("Speech recognizer stopped");
                    self.utterances = None;
                    self.publish();
                    return;
                }
                None => return,
            }
        }
    }

    async fn run_start_over(&mut self, layout: SessionLayout) -> Result<(), GameError> {
        self.session.start(layout);
        info!(
            name = self.name.as_str(),
            rounds = layout.rounds,
            jackpot = layout.jackpot,
            "Starting session"
        );
        self.publish();

        let greeting = format!("Good Luck {}.  Let's play!", self.name);
        self.speak(self.config.intro_pause(), &[greeting.as_str()]).await;
        self.next_round().await
    }

    async fn next_round(&mut self) -> Result<(), GameError> {
        self.speak(self.config.intro_pause(), &[OPEN_IT_UP]).await;
        if self.open_vault().await? {
            self.context.speak(ASK_CONTINUE).await;
        }
        Ok(())
    }

    async fn run_stop(&mut self) -> Result<(), GameError> {
        let won = self.session.stop()?;
        info!(
            name = self.name.as_str(),
            vault = self.session.stop_vault(),
            won,
            "Player stopped"
        );
        self.publish();

        let good_job = format!("Good Job {}", self.name);
        let you_won = format!("You won {won} dollars");
        self.speak(
            self.config.reveal_pause(),
            &[good_job.as_str(), you_won.as_str(), COULD_HAVE_WON],
        )
        .await;

        while self.open_vault().await? {
            self.context.sleep(self.config.auto_reveal_delay()).await;
        }
        Ok(())
    }

    /// Open the next vault. Returns true if more vaults remain.
    async fn open_vault(&mut self) -> Result<bool, GameError> {
        let outcome = self.session.advance(&mut self.rng, &self.table)?;
        self.publish();

        match outcome {
            RoundOutcome::Opened {
                vault,
                payout,
                amount,
            } => {
                debug!(vault, payout, amount, "Opened vault");
                let vault_line = format!("Vault {vault}");
                let amount_line = format!("{amount} dollars");
                self.speak(self.config.reveal_pause(), &[vault_line.as_str(), amount_line.as_str()])
                    .await;
                Ok(true)
            }
            RoundOutcome::Jackpot { vault, win_amount } => {
                info!(
                    vault,
                    win_amount,
                    stopped = self.session.status() == PlayState::WinStop,
                    "Jackpot"
                );
                self.context.play_jackpot();
                Ok(false)
            }
            RoundOutcome::Bust { vault } => {
                info!(
                    vault,
                    stopped = self.session.status() == PlayState::WinStop,
                    "Bust"
                );
                self.context.play_alarm();
                Ok(false)
            }
        }
    }

    async fn speak(&self, pause: std::time::Duration, sentences: &[&str]) {
        for sentence in sentences {
            self.context.speak(sentence).await;
            self.context.sleep(pause).await;
        }
    }
}

async fn next_utterance<S>(utterances: Option<&mut S>) -> Option<String>
where
    S: Stream<Item = String> + Unpin,
{
    match utterances {
        Some(utterances) => utterances.next().await,
        None => futures::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{Activity, Context};
    use beatthebank_types::{AccessState, JACKPOT_PAYOUT};
    use std::time::Duration;

    fn game(context: &Context) -> Game<Context> {
        let mut game = Game::new(context.clone(), GameConfig::default(), GameRng::from_seed(42))
            .expect("default config");
        game.set_name("Ada");
        game
    }

    #[tokio::test]
    async fn test_start_over_requires_name() {
        let context = Context::new();
        let mut game =
            Game::new(context.clone(), GameConfig::default(), GameRng::from_seed(1)).unwrap();
        assert!(!game.can_start_over());
        assert_eq!(
            game.start_over().await,
            Err(GameError::CommandDisabled {
                command: CommandKind::StartOver
            })
        );

        game.set_name("   ");
        assert!(!game.can_start_over());

        game.set_name("Ada");
        assert!(game.can_start_over());
        assert!(context.activity().is_empty());
    }

    #[tokio::test]
    async fn test_start_over_script() {
        let context = Context::new();
        let mut game = game(&context);
        game.start_over_with(SessionLayout::new(6, false))
            .await
            .unwrap();

        let amount = game.session().amount();
        assert_eq!(game.session().vault(), 1);
        assert_eq!(
            context.activity(),
            vec![
                Activity::Spoke("Good Luck Ada.  Let's play!".into()),
                Activity::Slept(Duration::from_millis(1_000)),
                Activity::Spoke(OPEN_IT_UP.into()),
                Activity::Slept(Duration::from_millis(1_000)),
                Activity::Spoke("Vault 1".into()),
                Activity::Slept(Duration::from_millis(500)),
                Activity::Spoke(format!("{amount} dollars")),
                Activity::Slept(Duration::from_millis(500)),
                Activity::Spoke(ASK_CONTINUE.into()),
            ]
        );

        let snapshot = game.snapshot();
        assert!(snapshot.can_continue);
        assert!(snapshot.can_stop);
        assert!(snapshot.can_start_over);
        assert_eq!(snapshot.status, PlayState::InProgress);
    }

    #[tokio::test]
    async fn test_play_to_bust() {
        let context = Context::new();
        let mut game = game(&context);
        game.start_over_with(SessionLayout::new(4, false))
            .await
            .unwrap();
        for _ in 0..3 {
            game.continue_round().await.unwrap();
        }

        assert_eq!(game.session().vault(), 4);
        assert_eq!(game.session().status(), PlayState::Lose);
        assert_eq!(game.session().win_amount(), 0);
        assert_eq!(context.alarms(), 1);
        assert_eq!(context.jackpots(), 0);

        // The final vault is not announced and does not ask to continue
        let spoken = context.spoken();
        assert_eq!(spoken.last().map(String::as_str), Some(OPEN_IT_UP));
        assert!(!spoken.iter().any(|line| line == "Vault 4"));

        assert_eq!(
            game.continue_round().await,
            Err(GameError::CommandDisabled {
                command: CommandKind::Continue
            })
        );
        assert!(game.stop().await.is_err());
    }

    #[tokio::test]
    async fn test_play_to_jackpot() {
        let context = Context::new();
        let mut game = game(&context);
        game.start_over_with(SessionLayout::new(5, true))
            .await
            .unwrap();
        while game.can_continue() {
            game.continue_round().await.unwrap();
        }

        assert_eq!(game.session().vault(), 5);
        assert_eq!(game.session().status(), PlayState::Win);
        assert_eq!(game.session().win_amount(), JACKPOT_PAYOUT);
        assert_eq!(context.jackpots(), 1);
        assert_eq!(context.alarms(), 0);
    }

    #[tokio::test]
    async fn test_stop_reveals_remaining_vaults() {
        let context = Context::new();
        let mut game = game(&context);
        game.start_over_with(SessionLayout::new(6, false))
            .await
            .unwrap();
        game.continue_round().await.unwrap();
        let won = game.session().amount();
        context.clear();

        game.stop().await.unwrap();

        assert_eq!(game.session().status(), PlayState::WinStop);
        assert_eq!(game.session().win_amount(), won);
        assert_eq!(game.session().stop_vault(), 2);
        assert_eq!(game.session().vault(), 6);
        assert_eq!(context.alarms(), 1);

        let spoken = context.spoken();
        assert_eq!(spoken[0], "Good Job Ada");
        assert_eq!(spoken[1], format!("You won {won} dollars"));
        assert_eq!(spoken[2], COULD_HAVE_WON);
        // Vaults 3..=5 are revealed, vault 6 resolves silently
        let vaults: Vec<_> = spoken
            .iter()
            .filter(|line| line.starts_with("Vault "))
            .cloned()
            .collect();
        assert_eq!(vaults, vec!["Vault 3", "Vault 4", "Vault 5"]);
        assert!(!spoken.iter().any(|line| line == ASK_CONTINUE));

        // Three auto-reveal delays between the four opened vaults
        let reveal_delays = context
            .sleeps()
            .iter()
            .filter(|d| **d == Duration::from_millis(500))
            .count();
        // 3 stop sentences + 2 lines per revealed vault + 3 auto-reveal delays
        assert_eq!(reveal_delays, 3 + 3 * 2 + 3);
    }

    #[tokio::test]
    async fn test_stop_disabled_before_first_vault() {
        let context = Context::new();
        let mut game = game(&context);
        assert!(!game.can_stop());
        assert_eq!(
            game.stop().await,
            Err(GameError::CommandDisabled {
                command: CommandKind::Stop
            })
        );
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let context = Context::new();
        let mut game = game(&context);
        game.start_over_with(SessionLayout::new(4, false))
            .await
            .unwrap();
        game.stop().await.unwrap();
        assert_eq!(game.session().status(), PlayState::WinStop);

        game.start_over_with(SessionLayout::new(8, false))
            .await
            .unwrap();
        assert_eq!(game.session().status(), PlayState::InProgress);
        assert_eq!(game.session().vault(), 1);
        assert_eq!(game.session().stop_vault(), 0);
        assert!(game.can_continue());
    }

    #[tokio::test]
    async fn test_snapshots_published() {
        let context = Context::new();
        let mut game = game(&context);
        let mut snapshots = game.subscribe();
        assert_eq!(snapshots.borrow_and_update().name, "Ada");

        game.start_over_with(SessionLayout::new(4, false))
            .await
            .unwrap();
        assert!(snapshots.has_changed().unwrap());
        let snapshot = snapshots.borrow_and_update().clone();
        assert_eq!(snapshot.vault, 1);
        assert_eq!(snapshot.amount, game.session().amount());
        assert!(snapshot.can_continue);
    }

    #[tokio::test]
    async fn test_toggle_speech() {
        let context = Context::new();
        let mut game = game(&context);
        assert!(game.toggle_speech().await);
        assert!(game.is_listening());
        assert!(game.snapshot().listening);

        assert!(!game.toggle_speech().await);
        assert!(!game.is_listening());
        assert_eq!(context.access_requests(), 1);
    }

    #[tokio::test]
    async fn test_toggle_speech_denied() {
        let context = Context::with_access(AccessState::Denied);
        let mut game = game(&context);
        assert!(!game.toggle_speech().await);
        assert!(!game.is_listening());
        assert_eq!(context.listens(), 0);
    }

    #[tokio::test]
    async fn test_hear_filters_utterances() {
        let context = Context::new();
        let mut game = game(&context);

        // Continue disabled before the first start
        game.hear("continue").await;
        assert_eq!(game.session().vault(), 0);

        game.start_over_with(SessionLayout::new(10, false))
            .await
            .unwrap();
        game.hear("stop").await;
        assert_eq!(game.session().vault(), 1);

        game.hear("Please CONTINUE").await;
        assert_eq!(game.session().vault(), 2);
    }

    #[tokio::test]
    async fn test_run_processes_commands_and_voice() {
        let context = Context::new();
        let game = game(&context);
        let mut snapshots = game.subscribe();
        let (sender, receiver) = mpsc::channel(8);

        let script = async {
            sender.send(Command::ToggleSpeech).await.unwrap();
            sender.send(Command::StartOver).await.unwrap();
            snapshots
                .wait_for(|s| s.listening && s.vault == 1 && s.can_continue)
                .await
                .unwrap();

            context.say("ok continue");
            snapshots
                .wait_for(|s| s.vault == 2 && s.can_continue)
                .await
                .unwrap();

            // Rejected command does not stop the loop
            sender.send(Command::SetName(String::new())).await.unwrap();
            sender.send(Command::StartOver).await.unwrap();
            sender.send(Command::Stop).await.unwrap();
            snapshots
                .wait_for(|s| s.status == PlayState::WinStop && !s.can_stop)
                .await
                .unwrap();
            sender.send(Command::Quit).await.unwrap();
        };
        tokio::join!(game.run(receiver), script);

        assert_eq!(context.access_requests(), 1);
        assert_eq!(context.alarms() + context.jackpots(), 1);
    }

    #[tokio::test]
    async fn test_run_hears_continue_queued_with_other_commands() {
        for seed in 0..20 {
            let context = Context::new();
            let mut game = Game::new(
                context.clone(),
                GameConfig::default(),
                GameRng::from_seed(seed),
            )
            .unwrap();
            game.set_name("Ada");
            game.start_over_with(SessionLayout::new(10, false))
                .await
                .unwrap();
            assert!(game.toggle_speech().await);
            let mut snapshots = game.subscribe();
            let (sender, receiver) = mpsc::channel(4);

            let script = async {
                sender.send(Command::SetName("Bob".into())).await.unwrap();
                context.say("continue");
                snapshots
                    .wait_for(|s| s.name == "Bob" && s.vault == 2 && s.can_continue)
                    .await
                    .unwrap();
                sender.send(Command::Quit).await.unwrap();
            };
            tokio::join!(game.run(receiver), script);
            assert_eq!(snapshots.borrow().vault, 2, "seed {seed}");
        }
    }

    #[tokio::test]
    async fn test_run_drops_utterances_heard_during_transition() {
        let context = Context::new();
        let mut game = game(&context);
        game.start_over_with(SessionLayout::new(10, false))
            .await
            .unwrap();
        assert!(game.toggle_speech().await);
        context.say_after("Vault 2", "continue");
        let mut snapshots = game.subscribe();
        let (sender, receiver) = mpsc::channel(4);

        let script = async {
            sender.send(Command::Continue).await.unwrap();
            snapshots
                .wait_for(|s| s.vault == 2 && s.can_continue)
                .await
                .unwrap();
            sender.send(Command::Quit).await.unwrap();
        };
        tokio::join!(game.run(receiver), script);

        // Spoken while vault 2 was announced, so vault 3 stays shut
        assert_eq!(snapshots.borrow().vault, 2);
        assert!(snapshots.borrow().listening);
        assert!(context.spoken().iter().any(|line| line == "Vault 2"));
    }

    #[tokio::test]
    async fn test_run_stops_listening_when_stream_ends() {
        let context = Context::new();
        let game = game(&context);
        let mut snapshots = game.subscribe();
        let (sender, receiver) = mpsc::channel(4);

        let script = async {
            sender.send(Command::ToggleSpeech).await.unwrap();
            snapshots.wait_for(|s| s.listening).await.unwrap();
            context.close_microphone();
            snapshots.wait_for(|s| !s.listening).await.unwrap();
            drop(sender);
        };
        tokio::join!(game.run(receiver), script);
        assert_eq!(context.listens(), 1);
    }

    #[tokio::test]
    async fn test_run_ends_when_channel_closes() {
        let context = Context::new();
        let game = game(&context);
        let (sender, receiver) = mpsc::channel(1);
        drop(sender);
        game.run(receiver).await;
        assert!(context.activity().is_empty());
    }
}
