mod commands;
mod config;
mod console;

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use beatthebank_execution::{simulate, Game, GameRng, SimulationReport, StopStrategy};
use beatthebank_types::{Command, PlayState, Snapshot};
use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use commands::{parse_line, render_help, CommandAction};
use config::Config;
use console::Console;

/// CLI flags (override values from the config file)
#[derive(Parser, Debug)]
#[command(name = "beatthebank", about = "Open vaults, stop in time, beat the bank")]
struct Args {
    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// trace | debug | info | warn | error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Seed for reproducible sessions
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Mode {
    /// Play interactively (default)
    Play {
        /// Player name
        #[arg(long)]
        name: Option<String>,

        /// Deny microphone access to /speech
        #[arg(long)]
        no_microphone: bool,
    },
    /// Play many sessions without narration and report the odds
    Simulate {
        #[arg(long, default_value_t = 100_000)]
        sessions: u64,

        /// Stop once this vault is opened (default: never stop)
        #[arg(long)]
        stop_after: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(Mode::Play {
        name,
        no_microphone,
    }) = &args.mode
    {
        if let Some(name) = name {
            config.name = Some(name.clone());
        }
        if *no_microphone {
            config.microphone = false;
        }
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &Config) -> Result<()> {
    let level = config.log_level()?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn rng_for(config: &Config) -> GameRng {
    match config.seed {
        Some(seed) => GameRng::from_seed(seed),
        None => GameRng::from_entropy(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = build_config(&args)?;
    init_tracing(&config)?;

    match args.mode {
        Some(Mode::Simulate {
            sessions,
            stop_after,
            json,
        }) => run_simulation(&config, sessions, stop_after, json),
        Some(Mode::Play { .. }) | None => play(config).await,
    }
}

fn run_simulation(config: &Config, sessions: u64, stop_after: Option<u32>, json: bool) -> Result<()> {
    let table = config.game.payout_table()?;
    let strategy = stop_after.map_or(StopStrategy::Never, StopStrategy::AfterVault);
    let mut rng = rng_for(config);
    info!(sessions, ?strategy, seed = ?config.seed, "Simulating");

    let report = simulate(sessions, strategy, &mut rng, &table)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report, strategy, table.expected_payout()));
    }
    Ok(())
}

fn render_report(report: &SimulationReport, strategy: StopStrategy, expected_payout: f64) -> String {
    let mut out = String::new();
    let strategy = match strategy {
        StopStrategy::Never => "never stop".to_string(),
        StopStrategy::AfterVault(vault) => format!("stop after vault {vault}"),
    };
    out.push_str(&format!("Strategy: {strategy}\n"));
    out.push_str(&format!("Sessions: {}\n", report.sessions));
    out.push_str(&format!(
        "Mean win: ${:.2} (± {:.2})\n",
        report.mean_won(),
        report.stderr()
    ));
    out.push_str(&format!(
        "Outcomes: {} jackpot wins, {} stops, {} busts ({:.2}% bust)\n",
        report.wins,
        report.stops,
        report.losses,
        report.loss_rate() * 100.0
    ));
    out.push_str(&format!(
        "Jackpot sessions: {} ({:.2}%)\n",
        report.jackpots,
        report.jackpot_rate() * 100.0
    ));
    out.push_str(&format!("Expected payout per vault: ${expected_payout:.2}\n"));
    out.push_str("Payouts drawn:\n");
    for (amount, share) in report.payout_frequencies() {
        out.push_str(&format!("  ${amount:<6} {:>6.2}%\n", share * 100.0));
    }
    out
}

async fn play(config: Config) -> Result<()> {
    let console = Console::new(config.speech_ms_per_word, config.microphone);
    let mut game = Game::new(console.clone(), config.game.clone(), rng_for(&config))
        .context("invalid game config")?;
    if let Some(name) = &config.name {
        game.set_name(name.as_str());
    }

    let (commands, receiver) = mpsc::channel(32);
    let snapshots = game.subscribe();

    // Blocking stdin lives on its own thread so shutdown never waits on it
    std::thread::spawn({
        let console = console.clone();
        let snapshots = snapshots.clone();
        move || read_input(console, commands, snapshots)
    });
    tokio::spawn(render(snapshots));

    println!("Beat the Bank. Type /help for commands.");
    if config.name.is_none() {
        println!("Set your name with /name <name>, then /start.");
    }
    game.run(receiver).await;
    Ok(())
}

fn read_input(console: Console, commands: mpsc::Sender<Command>, snapshots: watch::Receiver<Snapshot>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(?e, "Failed to read input");
                break;
            }
        };
        match parse_line(&line) {
            Ok(CommandAction::Game(command)) => {
                let quit = command == Command::Quit;
                if commands.blocking_send(command).is_err() || quit {
                    return;
                }
            }
            Ok(CommandAction::Status) => println!("{}", render_status(&snapshots.borrow())),
            Ok(CommandAction::Help) => print!("{}", render_help()),
            Ok(CommandAction::Utterance(utterance)) => {
                if !console.hear(&utterance) {
                    println!("  (not listening; /speech to talk)");
                }
            }
            Ok(CommandAction::Empty) => {}
            Err(e) => println!("  {e}"),
        }
    }
    let _ = commands.blocking_send(Command::Quit);
}

async fn render(mut snapshots: watch::Receiver<Snapshot>) {
    let mut last = snapshots.borrow_and_update().clone();
    while snapshots.changed().await.is_ok() {
        let current = snapshots.borrow_and_update().clone();
        if current.vault != last.vault || current.status != last.status {
            println!("{}", render_status(&current));
        }
        if current.listening != last.listening {
            println!(
                "  voice continue {}",
                if current.listening { "on" } else { "off" }
            );
        }
        last = current;
    }
}

fn render_status(snapshot: &Snapshot) -> String {
    let outcome = match snapshot.status {
        PlayState::InProgress => "in progress".to_string(),
        PlayState::Win => format!("JACKPOT, you won ${}", snapshot.win_amount),
        PlayState::WinStop => format!(
            "stopped at vault {} with ${}",
            snapshot.stop_vault, snapshot.win_amount
        ),
        PlayState::Lose => "busted, you won $0".to_string(),
    };
    let mut actions = Vec::new();
    if snapshot.can_continue {
        actions.push("/continue");
    }
    if snapshot.can_stop {
        actions.push("/stop");
    }
    if snapshot.can_start_over {
        actions.push("/start");
    }
    format!(
        "[vault {} | ${} | {}] {}",
        snapshot.vault,
        snapshot.amount,
        outcome,
        actions.join(" ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_play_mode() {
        let args = Args::parse_from(["beatthebank"]);
        assert_eq!(args.mode, None);
        let config = build_config(&args).expect("config should build");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn play_flags_override_config() {
        let args = Args::parse_from([
            "beatthebank",
            "--seed",
            "9",
            "--log-level",
            "debug",
            "play",
            "--name",
            "Ada",
            "--no-microphone",
        ]);
        let config = build_config(&args).expect("config should build");
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.name.as_deref(), Some("Ada"));
        assert!(!config.microphone);
    }

    #[test]
    fn parses_simulate_flags() {
        let args = Args::parse_from([
            "beatthebank",
            "simulate",
            "--sessions",
            "10",
            "--stop-after",
            "3",
            "--json",
        ]);
        assert_eq!(
            args.mode,
            Some(Mode::Simulate {
                sessions: 10,
                stop_after: Some(3),
                json: true
            })
        );
    }

    #[test]
    fn rejects_bad_log_level_flag() {
        let args = Args::parse_from(["beatthebank", "--log-level", "chatty"]);
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("chatty"), "unexpected error: {err}");
    }

    #[test]
    fn report_mentions_strategy_and_payouts() {
        let mut rng = GameRng::from_seed(3);
        let table = beatthebank_types::PayoutTable::default();
        let strategy = StopStrategy::AfterVault(2);
        let report = simulate(200, strategy, &mut rng, &table).unwrap();
        let text = render_report(&report, strategy, table.expected_payout());
        assert!(text.contains("stop after vault 2"));
        assert!(text.contains("Sessions: 200"));
        assert!(text.contains("$1000"));
    }

    #[test]
    fn status_line_lists_enabled_actions() {
        let snapshot = Snapshot {
            vault: 2,
            amount: 300,
            can_continue: true,
            can_stop: true,
            ..Default::default()
        };
        assert_eq!(
            render_status(&snapshot),
            "[vault 2 | $300 | in progress] /continue /stop"
        );

        let stopped = Snapshot {
            vault: 5,
            stop_vault: 2,
            amount: 900,
            win_amount: 300,
            status: PlayState::WinStop,
            can_start_over: true,
            ..Default::default()
        };
        assert_eq!(
            render_status(&stopped),
            "[vault 5 | $900 | stopped at vault 2 with $300] /start"
        );
    }

    #[tokio::test]
    async fn plays_a_scripted_session_with_mocks() {
        use beatthebank_execution::mocks::Context;
        use beatthebank_execution::{GameConfig, SessionLayout};

        let context = Context::new();
        let mut game = Game::new(context.clone(), GameConfig::default(), GameRng::from_seed(1)).unwrap();
        game.handle(Command::SetName("Ada".into())).await.unwrap();
        game.start_over_with(SessionLayout::new(5, false)).await.unwrap();
        game.handle(Command::Stop).await.unwrap();

        let line = render_status(&game.snapshot());
        assert!(line.starts_with("[vault 5 |"), "unexpected status: {line}");
        assert!(line.contains("stopped at vault 1"));
    }
}
