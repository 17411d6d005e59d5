//! Monte-Carlo play of many sessions against the bare state machine.
//!
//! No speech, sound or delays are involved; each session is played with a
//! fixed [`StopStrategy`] and then revealed to the end, the same way the
//! driver does after a stop.

use beatthebank_types::{PayoutTable, PlayState};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{
    rng::GameRng,
    session::{GameError, RoundOutcome, Session},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "vault", rename_all = "snake_case")]
pub enum StopStrategy {
    /// Always continue to the final vault.
    Never,
    /// Stop as soon as this vault has been opened (if the session is still in progress).
    AfterVault(u32),
}

impl StopStrategy {
    fn should_stop(&self, vault: u32) -> bool {
        match self {
            StopStrategy::Never => false,
            StopStrategy::AfterVault(target) => vault >= *target,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SimulationReport {
    pub sessions: u64,
    pub wins: u64,
    pub stops: u64,
    pub losses: u64,
    pub jackpots: u64,
    pub total_won: u64,
    pub vaults_opened: u64,
    /// How often each payout was drawn.
    pub payouts: BTreeMap<u64, u64>,

    #[serde(skip)]
    total_won_sq: f64,
}

impl SimulationReport {
    fn add_session(&mut self, session: &Session) {
        let won = session.win_amount();
        self.sessions += 1;
        self.total_won += won;
        self.total_won_sq += (won as f64) * (won as f64);
        self.vaults_opened += session.vault() as u64;
        if session.is_jackpot() {
            self.jackpots += 1;
        }
        match session.status() {
            PlayState::Win => self.wins += 1,
            PlayState::WinStop => self.stops += 1,
            PlayState::Lose => self.losses += 1,
            PlayState::InProgress => {}
        }
    }

    pub fn mean_won(&self) -> f64 {
        if self.sessions == 0 {
            0.0
        } else {
            self.total_won as f64 / self.sessions as f64
        }
    }

    /// Standard error of the mean win.
    pub fn stderr(&self) -> f64 {
        if self.sessions <= 1 {
            return 0.0;
        }
        let n = self.sessions as f64;
        let mean = self.mean_won();
        let var = (self.total_won_sq / n - mean * mean).max(0.0);
        (var / n).sqrt()
    }

    pub fn jackpot_rate(&self) -> f64 {
        self.rate(self.jackpots)
    }

    pub fn loss_rate(&self) -> f64 {
        self.rate(self.losses)
    }

    fn rate(&self, count: u64) -> f64 {
        if self.sessions == 0 {
            0.0
        } else {
            count as f64 / self.sessions as f64
        }
    }

    /// Observed share of each payout among all draws.
    pub fn payout_frequencies(&self) -> BTreeMap<u64, f64> {
        let draws: u64 = self.payouts.values().sum();
        self.payouts
            .iter()
            .map(|(&amount, &count)| (amount, count as f64 / draws.max(1) as f64))
            .collect()
    }
}

/// Play one session to the end and return it.
pub fn play_session(
    rng: &mut GameRng,
    table: &PayoutTable,
    strategy: StopStrategy,
    report: &mut SimulationReport,
) -> Result<Session, GameError> {
    let mut session = Session::new();
    session.start(rng.layout());
    while !session.is_complete() {
        if let RoundOutcome::Opened { payout, .. } = session.advance(rng, table)? {
            *report.payouts.entry(payout).or_default() += 1;
        }
        if session.can_stop() && strategy.should_stop(session.vault()) {
            session.stop()?;
        }
    }
    report.add_session(&session);
    Ok(session)
}

pub fn simulate(
    sessions: u64,
    strategy: StopStrategy,
    rng: &mut GameRng,
    table: &PayoutTable,
) -> Result<SimulationReport, GameError> {
    let mut report = SimulationReport::default();
    for _ in 0..sessions {
        play_session(rng, table, strategy, &mut report)?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatthebank_types::{JACKPOT_PAYOUT, MAX_ROUNDS};

    #[test]
    fn test_never_stop_only_jackpots_pay() {
        let mut rng = GameRng::from_seed(11);
        let report =
            simulate(20_000, StopStrategy::Never, &mut rng, &PayoutTable::default()).unwrap();

        assert_eq!(report.sessions, 20_000);
        assert_eq!(report.stops, 0);
        assert_eq!(report.wins, report.jackpots);
        assert_eq!(report.wins + report.losses, report.sessions);
        assert_eq!(report.total_won, report.jackpots * JACKPOT_PAYOUT);
        assert!((report.jackpot_rate() - 0.025).abs() < 0.006);
    }

    #[test]
    fn test_stop_after_first_vault() {
        let mut rng = GameRng::from_seed(12);
        let table = PayoutTable::default();
        let report = simulate(5_000, StopStrategy::AfterVault(1), &mut rng, &table).unwrap();

        // Every session has at least 4 vaults, so every session stops after the first
        assert_eq!(report.stops, report.sessions);
        assert_eq!(report.wins, 0);
        assert_eq!(report.losses, 0);
        assert!(report.mean_won() >= 50.0);
        assert!(report.mean_won() <= 1_000.0);
        assert!((report.mean_won() - table.expected_payout()).abs() < 5.0 * report.stderr() + 1.0);
    }

    #[test]
    fn test_stop_past_every_layout_never_stops() {
        let mut rng = GameRng::from_seed(13);
        let report = simulate(
            1_000,
            StopStrategy::AfterVault(MAX_ROUNDS),
            &mut rng,
            &PayoutTable::default(),
        )
        .unwrap();
        assert_eq!(report.stops, 0);
    }

    #[test]
    fn test_payout_frequencies_match_table() {
        let mut rng = GameRng::from_seed(14);
        let table = PayoutTable::default();
        let report = simulate(20_000, StopStrategy::Never, &mut rng, &table).unwrap();

        for (amount, observed) in report.payout_frequencies() {
            let expected = table.frequency(amount);
            assert!(
                (observed - expected).abs() < 0.01,
                "amount {amount}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_same_seed_same_report() {
        let table = PayoutTable::default();
        let a = simulate(500, StopStrategy::AfterVault(3), &mut GameRng::from_seed(5), &table);
        let b = simulate(500, StopStrategy::AfterVault(3), &mut GameRng::from_seed(5), &table);
        assert_eq!(a.unwrap(), b.unwrap());
    }
}
