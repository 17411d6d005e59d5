/// Win amount awarded when a jackpot session reaches its final vault
pub const JACKPOT_PAYOUT: u64 = 1_000_000;

/// One in this many sessions is a jackpot session
pub const JACKPOT_ODDS: u32 = 40;

/// Fewest vaults a session can have (inclusive)
pub const MIN_ROUNDS: u32 = 4;

/// Upper bound on vaults per session (exclusive)
pub const MAX_ROUNDS: u32 = 15;

/// Word that triggers Continue when recognized in an utterance
pub const CONTINUE_KEYWORD: &str = "continue";

/// Default payout weights as `(amount, weight)` pairs.
pub const DEFAULT_PAYOUT_WEIGHTS: [(u64, u32); 7] = [
    (50, 10),
    (100, 25),
    (200, 25),
    (250, 25),
    (300, 25),
    (500, 25),
    (1_000, 25),
];

/// Pause after the greeting and after "let's open it up" (milliseconds).
pub const DEFAULT_INTRO_PAUSE_MS: u64 = 1_000;

/// Pause after each reveal or stop sentence (milliseconds).
pub const DEFAULT_REVEAL_PAUSE_MS: u64 = 500;

/// Delay between rounds revealed automatically after a stop (milliseconds).
pub const DEFAULT_AUTO_REVEAL_DELAY_MS: u64 = 500;

/// Upper bound on the sum of all payout weights (one slot per unit of weight).
pub const MAX_TOTAL_WEIGHT: u64 = 10_000;
