use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::{DEFAULT_PAYOUT_WEIGHTS, MAX_TOTAL_WEIGHT};

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum PayoutTableError {
    #[error("payout table is empty")]
    Empty,
    #[error("payout amount must be > 0 (entry={index})")]
    ZeroAmount { index: usize },
    #[error("payout weight must be > 0 (entry={index}, amount={amount})")]
    ZeroWeight { index: usize, amount: u64 },
    #[error("payout weights sum to {total}, more than {max}")]
    TooHeavy { total: u64, max: u64 },
}

/// A single row of the payout table: `amount` appears `weight` times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutWeight {
    pub amount: u64,
    pub weight: u32,
}

impl PayoutWeight {
    pub const fn new(amount: u64, weight: u32) -> Self {
        Self { amount, weight }
    }
}

/// Flat weighted list of payouts.
///
/// Each amount is repeated `weight` times and a payout is drawn by picking an
/// index uniformly, so the relative frequency of an amount is
/// `weight / total_weight`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayoutTable {
    weights: Vec<PayoutWeight>,
    slots: Vec<u64>,
}

impl PayoutTable {
    pub fn new(weights: Vec<PayoutWeight>) -> Result<Self, PayoutTableError> {
        if weights.is_empty() {
            return Err(PayoutTableError::Empty);
        }
        for (index, entry) in weights.iter().enumerate() {
            if entry.amount == 0 {
                return Err(PayoutTableError::ZeroAmount { index });
            }
            if entry.weight == 0 {
                return Err(PayoutTableError::ZeroWeight {
                    index,
                    amount: entry.amount,
                });
            }
        }
        let total = weights
            .iter()
            .try_fold(0u64, |sum, entry| sum.checked_add(entry.weight as u64))
            .unwrap_or(u64::MAX);
        if total > MAX_TOTAL_WEIGHT {
            return Err(PayoutTableError::TooHeavy {
                total,
                max: MAX_TOTAL_WEIGHT,
            });
        }

        let slots = expand(&weights);
        Ok(Self { weights, slots })
    }

    pub fn weights(&self) -> &[PayoutWeight] {
        &self.weights
    }

    /// Number of slots (sum of all weights).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Amount stored at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<u64> {
        self.slots.get(index).copied()
    }

    /// Expected relative frequency of `amount` (0.0 if absent).
    pub fn frequency(&self, amount: u64) -> f64 {
        let weight: u64 = self
            .weights
            .iter()
            .filter(|entry| entry.amount == amount)
            .map(|entry| entry.weight as u64)
            .sum();
        weight as f64 / self.slots.len() as f64
    }

    /// Mean payout of a single draw.
    pub fn expected_payout(&self) -> f64 {
        let total: u64 = self.slots.iter().sum();
        total as f64 / self.slots.len() as f64
    }

    /// Draw one payout, uniform over slots.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let index = rng.gen_range(0..self.slots.len());
        self.slots[index]
    }
}

impl Default for PayoutTable {
    fn default() -> Self {
        let weights = default_payout_weights();
        let slots = expand(&weights);
        Self { weights, slots }
    }
}

/// The stock table: 50×10, then 25 each of 100, 200, 250, 300, 500 and 1000.
pub fn default_payout_weights() -> Vec<PayoutWeight> {
    DEFAULT_PAYOUT_WEIGHTS
        .iter()
        .map(|&(amount, weight)| PayoutWeight::new(amount, weight))
        .collect()
}

fn expand(weights: &[PayoutWeight]) -> Vec<u64> {
    weights
        .iter()
        .flat_map(|entry| std::iter::repeat(entry.amount).take(entry.weight as usize))
        .collect()
}

impl TryFrom<Vec<PayoutWeight>> for PayoutTable {
    type Error = PayoutTableError;

    fn try_from(weights: Vec<PayoutWeight>) -> Result<Self, Self::Error> {
        Self::new(weights)
    }
}
