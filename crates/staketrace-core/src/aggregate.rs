//! Per-epoch totals — a thin fold over resolver and calculator outputs.

use serde::{Deserialize, Serialize};

use crate::{
  position::{CoinBalance, StakedPosition},
  reward::RewardResult,
};

/// Totals for one owner at one query epoch, in the token's smallest unit
/// (rewards carry the calculator's float precision).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochTotals {
  /// Sum of non-staked coin balances.
  pub liquid:  u64,
  /// Sum of staked principals.
  pub staked:  u64,
  /// Sum of estimated rewards over all resolved staked positions.
  pub rewards: f64,
}

/// Fold resolved balances, positions, and their rewards into totals.
/// Tombstones contribute nothing.
pub fn totals_at_epoch(
  coins: &[CoinBalance],
  positions: &[StakedPosition],
  rewards: &[RewardResult],
) -> EpochTotals {
  let liquid = coins
    .iter()
    .filter(|c| !c.deleted)
    .map(|c| c.balance)
    .sum();
  let staked = positions
    .iter()
    .filter(|p| !p.deleted)
    .map(|p| p.principal)
    .sum();
  let rewards = rewards.iter().map(|r| r.estimated_reward).sum();

  EpochTotals { liquid, staked, rewards }
}

/// Running sum of a per-epoch reward series: element `i` of the output is
/// the total accrued through epoch `i` of the input.
pub fn cumulative(per_epoch: &[f64]) -> Vec<f64> {
  per_epoch
    .iter()
    .scan(0.0, |acc, reward| {
      *acc += reward;
      Some(*acc)
    })
    .collect()
}
