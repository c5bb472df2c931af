//! Reward calculator — accrued staking reward between an activation epoch
//! and a target epoch, from exchange-rate snapshots.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  event::{Epoch, PoolId, ValidatorId},
  snapshot::RateTable,
};

/// Two-stage pool→validator resolution: a fast lookup over currently active
/// validators, falling back to an explicit traversal for pools that have
/// since become inactive.
///
/// The fallback returns [`crate::Error::PoolNotFound`] when exhausted; that
/// error must propagate — a position whose pool cannot be identified must
/// not silently default.
pub trait ValidatorDirectory {
  /// Look up the validator currently operating `pool_id`, if the pool is
  /// active.
  fn active_validator(&self, pool_id: &PoolId) -> Option<ValidatorId>;

  /// Resolve a pool that is no longer active, typically via a multi-hop
  /// traversal through auxiliary records.
  fn resolve_inactive(&self, pool_id: &PoolId) -> Result<ValidatorId>;
}

/// Output of [`calculate_reward`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardResult {
  pub rate_at_activation: f64,
  pub rate_at_target:     f64,
  /// Same unit as the principal; never negative.
  pub estimated_reward:   f64,
  pub validator_id:       ValidatorId,
}

/// Compute the reward accrued by `principal` staked in `pool_id` between
/// `activation_epoch` and `target_epoch`.
///
/// Missing snapshots default the corresponding rate to `1.0` (no
/// appreciation assumed), and a negative computed reward clamps to zero:
/// rates only fall as rewards compound, so a negative implies snapshot
/// noise, not a loss. Both are documented business rules, not faults.
/// Equal activation and target epochs still perform both lookups.
pub fn calculate_reward(
  principal: u64,
  pool_id: &PoolId,
  activation_epoch: Epoch,
  target_epoch: Epoch,
  directory: &impl ValidatorDirectory,
  rates: &RateTable,
) -> Result<RewardResult> {
  let validator_id = match directory.active_validator(pool_id) {
    Some(id) => id,
    None => directory.resolve_inactive(pool_id)?,
  };

  let rate_at_activation = rates
    .get(activation_epoch, &validator_id)
    .and_then(|s| s.rate())
    .unwrap_or(1.0);

  let rate_at_target = rates
    .get(target_epoch, &validator_id)
    .and_then(|s| s.rate())
    .unwrap_or(1.0);

  let estimated_reward =
    ((rate_at_activation / rate_at_target - 1.0) * principal as f64).max(0.0);

  Ok(RewardResult {
    rate_at_activation,
    rate_at_target,
    estimated_reward,
    validator_id,
  })
}
