//! Exchange-rate snapshots — periodic checkpoints of a staking pool's
//! token-to-principal conversion rate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::event::{Epoch, ValidatorId};

/// One pool-token exchange-rate checkpoint, keyed by `(epoch, validator)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRateSnapshot {
  pub epoch:             Epoch,
  pub validator_id:      ValidatorId,
  pub pool_token_amount: u64,
  /// Principal backing the pool tokens, in the token's smallest unit.
  pub principal_amount:  u64,
}

impl ExchangeRateSnapshot {
  /// Pool tokens per unit of principal. `None` when the snapshot is
  /// degenerate (zero principal); callers treat that like a missing
  /// snapshot rather than dividing by zero.
  pub fn rate(&self) -> Option<f64> {
    if self.principal_amount == 0 {
      return None;
    }
    Some(self.pool_token_amount as f64 / self.principal_amount as f64)
  }
}

/// Snapshot table keyed uniquely by `(epoch, validator_id)`.
///
/// Iteration order is never observed; lookups are the only read path, so the
/// resolver's order-independence invariant holds by construction.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
  inner: HashMap<(Epoch, ValidatorId), ExchangeRateSnapshot>,
}

impl RateTable {
  pub fn new() -> Self { Self::default() }

  /// Insert a snapshot, replacing any previous entry for its key.
  pub fn insert(&mut self, snapshot: ExchangeRateSnapshot) {
    self
      .inner
      .insert((snapshot.epoch, snapshot.validator_id.clone()), snapshot);
  }

  pub fn get(
    &self,
    epoch: Epoch,
    validator_id: &ValidatorId,
  ) -> Option<&ExchangeRateSnapshot> {
    self.inner.get(&(epoch, validator_id.clone()))
  }

  pub fn len(&self) -> usize { self.inner.len() }

  pub fn is_empty(&self) -> bool { self.inner.is_empty() }
}

impl FromIterator<ExchangeRateSnapshot> for RateTable {
  fn from_iter<I: IntoIterator<Item = ExchangeRateSnapshot>>(iter: I) -> Self {
    let mut table = Self::new();
    for snapshot in iter {
      table.insert(snapshot);
    }
    table
  }
}
