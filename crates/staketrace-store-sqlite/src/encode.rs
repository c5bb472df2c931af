//! Row codecs — raw SQLite rows to and from core value types.

use chrono::{DateTime, SecondsFormat, Utc};
use staketrace_core::{
  event::{Address, ObjectId, PoolId},
  position::{CoinBalance, StakedPosition},
};

/// ISO 8601 with `Z` suffix, the sink's `recorded_at` format.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `staked_positions` row exactly as SQLite hands it back.
pub struct RawStakedRow {
  pub object_id:              String,
  pub version:                u64,
  pub at_epoch:               u64,
  pub owner:                  String,
  pub pool_id:                Option<String>,
  pub principal:              Option<u64>,
  pub stake_activation_epoch: Option<u64>,
  pub deleted:                bool,
}

impl RawStakedRow {
  pub fn into_position(self) -> StakedPosition {
    StakedPosition {
      object_id:              ObjectId(self.object_id),
      version:                self.version,
      owner:                  Address(self.owner),
      pool_id:                self.pool_id.map(PoolId).unwrap_or_default(),
      principal:              self.principal.unwrap_or(0),
      stake_activation_epoch: self.stake_activation_epoch.unwrap_or(0),
      at_epoch:               self.at_epoch,
      deleted:                self.deleted,
    }
  }
}

/// A `coin_balances` row exactly as SQLite hands it back.
pub struct RawCoinRow {
  pub object_id: String,
  pub version:   u64,
  pub at_epoch:  u64,
  pub owner:     String,
  pub balance:   Option<u64>,
  pub deleted:   bool,
}

impl RawCoinRow {
  pub fn into_balance(self) -> CoinBalance {
    CoinBalance {
      object_id: ObjectId(self.object_id),
      version:   self.version,
      owner:     Address(self.owner),
      balance:   self.balance.unwrap_or(0),
      at_epoch:  self.at_epoch,
      deleted:   self.deleted,
    }
  }
}
