//! Reconstructed object states — the value records handed to the sink.

use serde::{Deserialize, Serialize};

use crate::event::{Address, Epoch, ObjectId, PoolId, Version};

/// A staked position resolved as existing at a query epoch, or a tombstone
/// marking its deletion (`deleted = true`, staking fields zeroed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakedPosition {
  pub object_id:              ObjectId,
  pub version:                Version,
  pub owner:                  Address,
  pub pool_id:                PoolId,
  /// In the token's smallest unit.
  pub principal:              u64,
  pub stake_activation_epoch: Epoch,
  /// The query epoch this state was resolved for.
  pub at_epoch:               Epoch,
  pub deleted:                bool,
}

impl StakedPosition {
  /// Tombstone row: the object was deleted at `at_epoch`. Staking fields
  /// are not recoverable from a deletion record and are zeroed.
  pub fn tombstone(
    object_id: ObjectId,
    version: Version,
    owner: Address,
    at_epoch: Epoch,
  ) -> Self {
    Self {
      object_id,
      version,
      owner,
      pool_id: PoolId::default(),
      principal: 0,
      stake_activation_epoch: 0,
      at_epoch,
      deleted: true,
    }
  }
}

/// A liquid coin object resolved as existing at a query epoch, or its
/// tombstone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinBalance {
  pub object_id: ObjectId,
  pub version:   Version,
  pub owner:     Address,
  /// In the token's smallest unit.
  pub balance:   u64,
  pub at_epoch:  Epoch,
  pub deleted:   bool,
}

impl CoinBalance {
  pub fn tombstone(
    object_id: ObjectId,
    version: Version,
    owner: Address,
    at_epoch: Epoch,
  ) -> Self {
    Self { object_id, version, owner, balance: 0, at_epoch, deleted: true }
  }
}
