//! Collaborator traits — the narrow seams between the core and the outside
//! world.
//!
//! The core never fetches or persists anything itself. An [`EventSource`]
//! supplies the raw inputs (implemented over a fullnode RPC API in
//! `staketrace-cli`); a [`PositionSink`] durably records reconstructed
//! states for later point-in-time queries (implemented over SQLite in
//! `staketrace-store-sqlite`).
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes.

use std::{collections::HashMap, future::Future};

use serde::{Deserialize, Serialize};

use crate::{
  event::{Address, Epoch, ObjectId, PoolId, TxRecord, ValidatorId, Version},
  position::{CoinBalance, StakedPosition},
  resolve::ObjectRef,
  snapshot::RateTable,
};

// ─── Hydrated past objects ───────────────────────────────────────────────────

/// The content of one historical object version, hydrated by the event
/// source from a resolved [`ObjectRef`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PastObject {
  /// A staked position object.
  Staked {
    object_id:              ObjectId,
    version:                Version,
    owner:                  Address,
    pool_id:                PoolId,
    principal:              u64,
    stake_activation_epoch: Epoch,
  },
  /// A liquid coin object.
  Coin {
    object_id: ObjectId,
    version:   Version,
    owner:     Address,
    balance:   u64,
  },
  /// The source no longer holds this version (pruned history). A
  /// resolution gap on the fetch side; skipped, never an error.
  Missing { object_id: ObjectId, version: Version },
}

// ─── Event source ────────────────────────────────────────────────────────────

/// Paged supplier of raw inputs: per-owner transaction streams, the
/// exchange-rate snapshot table, the active validator↔pool mapping, and
/// historical object hydration.
pub trait EventSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All transaction records touching `owner`, in the time order the
  /// caller wants reflected in the timelines.
  fn transactions_for(
    &self,
    owner: &Address,
  ) -> impl Future<Output = Result<Vec<TxRecord>, Self::Error>> + Send;

  /// The full exchange-rate snapshot table, keyed by
  /// `(epoch, validator_id)`.
  fn rate_table(
    &self,
  ) -> impl Future<Output = Result<RateTable, Self::Error>> + Send;

  /// The current mapping from active staking pools to their validators.
  fn active_pools(
    &self,
  ) -> impl Future<Output = Result<HashMap<PoolId, ValidatorId>, Self::Error>> + Send;

  /// Hydrate the content of specific historical object versions. Output
  /// order matches input order; unavailable versions come back as
  /// [`PastObject::Missing`].
  fn past_objects(
    &self,
    refs: &[ObjectRef],
  ) -> impl Future<Output = Result<Vec<PastObject>, Self::Error>> + Send;
}

// ─── Sink ────────────────────────────────────────────────────────────────────

/// Durable store for reconstructed object states, keyed by
/// `(object_id, version)`. The core has no opinion on the storage format or
/// durability guarantees.
pub trait PositionSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Upsert a batch of staked-position rows (live states and tombstones).
  fn record_staked(
    &self,
    rows: Vec<StakedPosition>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Upsert a batch of coin-balance rows (live states and tombstones).
  fn record_coins(
    &self,
    rows: Vec<CoinBalance>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The latest non-tombstoned version of each staked position `owner`
  /// held as of `at_epoch`.
  fn staked_for(
    &self,
    owner: &Address,
    at_epoch: Epoch,
  ) -> impl Future<Output = Result<Vec<StakedPosition>, Self::Error>> + Send;

  /// The latest non-tombstoned version of each coin object `owner` held as
  /// of `at_epoch`.
  fn coins_for(
    &self,
    owner: &Address,
    at_epoch: Epoch,
  ) -> impl Future<Output = Result<Vec<CoinBalance>, Self::Error>> + Send;
}
