//! Wallet sync: pull a wallet's transaction history, rebuild object
//! timelines, hydrate every observed version and persist the lot.
//!
//! Each tracked type goes through the same pipeline: filter the raw
//! transaction stream down to the type, fold it into timelines, fetch the
//! content of every `(object id, version)` point the timelines name, then
//! write one row per point plus one tombstone per deletion. Point-in-time
//! queries are answered later by the sink, not here.

use std::collections::HashMap;

use anyhow::Result;
use staketrace_core::{
  event::{Address, Epoch, ObjectId, TxRecord, Version},
  filter::filter_transactions,
  position::{CoinBalance, StakedPosition},
  resolve::ObjectRef,
  source::{EventSource, PastObject, PositionSink},
  timeline::build_timelines,
};
use tracing::{info, warn};

use crate::rpc::{STAKED_SUI_TYPE, SUI_COIN_TYPE};

/// Row counts written by one sync pass, tombstones included.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncStats {
  pub staked_rows: usize,
  pub coin_rows:   usize,
}

/// Every `(object id, version)` point a set of timelines names, plus the
/// epoch each point was observed at.
struct ObservedVersions {
  refs:   Vec<ObjectRef>,
  epochs: HashMap<(ObjectId, Version), Epoch>,
}

fn observed_versions(txs: &[TxRecord]) -> Result<ObservedVersions> {
  let timelines = build_timelines(txs)?;

  let mut refs = Vec::new();
  let mut epochs = HashMap::new();

  for timeline in timelines.values() {
    // The seed version is only a real state when the creation was seen;
    // a mutated-only timeline's seed duplicates its first mutation point.
    if let Some(created) = timeline.created {
      refs.push(ObjectRef {
        object_id: timeline.object_id.clone(),
        version:   timeline.version,
      });
      epochs.insert((timeline.object_id.clone(), timeline.version), created);
    }

    for &(epoch, version) in &timeline.mutated {
      let key = (timeline.object_id.clone(), version);
      if epochs.insert(key, epoch).is_none() {
        refs.push(ObjectRef {
          object_id: timeline.object_id.clone(),
          version,
        });
      }
    }
  }

  refs.sort();
  Ok(ObservedVersions { refs, epochs })
}

/// Sync one wallet end to end: staked positions first, then liquid coins.
pub async fn sync_wallet<S, K>(
  source: &S,
  sink: &K,
  owner: &Address,
) -> Result<SyncStats>
where
  S: EventSource,
  K: PositionSink,
{
  let txs = source.transactions_for(owner).await?;
  info!(owner = %owner, transactions = txs.len(), "transaction history fetched");

  let staked_rows = sync_staked(source, sink, owner, &txs).await?;
  let coin_rows = sync_coins(source, sink, owner, &txs).await?;

  Ok(SyncStats { staked_rows, coin_rows })
}

async fn sync_staked<S, K>(
  source: &S,
  sink: &K,
  owner: &Address,
  txs: &[TxRecord],
) -> Result<usize>
where
  S: EventSource,
  K: PositionSink,
{
  let filtered = filter_transactions(owner, STAKED_SUI_TYPE, txs);
  let observed = observed_versions(&filtered)?;

  let mut rows = Vec::with_capacity(observed.refs.len());
  for object in source.past_objects(&observed.refs).await? {
    match object {
      PastObject::Staked {
        object_id,
        version,
        owner,
        pool_id,
        principal,
        stake_activation_epoch,
      } => {
        let Some(&at_epoch) = observed.epochs.get(&(object_id.clone(), version))
        else {
          warn!(object = %object_id, version, "hydrated version was never requested; skipped");
          continue;
        };
        rows.push(StakedPosition {
          object_id,
          version,
          owner,
          pool_id,
          principal,
          stake_activation_epoch,
          at_epoch,
          deleted: false,
        });
      }
      PastObject::Missing { object_id, version } => {
        warn!(object = %object_id, version, "version pruned from node history");
      }
      PastObject::Coin { object_id, .. } => {
        warn!(object = %object_id, "staked ref hydrated as a coin; skipped");
      }
    }
  }

  for tx in &filtered {
    for deletion in &tx.deletions {
      rows.push(StakedPosition::tombstone(
        deletion.object_id.clone(),
        deletion.version,
        owner.clone(),
        tx.executed_epoch,
      ));
    }
  }

  let count = rows.len();
  sink.record_staked(rows).await?;
  Ok(count)
}

async fn sync_coins<S, K>(
  source: &S,
  sink: &K,
  owner: &Address,
  txs: &[TxRecord],
) -> Result<usize>
where
  S: EventSource,
  K: PositionSink,
{
  let filtered = filter_transactions(owner, SUI_COIN_TYPE, txs);
  let observed = observed_versions(&filtered)?;

  let mut rows = Vec::with_capacity(observed.refs.len());
  for object in source.past_objects(&observed.refs).await? {
    match object {
      PastObject::Coin { object_id, version, owner, balance } => {
        let Some(&at_epoch) = observed.epochs.get(&(object_id.clone(), version))
        else {
          warn!(object = %object_id, version, "hydrated version was never requested; skipped");
          continue;
        };
        rows.push(CoinBalance {
          object_id,
          version,
          owner,
          balance,
          at_epoch,
          deleted: false,
        });
      }
      PastObject::Missing { object_id, version } => {
        warn!(object = %object_id, version, "version pruned from node history");
      }
      PastObject::Staked { object_id, .. } => {
        warn!(object = %object_id, "coin ref hydrated as a staked object; skipped");
      }
    }
  }

  for tx in &filtered {
    for deletion in &tx.deletions {
      rows.push(CoinBalance::tombstone(
        deletion.object_id.clone(),
        deletion.version,
        owner.clone(),
        tx.executed_epoch,
      ));
    }
  }

  let count = rows.len();
  sink.record_coins(rows).await?;
  Ok(count)
}
