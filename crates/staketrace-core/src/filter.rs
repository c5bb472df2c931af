//! Event filter — narrows a raw transaction stream to the entries relevant
//! to one (owner, resource-type) pair.
//!
//! Deletion entries carry no owner or type information, so the filter keeps
//! a working set of object ids already seen as relevant in this run and
//! retains a deletion only when its object id is in that set.

use std::collections::HashSet;

use crate::event::{Address, ObjectId, TxRecord};

/// Filter `txs` down to the transactions holding at least one entry relevant
/// to `owner` and `object_type` (exact match), with irrelevant entries
/// stripped from each retained transaction.
///
/// Referentially transparent: same inputs, same output. Transaction order is
/// preserved, and matters — a deletion is only recognised after the object
/// it tombstones has appeared as a relevant change earlier in the stream.
pub fn filter_transactions(
  owner: &Address,
  object_type: &str,
  txs: &[TxRecord],
) -> Vec<TxRecord> {
  let mut relevant_ids: HashSet<ObjectId> = HashSet::new();
  let mut filtered = Vec::new();

  for tx in txs {
    let changes: Vec<_> = tx
      .changes
      .iter()
      .filter(|c| c.owner == *owner && c.object_type == object_type)
      .cloned()
      .collect();

    for change in &changes {
      relevant_ids.insert(change.object_id.clone());
    }

    let deletions: Vec<_> = tx
      .deletions
      .iter()
      .filter(|d| relevant_ids.contains(&d.object_id))
      .cloned()
      .collect();

    if !changes.is_empty() || !deletions.is_empty() {
      filtered.push(TxRecord {
        digest: tx.digest.clone(),
        executed_epoch: tx.executed_epoch,
        changes,
        deletions,
      });
    }
  }

  filtered
}
