//! Timeline builder — folds filtered transactions into one
//! [`ObjectTimeline`] per object id.
//!
//! Timelines are immutable once built. Every transition constructs a fresh
//! record (copy-with-update); the builder is a single-pass fold over the
//! transaction stream in the order supplied by the caller.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  event::{Epoch, EventStatus, ObjectEvent, ObjectId, TxRecord, Version},
};

// ─── Timeline ────────────────────────────────────────────────────────────────

/// The ordered lifecycle of one object, derived from its events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectTimeline {
  pub object_id: ObjectId,
  /// Digest of the first event sighted for this object.
  pub digest:    String,
  /// Seed version: the version carried by the first sighted event.
  pub version:   Version,
  /// Set exactly once, by the `created` event.
  pub created:   Option<Epoch>,
  /// Set exactly once, by the `deleted` event.
  pub deleted:   Option<Epoch>,
  /// One `(epoch, version)` pair per `mutated` event, in sighting order.
  /// Neither deduplicated nor sorted; the resolver tolerates any order.
  pub mutated:   Vec<(Epoch, Version)>,
}

impl ObjectTimeline {
  /// Fresh timeline seeded from the first event sighted for an object.
  fn seed(event: &ObjectEvent) -> Self {
    Self {
      object_id: event.object_id.clone(),
      digest:    event.digest.clone(),
      version:   event.version,
      created:   None,
      deleted:   None,
      mutated:   Vec::new(),
    }
  }

  /// Record the creation epoch. A second creation is a fatal integrity
  /// violation.
  fn with_created(self, epoch: Epoch) -> Result<Self> {
    if self.created.is_some() {
      return Err(Error::CreatedTwice(self.object_id));
    }
    Ok(Self { created: Some(epoch), ..self })
  }

  /// Record the deletion epoch. A second deletion is a fatal integrity
  /// violation.
  fn with_deleted(self, epoch: Epoch) -> Result<Self> {
    if self.deleted.is_some() {
      return Err(Error::DeletedTwice(self.object_id));
    }
    Ok(Self { deleted: Some(epoch), ..self })
  }

  /// Append a mutation point.
  fn with_mutation(self, epoch: Epoch, version: Version) -> Self {
    let mut mutated = self.mutated;
    mutated.push((epoch, version));
    Self { mutated, ..self }
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Derive the events of one transaction, enforcing the at-most-one-event-
/// per-object-id invariant. Deletion entries take priority: a transaction
/// that both deletes and changes the same object is reported as a duplicate.
fn derive_events(tx: &TxRecord) -> Result<Vec<ObjectEvent>> {
  let mut seen: HashSet<&ObjectId> = HashSet::new();
  let mut events = Vec::with_capacity(tx.deletions.len() + tx.changes.len());

  for deletion in &tx.deletions {
    if !seen.insert(&deletion.object_id) {
      return Err(Error::DuplicateObject {
        tx_digest: tx.digest.clone(),
        object_id: deletion.object_id.clone(),
      });
    }
    events.push(ObjectEvent {
      digest:    deletion.digest.clone(),
      object_id: deletion.object_id.clone(),
      version:   deletion.version,
      status:    EventStatus::Deleted,
      epoch:     tx.executed_epoch,
    });
  }

  for change in &tx.changes {
    if !seen.insert(&change.object_id) {
      return Err(Error::DuplicateObject {
        tx_digest: tx.digest.clone(),
        object_id: change.object_id.clone(),
      });
    }
    events.push(ObjectEvent {
      digest:    change.digest.clone(),
      object_id: change.object_id.clone(),
      version:   change.version,
      status:    EventStatus::parse(&change.kind)?,
      epoch:     tx.executed_epoch,
    });
  }

  Ok(events)
}

/// Build one timeline per object id from an already-filtered transaction
/// sequence, in the order supplied.
///
/// Deterministic given deterministic input order. No sorting or dedup of
/// mutation points is performed here; see
/// [`crate::resolve::objects_at_epoch`] for the order-independent read side.
pub fn build_timelines(
  txs: &[TxRecord],
) -> Result<HashMap<ObjectId, ObjectTimeline>> {
  let mut timelines: HashMap<ObjectId, ObjectTimeline> = HashMap::new();

  for tx in txs {
    for event in derive_events(tx)? {
      let timeline = timelines
        .remove(&event.object_id)
        .unwrap_or_else(|| ObjectTimeline::seed(&event));

      let timeline = match event.status {
        EventStatus::Created => timeline.with_created(event.epoch)?,
        EventStatus::Mutated => timeline.with_mutation(event.epoch, event.version),
        EventStatus::Deleted => timeline.with_deleted(event.epoch)?,
      };

      timelines.insert(event.object_id, timeline);
    }
  }

  Ok(timelines)
}
