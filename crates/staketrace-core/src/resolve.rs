//! Existence resolver — which version of each object, if any, existed at a
//! given query epoch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  event::{Epoch, ObjectId, Version},
  timeline::ObjectTimeline,
};

/// A resolved `(object id, version)` pair: the version of an object that
/// existed at the query epoch.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ObjectRef {
  pub object_id: ObjectId,
  pub version:   Version,
}

/// Resolve one timeline at `epoch`. `None` means the object did not exist at
/// that epoch, or its history is insufficient to say which version did — a
/// resolution gap, never an error.
pub fn resolve_at_epoch(
  timeline: &ObjectTimeline,
  epoch: Epoch,
) -> Option<Version> {
  // No creation and no mutations: the timeline cannot represent real
  // historical existence.
  if timeline.created.is_none() && timeline.mutated.is_empty() {
    return None;
  }

  // Tombstone exclusion: gone by or at the query epoch.
  if matches!(timeline.deleted, Some(deleted) if deleted <= epoch) {
    return None;
  }

  let mut candidate: Option<Version> = None;

  if matches!(timeline.created, Some(created) if created <= epoch) {
    candidate = Some(timeline.version);
  }

  // Mutation points are unsorted; keep the max version among eligible
  // points, not the chronologically last one. When the upstream log stamps
  // versions monotonically this is "last eligible mutation wins".
  for &(mutation_epoch, mutation_version) in &timeline.mutated {
    if mutation_epoch <= epoch
      && candidate.is_none_or(|current| mutation_version > current)
    {
      candidate = Some(mutation_version);
    }
  }

  candidate
}

/// Resolve every timeline at `epoch`, returning the refs of all objects that
/// existed then.
///
/// Pure and idempotent: the same timelines and epoch always yield the same
/// result, independent of map iteration order. The output is sorted by
/// object id so the order-independence holds observably, not just as a set.
pub fn objects_at_epoch(
  timelines: &HashMap<ObjectId, ObjectTimeline>,
  epoch: Epoch,
) -> Vec<ObjectRef> {
  let mut refs: Vec<ObjectRef> = timelines
    .values()
    .filter_map(|timeline| {
      resolve_at_epoch(timeline, epoch).map(|version| ObjectRef {
        object_id: timeline.object_id.clone(),
        version,
      })
    })
    .collect();

  refs.sort_by(|a, b| a.object_id.cmp(&b.object_id));
  refs
}
