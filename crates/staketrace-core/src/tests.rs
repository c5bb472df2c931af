//! Unit tests for the filter → timeline → resolve → reward pipeline.

use std::collections::HashMap;

use crate::{
  Error,
  aggregate::{EpochTotals, cumulative, totals_at_epoch},
  event::{
    Address, DeletedObjectRef, Epoch, ObjectId, OwnershipChange, PoolId,
    TxRecord, ValidatorId, Version,
  },
  filter::filter_transactions,
  position::{CoinBalance, StakedPosition},
  resolve::{objects_at_epoch, resolve_at_epoch},
  reward::{RewardResult, ValidatorDirectory, calculate_reward},
  snapshot::{ExchangeRateSnapshot, RateTable},
  timeline::{ObjectTimeline, build_timelines},
};

const STAKED_TYPE: &str = "0x3::staking_pool::StakedSui";

fn owner() -> Address { Address::from("0xaaa") }

fn change(
  object_id: &str,
  version: Version,
  kind: &str,
) -> OwnershipChange {
  OwnershipChange {
    digest:      format!("obj-digest-{object_id}-{version}"),
    object_id:   ObjectId::from(object_id),
    object_type: STAKED_TYPE.to_owned(),
    owner:       owner(),
    version,
    kind:        kind.to_owned(),
  }
}

fn deletion(object_id: &str, version: Version) -> DeletedObjectRef {
  DeletedObjectRef {
    digest:    format!("del-digest-{object_id}"),
    object_id: ObjectId::from(object_id),
    version,
  }
}

fn tx(
  digest: &str,
  epoch: Epoch,
  changes: Vec<OwnershipChange>,
  deletions: Vec<DeletedObjectRef>,
) -> TxRecord {
  TxRecord {
    digest: digest.to_owned(),
    executed_epoch: epoch,
    changes,
    deletions,
  }
}

// ─── Event filter ────────────────────────────────────────────────────────────

#[test]
fn filter_keeps_matching_owner_and_type() {
  let mut foreign = change("0x2", 1, "created");
  foreign.owner = Address::from("0xbbb");
  let mut wrong_type = change("0x3", 1, "created");
  wrong_type.object_type = "0x2::coin::Coin<0x2::sui::SUI>".to_owned();

  let txs = vec![tx(
    "t1",
    1,
    vec![change("0x1", 1, "created"), foreign, wrong_type],
    vec![],
  )];

  let filtered = filter_transactions(&owner(), STAKED_TYPE, &txs);
  assert_eq!(filtered.len(), 1);
  assert_eq!(filtered[0].changes.len(), 1);
  assert_eq!(filtered[0].changes[0].object_id, ObjectId::from("0x1"));
}

#[test]
fn filter_drops_transactions_with_no_relevant_entries() {
  let mut foreign = change("0x2", 1, "created");
  foreign.owner = Address::from("0xbbb");

  let txs = vec![tx("t1", 1, vec![foreign], vec![])];
  assert!(filter_transactions(&owner(), STAKED_TYPE, &txs).is_empty());
}

#[test]
fn filter_keeps_deletion_of_previously_relevant_object() {
  let txs = vec![
    tx("t1", 1, vec![change("0x1", 1, "created")], vec![]),
    tx("t2", 3, vec![], vec![deletion("0x1", 2)]),
  ];

  let filtered = filter_transactions(&owner(), STAKED_TYPE, &txs);
  assert_eq!(filtered.len(), 2);
  assert_eq!(filtered[1].deletions.len(), 1);
}

#[test]
fn filter_drops_deletion_of_never_relevant_object() {
  // Deletion records carry no ownership information; without a prior
  // relevant sighting the id cannot be attributed to this owner.
  let txs = vec![
    tx("t1", 1, vec![change("0x1", 1, "created")], vec![]),
    tx("t2", 3, vec![], vec![deletion("0x9", 2)]),
  ];

  let filtered = filter_transactions(&owner(), STAKED_TYPE, &txs);
  assert_eq!(filtered.len(), 1);
  assert!(filtered[0].deletions.is_empty());
}

#[test]
fn filter_is_referentially_transparent() {
  let txs = vec![
    tx("t1", 1, vec![change("0x1", 1, "created")], vec![]),
    tx("t2", 2, vec![change("0x1", 4, "mutated")], vec![]),
  ];

  let a = filter_transactions(&owner(), STAKED_TYPE, &txs);
  let b = filter_transactions(&owner(), STAKED_TYPE, &txs);
  assert_eq!(a.len(), b.len());
  assert_eq!(a[0].changes[0].object_id, b[0].changes[0].object_id);
}

// ─── Timeline builder ────────────────────────────────────────────────────────

#[test]
fn build_timeline_full_lifecycle() {
  let txs = vec![
    tx("t1", 2, vec![change("0x1", 5, "created")], vec![]),
    tx("t2", 4, vec![change("0x1", 10, "mutated")], vec![]),
    tx("t3", 6, vec![change("0x1", 12, "mutated")], vec![]),
    tx("t4", 8, vec![], vec![deletion("0x1", 13)]),
  ];

  let timelines = build_timelines(&txs).unwrap();
  let timeline = &timelines[&ObjectId::from("0x1")];

  assert_eq!(timeline.version, 5);
  assert_eq!(timeline.created, Some(2));
  assert_eq!(timeline.deleted, Some(8));
  assert_eq!(timeline.mutated, vec![(4, 10), (6, 12)]);
}

#[test]
fn duplicate_object_within_one_transaction_is_fatal() {
  let txs = vec![tx(
    "t1",
    1,
    vec![change("0x1", 1, "mutated"), change("0x1", 2, "mutated")],
    vec![],
  )];

  let err = build_timelines(&txs).unwrap_err();
  assert!(matches!(
    err,
    Error::DuplicateObject { ref tx_digest, ref object_id }
      if tx_digest == "t1" && object_id.as_str() == "0x1"
  ));
}

#[test]
fn deletion_and_change_for_same_object_is_fatal() {
  let txs = vec![tx(
    "t1",
    1,
    vec![change("0x1", 2, "mutated")],
    vec![deletion("0x1", 2)],
  )];

  assert!(matches!(
    build_timelines(&txs).unwrap_err(),
    Error::DuplicateObject { .. }
  ));
}

#[test]
fn second_creation_is_fatal() {
  let txs = vec![
    tx("t1", 1, vec![change("0x1", 1, "created")], vec![]),
    tx("t2", 2, vec![change("0x1", 2, "created")], vec![]),
  ];

  assert!(matches!(
    build_timelines(&txs).unwrap_err(),
    Error::CreatedTwice(ref id) if id.as_str() == "0x1"
  ));
}

#[test]
fn second_deletion_is_fatal() {
  let txs = vec![
    tx("t1", 1, vec![change("0x1", 1, "created")], vec![]),
    tx("t2", 2, vec![], vec![deletion("0x1", 2)]),
    tx("t3", 3, vec![], vec![deletion("0x1", 3)]),
  ];

  assert!(matches!(
    build_timelines(&txs).unwrap_err(),
    Error::DeletedTwice(_)
  ));
}

#[test]
fn unknown_status_is_fatal() {
  let txs = vec![tx("t1", 1, vec![change("0x1", 1, "wrapped")], vec![])];

  assert!(matches!(
    build_timelines(&txs).unwrap_err(),
    Error::UnknownStatus(ref s) if s == "wrapped"
  ));
}

// ─── Existence resolver ──────────────────────────────────────────────────────

fn timeline(
  seed: Version,
  created: Option<Epoch>,
  deleted: Option<Epoch>,
  mutated: Vec<(Epoch, Version)>,
) -> ObjectTimeline {
  ObjectTimeline {
    object_id: ObjectId::from("0x1"),
    digest: "d".to_owned(),
    version: seed,
    created,
    deleted,
    mutated,
  }
}

#[test]
fn resolve_scenario_from_mixed_mutation_versions() {
  // created: 2, seed 5, mutations (4, 10) then (6, 7).
  let t = timeline(5, Some(2), None, vec![(4, 10), (6, 7)]);

  assert_eq!(resolve_at_epoch(&t, 1), None); // not yet created
  assert_eq!(resolve_at_epoch(&t, 3), Some(5)); // seed version
  assert_eq!(resolve_at_epoch(&t, 5), Some(10)); // epoch-4 mutation wins
  // The epoch-6 mutation's version 7 does not exceed the running max 10.
  assert_eq!(resolve_at_epoch(&t, 7), Some(10));
}

#[test]
fn resolve_is_independent_of_mutation_order() {
  let orders = [
    vec![(4, 10), (6, 7), (5, 9)],
    vec![(6, 7), (5, 9), (4, 10)],
    vec![(5, 9), (4, 10), (6, 7)],
  ];

  for mutated in orders {
    let t = timeline(5, Some(2), None, mutated);
    assert_eq!(resolve_at_epoch(&t, 7), Some(10));
  }
}

#[test]
fn later_epoch_smaller_version_keeps_max() {
  // The max-version rule is an explicit invariant: under a non-monotonic
  // version stream the chronologically-latest mutation does not win.
  let t = timeline(1, Some(0), None, vec![(2, 50), (3, 40)]);
  assert_eq!(resolve_at_epoch(&t, 3), Some(50));
}

#[test]
fn tombstone_excludes_at_and_after_deletion_epoch() {
  let t = timeline(3, Some(1), Some(5), vec![]);

  assert_eq!(resolve_at_epoch(&t, 4), Some(3));
  assert_eq!(resolve_at_epoch(&t, 5), None);
  assert_eq!(resolve_at_epoch(&t, 6), None);
}

#[test]
fn no_evidence_timeline_is_skipped() {
  let t = timeline(3, None, None, vec![]);
  assert_eq!(resolve_at_epoch(&t, 10), None);
}

#[test]
fn only_future_mutations_yield_no_candidate() {
  // The object existed logically, but no eligible version is known as of
  // the query epoch.
  let t = timeline(3, None, None, vec![(10, 4)]);
  assert_eq!(resolve_at_epoch(&t, 5), None);
}

#[test]
fn eligible_mutation_without_creation_resolves() {
  let t = timeline(3, None, None, vec![(2, 7)]);
  assert_eq!(resolve_at_epoch(&t, 5), Some(7));
}

#[test]
fn monotonic_versions_never_regress_as_epoch_advances() {
  let t = timeline(1, Some(0), None, vec![(2, 4), (4, 6), (6, 9)]);

  let mut previous = 0;
  for epoch in 0..8 {
    let version = resolve_at_epoch(&t, epoch).unwrap();
    assert!(version >= previous, "regressed at epoch {epoch}");
    previous = version;
  }
}

#[test]
fn objects_at_epoch_is_sorted_and_deterministic() {
  let mut timelines = HashMap::new();
  for id in ["0xc", "0xa", "0xb"] {
    let mut t = timeline(1, Some(0), None, vec![]);
    t.object_id = ObjectId::from(id);
    timelines.insert(ObjectId::from(id), t);
  }

  let refs = objects_at_epoch(&timelines, 3);
  let ids: Vec<_> = refs.iter().map(|r| r.object_id.as_str()).collect();
  assert_eq!(ids, ["0xa", "0xb", "0xc"]);
}

// ─── Reward calculator ───────────────────────────────────────────────────────

struct MapDirectory {
  active:   HashMap<PoolId, ValidatorId>,
  inactive: HashMap<PoolId, ValidatorId>,
}

impl MapDirectory {
  fn with_active(pool: &str, validator: &str) -> Self {
    Self {
      active:   HashMap::from([(
        PoolId::from(pool),
        ValidatorId::from(validator),
      )]),
      inactive: HashMap::new(),
    }
  }

  fn empty() -> Self {
    Self { active: HashMap::new(), inactive: HashMap::new() }
  }
}

impl ValidatorDirectory for MapDirectory {
  fn active_validator(&self, pool_id: &PoolId) -> Option<ValidatorId> {
    self.active.get(pool_id).cloned()
  }

  fn resolve_inactive(&self, pool_id: &PoolId) -> crate::Result<ValidatorId> {
    self
      .inactive
      .get(pool_id)
      .cloned()
      .ok_or_else(|| Error::PoolNotFound(pool_id.clone()))
  }
}

fn snapshot(
  epoch: Epoch,
  validator: &str,
  pool_tokens: u64,
  principal: u64,
) -> ExchangeRateSnapshot {
  ExchangeRateSnapshot {
    epoch,
    validator_id: ValidatorId::from(validator),
    pool_token_amount: pool_tokens,
    principal_amount: principal,
  }
}

#[test]
fn reward_from_rate_decline() {
  // rate 1.2 at activation, 1.0 at target, principal 1000 → 200.
  let directory = MapDirectory::with_active("pool", "val");
  let rates: RateTable = [
    snapshot(0, "val", 12, 10),
    snapshot(10, "val", 10, 10),
  ]
  .into_iter()
  .collect();

  let result =
    calculate_reward(1000, &PoolId::from("pool"), 0, 10, &directory, &rates)
      .unwrap();

  assert_eq!(result.rate_at_activation, 1.2);
  assert_eq!(result.rate_at_target, 1.0);
  assert!((result.estimated_reward - 200.0).abs() < 1e-9);
  assert_eq!(result.validator_id, ValidatorId::from("val"));
}

#[test]
fn negative_reward_clamps_to_zero() {
  // rate 0.9 at activation, 1.0 at target → computed -100, clamped.
  let directory = MapDirectory::with_active("pool", "val");
  let rates: RateTable = [
    snapshot(0, "val", 9, 10),
    snapshot(10, "val", 10, 10),
  ]
  .into_iter()
  .collect();

  let result =
    calculate_reward(1000, &PoolId::from("pool"), 0, 10, &directory, &rates)
      .unwrap();
  assert_eq!(result.estimated_reward, 0.0);
}

#[test]
fn missing_snapshots_default_rates_to_one() {
  let directory = MapDirectory::with_active("pool", "val");
  let rates = RateTable::new();

  let result =
    calculate_reward(1000, &PoolId::from("pool"), 3, 9, &directory, &rates)
      .unwrap();

  assert_eq!(result.rate_at_activation, 1.0);
  assert_eq!(result.rate_at_target, 1.0);
  assert_eq!(result.estimated_reward, 0.0);
}

#[test]
fn equal_activation_and_target_epochs_yield_zero() {
  let directory = MapDirectory::with_active("pool", "val");
  let rates: RateTable = [snapshot(7, "val", 11, 10)].into_iter().collect();

  let result =
    calculate_reward(500, &PoolId::from("pool"), 7, 7, &directory, &rates)
      .unwrap();

  assert_eq!(result.rate_at_activation, result.rate_at_target);
  assert_eq!(result.estimated_reward, 0.0);
}

#[test]
fn degenerate_snapshot_counts_as_missing() {
  // Zero principal backing would divide by zero; treated like no snapshot.
  let directory = MapDirectory::with_active("pool", "val");
  let rates: RateTable = [snapshot(0, "val", 12, 0)].into_iter().collect();

  let result =
    calculate_reward(1000, &PoolId::from("pool"), 0, 5, &directory, &rates)
      .unwrap();
  assert_eq!(result.rate_at_activation, 1.0);
}

#[test]
fn inactive_pool_resolves_through_fallback() {
  let mut directory = MapDirectory::empty();
  directory
    .inactive
    .insert(PoolId::from("retired"), ValidatorId::from("old-val"));
  let rates: RateTable = [
    snapshot(0, "old-val", 12, 10),
    snapshot(5, "old-val", 10, 10),
  ]
  .into_iter()
  .collect();

  let result =
    calculate_reward(100, &PoolId::from("retired"), 0, 5, &directory, &rates)
      .unwrap();
  assert_eq!(result.validator_id, ValidatorId::from("old-val"));
  assert!((result.estimated_reward - 20.0).abs() < 1e-9);
}

#[test]
fn unresolvable_pool_is_fatal() {
  let directory = MapDirectory::empty();
  let rates = RateTable::new();

  let err =
    calculate_reward(100, &PoolId::from("ghost"), 0, 5, &directory, &rates)
      .unwrap_err();
  assert!(matches!(err, Error::PoolNotFound(ref p) if p.as_str() == "ghost"));
}

#[test]
fn reward_is_never_negative() {
  let directory = MapDirectory::with_active("pool", "val");
  let cases = [(12u64, 10u64, 10u64, 10u64), (9, 10, 10, 10), (10, 10, 12, 10)];

  for (at0, ap0, at1, ap1) in cases {
    let rates: RateTable =
      [snapshot(0, "val", at0, ap0), snapshot(5, "val", at1, ap1)]
        .into_iter()
        .collect();
    let result =
      calculate_reward(1000, &PoolId::from("pool"), 0, 5, &directory, &rates)
        .unwrap();
    assert!(result.estimated_reward >= 0.0);
  }
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

#[test]
fn totals_skip_tombstones() {
  let coins = vec![
    CoinBalance {
      object_id: ObjectId::from("0xc1"),
      version:   1,
      owner:     owner(),
      balance:   300,
      at_epoch:  4,
      deleted:   false,
    },
    CoinBalance::tombstone(ObjectId::from("0xc2"), 2, owner(), 4),
  ];
  let positions = vec![
    StakedPosition {
      object_id:              ObjectId::from("0xs1"),
      version:                1,
      owner:                  owner(),
      pool_id:                PoolId::from("pool"),
      principal:              1000,
      stake_activation_epoch: 1,
      at_epoch:               4,
      deleted:                false,
    },
    StakedPosition::tombstone(ObjectId::from("0xs2"), 2, owner(), 4),
  ];
  let rewards = vec![RewardResult {
    rate_at_activation: 1.1,
    rate_at_target:     1.0,
    estimated_reward:   100.0,
    validator_id:       ValidatorId::from("val"),
  }];

  let totals = totals_at_epoch(&coins, &positions, &rewards);
  assert_eq!(
    totals,
    EpochTotals { liquid: 300, staked: 1000, rewards: 100.0 }
  );
}

#[test]
fn cumulative_is_a_running_sum() {
  assert_eq!(
    cumulative(&[1.0, 2.5, 0.0, 4.0]),
    vec![1.0, 3.5, 3.5, 7.5]
  );
  assert!(cumulative(&[]).is_empty());
}
