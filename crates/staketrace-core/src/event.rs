//! Raw event and transaction types — the input side of the pipeline.
//!
//! A [`TxRecord`] is one transaction as delivered by the paged event source:
//! zero or more ownership-change entries plus zero or more deletion entries,
//! all stamped with the epoch the transaction executed in. The timeline
//! builder derives one [`ObjectEvent`] per retained entry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Discrete unit of protocol time; the granularity at which state is
/// checkpointed and queried.
pub type Epoch = u64;

/// Monotonically increasing per-object version stamped at each event.
pub type Version = u64;

// ─── Identifier newtypes ─────────────────────────────────────────────────────

macro_rules! id_newtype {
  ($(#[$doc:meta])* $name:ident) => {
    $(#[$doc])*
    #[derive(
      Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
      Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub String);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $name {
      fn from(s: &str) -> Self { Self(s.to_owned()) }
    }

    impl $name {
      pub fn as_str(&self) -> &str { &self.0 }
    }
  };
}

id_newtype! {
  /// Identifier of a tracked on-chain object; stable across its lifetime.
  ObjectId
}
id_newtype! {
  /// A wallet address (object owner).
  Address
}
id_newtype! {
  /// Identifier of a staking pool.
  PoolId
}
id_newtype! {
  /// Identity of a validator operating a staking pool.
  ValidatorId
}

// ─── Event status ────────────────────────────────────────────────────────────

/// What an [`ObjectEvent`] did to its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
  Created,
  Mutated,
  Deleted,
}

impl EventStatus {
  /// Parse the free-form status tag carried on the wire. Anything outside
  /// the three known statuses is a fatal malformed-input error.
  pub fn parse(raw: &str) -> Result<Self> {
    match raw {
      "created" => Ok(Self::Created),
      "mutated" => Ok(Self::Mutated),
      "deleted" => Ok(Self::Deleted),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Created => "created",
      Self::Mutated => "mutated",
      Self::Deleted => "deleted",
    }
  }
}

// ─── Derived event ───────────────────────────────────────────────────────────

/// One ownership-change or deletion record, derived from a transaction entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEvent {
  /// Opaque content identifier of the event.
  pub digest:    String,
  pub object_id: ObjectId,
  pub version:   Version,
  pub status:    EventStatus,
  /// Epoch at which the event was recorded.
  pub epoch:     Epoch,
}

// ─── Raw transaction records ─────────────────────────────────────────────────

/// An ownership-change entry within a transaction. Carries full owner and
/// type information, unlike deletion entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipChange {
  /// Object digest after the change.
  pub digest:      String,
  pub object_id:   ObjectId,
  /// Fully-qualified resource type, e.g. `0x3::staking_pool::StakedSui`.
  pub object_type: String,
  pub owner:       Address,
  pub version:     Version,
  /// Raw change tag from the wire (`created`, `mutated`, ...). Parsed into
  /// an [`EventStatus`] by the timeline builder; unknown tags are fatal
  /// there, not here.
  pub kind:        String,
}

/// A deletion entry within a transaction. Deletion records carry no owner or
/// type information; relevance is decided by the event filter's working set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedObjectRef {
  pub digest:    String,
  pub object_id: ObjectId,
  pub version:   Version,
}

/// One transaction from the event source, already narrowed by the filter (or
/// raw, before filtering).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
  /// Transaction digest; names the transaction in duplicate-object errors.
  pub digest:         String,
  /// Epoch the transaction executed in; stamped onto every derived event.
  pub executed_epoch: Epoch,
  pub changes:        Vec<OwnershipChange>,
  pub deletions:      Vec<DeletedObjectRef>,
}
