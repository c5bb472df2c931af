//! Error types for `staketrace-core`.
//!
//! Only integrity violations and unresolvable identities are errors.
//! Resolution gaps (an object with no eligible version at a query epoch) and
//! numeric degeneracies (missing snapshot, negative computed reward) are
//! handled locally by the components and never surface here.

use thiserror::Error;

use crate::event::ObjectId;

#[derive(Debug, Error)]
pub enum Error {
  /// An object id appeared in more than one derived event within a single
  /// transaction. The whole batch is suspect.
  #[error("duplicate object {object_id} in transaction {tx_digest}")]
  DuplicateObject {
    tx_digest: String,
    object_id: ObjectId,
  },

  /// A `created` event was observed twice for the same object.
  #[error("object {0} created twice")]
  CreatedTwice(ObjectId),

  /// A `deleted` event was observed twice for the same object.
  #[error("object {0} deleted twice")]
  DeletedTwice(ObjectId),

  #[error("unknown event status {0:?}")]
  UnknownStatus(String),

  /// A staking pool could not be resolved to a validator, even through the
  /// inactive-pool fallback.
  #[error("no validator found for pool {0}")]
  PoolNotFound(crate::event::PoolId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
