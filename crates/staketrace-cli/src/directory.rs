//! Pool→validator resolution against the live chain.
//!
//! Active pools come straight off the latest system state summary. Pools
//! that have since been retired are only reachable through the system
//! state's inactive-pools table: one dynamic field per retired pool, each
//! wrapping the validator record another hop down. The whole traversal is
//! prefetched here so the core's reward calculator stays synchronous and
//! pure.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::Value;
use staketrace_core::{
  self as core,
  event::{PoolId, ValidatorId},
  reward::ValidatorDirectory,
};
use tracing::{debug, warn};

use crate::rpc::SuiClient;

/// A fully-prefetched two-stage resolver: active pools first, retired pools
/// as the fallback.
#[derive(Debug, Clone)]
pub struct ChainValidatorDirectory {
  active:   HashMap<PoolId, ValidatorId>,
  inactive: HashMap<PoolId, ValidatorId>,
}

impl ChainValidatorDirectory {
  /// Snapshot the current validator set, including the inactive-pools
  /// traversal.
  pub async fn load(client: &SuiClient) -> Result<Self> {
    let state = client
      .latest_system_state()
      .await
      .context("fetching system state")?;

    let active = state.active_pool_map();

    let inactive = match &state.inactive_pools_id {
      Some(table_id) => load_inactive_pools(client, table_id)
        .await
        .context("traversing inactive pools table")?,
      None => HashMap::new(),
    };

    debug!(
      active = active.len(),
      inactive = inactive.len(),
      "validator directory loaded"
    );

    Ok(Self { active, inactive })
  }

  #[cfg(test)]
  pub fn from_maps(
    active: HashMap<PoolId, ValidatorId>,
    inactive: HashMap<PoolId, ValidatorId>,
  ) -> Self {
    Self { active, inactive }
  }
}

impl ValidatorDirectory for ChainValidatorDirectory {
  fn active_validator(&self, pool_id: &PoolId) -> Option<ValidatorId> {
    self.active.get(pool_id).cloned()
  }

  fn resolve_inactive(&self, pool_id: &PoolId) -> core::Result<ValidatorId> {
    self
      .inactive
      .get(pool_id)
      .cloned()
      .ok_or_else(|| core::Error::PoolNotFound(pool_id.clone()))
  }
}

/// Walk the inactive-pools table: each dynamic field is keyed by a retired
/// pool id and wraps a validator record. Fields that do not look like a
/// pool entry are logged and skipped; a retired pool nobody references is
/// harmless, and a referenced one will still fail loudly at reward time.
async fn load_inactive_pools(
  client: &SuiClient,
  table_id: &str,
) -> Result<HashMap<PoolId, ValidatorId>> {
  let mut pools = HashMap::new();

  for field in client.dynamic_fields(table_id).await? {
    let entry = client.get_object(&field.object_id).await?;

    let Some(pool_id) = entry
      .pointer("/content/fields/name")
      .and_then(Value::as_str)
    else {
      warn!(object = %field.object_id, "inactive-pool entry without a pool id");
      continue;
    };

    match extract_validator_address(client, &entry).await? {
      Some(validator) => {
        pools.insert(PoolId(pool_id.to_owned()), ValidatorId(validator));
      }
      None => {
        warn!(pool = pool_id, "could not resolve validator for retired pool");
      }
    }
  }

  Ok(pools)
}

/// Pull the validator address out of one inactive-pool entry. Newer node
/// versions inline the record; older ones wrap it in a versioned object
/// whose single dynamic field holds the record — hence the extra hop.
async fn extract_validator_address(
  client: &SuiClient,
  entry: &Value,
) -> Result<Option<String>> {
  const INLINE: &str =
    "/content/fields/value/fields/metadata/fields/sui_address";
  if let Some(address) = entry.pointer(INLINE).and_then(Value::as_str) {
    return Ok(Some(address.to_owned()));
  }

  let Some(inner_id) = entry
    .pointer("/content/fields/value/fields/inner/fields/id/id")
    .and_then(Value::as_str)
  else {
    return Ok(None);
  };

  for inner_field in client.dynamic_fields(inner_id).await? {
    let inner = client.get_object(&inner_field.object_id).await?;
    if let Some(address) = inner
      .pointer("/content/fields/value/fields/validator/fields/metadata/fields/sui_address")
      .and_then(Value::as_str)
    {
      return Ok(Some(address.to_owned()));
    }
  }

  Ok(None)
}
