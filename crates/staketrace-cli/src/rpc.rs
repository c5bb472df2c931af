//! Async JSON-RPC client for a Sui fullnode — the concrete
//! [`EventSource`](staketrace_core::source::EventSource).
//!
//! Only the handful of methods the tracker needs are wrapped:
//! `suix_queryTransactionBlocks`, `suix_queryEvents`,
//! `suix_getLatestSuiSystemState`, `suix_getDynamicFields`, `sui_getObject`
//! and `sui_tryMultiGetPastObjects`. Wire shapes are parsed leniently — the
//! transaction stream carries entry kinds (package publishes, shared-object
//! owners) this tool has no use for, and those are skipped rather than
//! rejected.

use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use staketrace_core::{
  event::{
    Address, DeletedObjectRef, ObjectId, OwnershipChange, PoolId, TxRecord,
    ValidatorId,
  },
  resolve::ObjectRef,
  snapshot::{ExchangeRateSnapshot, RateTable},
  source::{EventSource, PastObject},
};
use std::time::Duration;
use thiserror::Error;

/// Resource type of a staked position object.
pub const STAKED_SUI_TYPE: &str = "0x3::staking_pool::StakedSui";

/// Resource type of a liquid SUI coin object.
pub const SUI_COIN_TYPE: &str = "0x2::coin::Coin<0x2::sui::SUI>";

/// Move event type of the per-epoch validator exchange-rate checkpoint.
const EPOCH_INFO_EVENT_TYPE: &str =
  "0x3::validator_set::ValidatorEpochInfoEventV2";

/// Page size for cursor-paged queries.
const PAGE_LIMIT: usize = 1000;

/// `sui_tryMultiGetPastObjects` caps the number of refs per call.
const PAST_OBJECT_CHUNK: usize = 50;

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RpcError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("rpc error {code}: {message}")]
  Rpc { code: i64, message: String },

  #[error("malformed response: {0}")]
  Wire(String),
}

pub type Result<T, E = RpcError> = std::result::Result<T, E>;

// ─── Envelope ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RpcRequest<'a> {
  jsonrpc: &'static str,
  id:      u64,
  method:  &'a str,
  params:  Value,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
  result: Option<R>,
  error:  Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
  code:    i64,
  message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
  data:          Vec<T>,
  next_cursor:   Option<Value>,
  has_next_page: bool,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async JSON-RPC client for a Sui fullnode.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SuiClient {
  client: Client,
  url:    String,
}

impl SuiClient {
  pub fn new(url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, url: url.into() })
  }

  async fn call<R: DeserializeOwned>(
    &self,
    method: &str,
    params: Value,
  ) -> Result<R> {
    let request = RpcRequest { jsonrpc: "2.0", id: 1, method, params };

    let response: RpcResponse<R> = self
      .client
      .post(&self.url)
      .json(&request)
      .send()
      .await?
      .json()
      .await?;

    if let Some(err) = response.error {
      return Err(RpcError::Rpc { code: err.code, message: err.message });
    }
    response
      .result
      .ok_or_else(|| RpcError::Wire(format!("{method}: no result")))
  }

  /// Drive a cursor-paged method to exhaustion. `params` receives the
  /// current cursor and must produce the full params array for one call.
  async fn paged<R: DeserializeOwned>(
    &self,
    method: &str,
    mut params: impl FnMut(Option<Value>) -> Value,
  ) -> Result<Vec<R>> {
    let mut all = Vec::new();
    let mut cursor: Option<Value> = None;

    loop {
      let page: Page<R> = self.call(method, params(cursor.take())).await?;
      all.extend(page.data);
      if !page.has_next_page {
        break;
      }
      cursor = page.next_cursor;
    }

    Ok(all)
  }

  // ── Transactions ──────────────────────────────────────────────────────────

  /// All transaction blocks sent to `address`, oldest first, converted to
  /// core transaction records.
  pub async fn query_transaction_blocks(
    &self,
    address: &Address,
  ) -> Result<Vec<TxRecord>> {
    let query = json!({
      "filter": { "ToAddress": address.as_str() },
      "options": {
        "showInput": true,
        "showEffects": true,
        "showEvents": true,
        "showObjectChanges": true,
        "showBalanceChanges": true,
      }
    });

    let blocks: Vec<WireTxBlock> = self
      .paged("suix_queryTransactionBlocks", |cursor| {
        json!([query, cursor, PAGE_LIMIT, false])
      })
      .await?;

    blocks.into_iter().map(WireTxBlock::into_record).collect()
  }

  // ── Exchange-rate events ──────────────────────────────────────────────────

  /// The full exchange-rate snapshot table, built from every
  /// `ValidatorEpochInfoEventV2` the node has.
  pub async fn query_epoch_info_events(&self) -> Result<RateTable> {
    let query = json!({ "MoveEventType": EPOCH_INFO_EVENT_TYPE });

    let events: Vec<WireEvent> = self
      .paged("suix_queryEvents", |cursor| {
        json!([query, cursor, PAGE_LIMIT, false])
      })
      .await?;

    events
      .into_iter()
      .map(|event| event.into_snapshot())
      .collect::<Result<_>>()
  }

  // ── System state ──────────────────────────────────────────────────────────

  /// The latest system state summary: active validators and the id of the
  /// inactive-pools table.
  pub async fn latest_system_state(&self) -> Result<SystemState> {
    self.call("suix_getLatestSuiSystemState", json!([])).await
  }

  /// All dynamic fields of `parent`, paged.
  pub async fn dynamic_fields(
    &self,
    parent: &str,
  ) -> Result<Vec<DynamicFieldInfo>> {
    let parent = parent.to_owned();
    self
      .paged("suix_getDynamicFields", move |cursor| {
        json!([parent, cursor, PAGE_LIMIT])
      })
      .await
  }

  /// Fetch one object with content shown; returns the raw `data` JSON.
  pub async fn get_object(&self, object_id: &str) -> Result<Value> {
    let wrapper: Value = self
      .call("sui_getObject", json!([object_id, show_content_options()]))
      .await?;
    wrapper
      .get("data")
      .cloned()
      .ok_or_else(|| RpcError::Wire("sui_getObject: no data".into()))
  }

  // ── Past objects ──────────────────────────────────────────────────────────

  /// Hydrate historical object versions, chunked to the node's limit.
  /// Output order matches input order.
  pub async fn try_multi_get_past_objects(
    &self,
    refs: &[ObjectRef],
  ) -> Result<Vec<PastObject>> {
    let mut hydrated = Vec::with_capacity(refs.len());

    for chunk in refs.chunks(PAST_OBJECT_CHUNK) {
      let request: Vec<Value> = chunk
        .iter()
        .map(|r| {
          json!({
            "objectId": r.object_id.as_str(),
            "version": r.version.to_string(),
          })
        })
        .collect();

      let results: Vec<WirePastObject> = self
        .call(
          "sui_tryMultiGetPastObjects",
          json!([request, show_content_options()]),
        )
        .await?;

      if results.len() != chunk.len() {
        return Err(RpcError::Wire(format!(
          "past-objects chunk: asked {} got {}",
          chunk.len(),
          results.len()
        )));
      }

      for (reference, wire) in chunk.iter().zip(results) {
        hydrated.push(wire.into_past_object(reference));
      }
    }

    Ok(hydrated)
  }
}

fn show_content_options() -> Value {
  json!({
    "showType": true,
    "showOwner": true,
    "showPreviousTransaction": true,
    "showDisplay": false,
    "showContent": true,
    "showBcs": false,
    "showStorageRebate": true,
  })
}

// ─── EventSource impl ────────────────────────────────────────────────────────

impl EventSource for SuiClient {
  type Error = RpcError;

  async fn transactions_for(&self, owner: &Address) -> Result<Vec<TxRecord>> {
    self.query_transaction_blocks(owner).await
  }

  async fn rate_table(&self) -> Result<RateTable> {
    self.query_epoch_info_events().await
  }

  async fn active_pools(&self) -> Result<HashMap<PoolId, ValidatorId>> {
    Ok(self.latest_system_state().await?.active_pool_map())
  }

  async fn past_objects(&self, refs: &[ObjectRef]) -> Result<Vec<PastObject>> {
    self.try_multi_get_past_objects(refs).await
  }
}

// ─── Wire types: transactions ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTxBlock {
  digest:  String,
  effects: WireEffects,
  #[serde(default)]
  object_changes: Vec<WireObjectChange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEffects {
  executed_epoch: String,
  #[serde(default)]
  deleted: Option<Vec<WireDeleted>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDeleted {
  digest:    String,
  object_id: String,
  version:   u64,
}

/// One `objectChanges` entry. Fields are optional because entry kinds vary:
/// a `published` entry has no object owner, a shared object has a non-address
/// owner, and so on. Entries missing anything we need are skipped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireObjectChange {
  #[serde(rename = "type")]
  kind:        String,
  digest:      Option<String>,
  object_id:   Option<String>,
  object_type: Option<String>,
  version:     Option<String>,
  owner:       Option<Value>,
}

impl WireObjectChange {
  fn into_change(self) -> Option<OwnershipChange> {
    let address_owner = self
      .owner
      .as_ref()?
      .get("AddressOwner")?
      .as_str()?
      .to_owned();

    Some(OwnershipChange {
      digest:      self.digest?,
      object_id:   ObjectId(self.object_id?),
      object_type: self.object_type?,
      owner:       Address(address_owner),
      version:     self.version?.parse().ok()?,
      kind:        self.kind,
    })
  }
}

impl WireTxBlock {
  fn into_record(self) -> Result<TxRecord> {
    let executed_epoch = self
      .effects
      .executed_epoch
      .parse()
      .map_err(|_| {
        RpcError::Wire(format!(
          "transaction {}: bad executedEpoch {:?}",
          self.digest, self.effects.executed_epoch
        ))
      })?;

    let changes = self
      .object_changes
      .into_iter()
      .filter_map(WireObjectChange::into_change)
      .collect();

    let deletions = self
      .effects
      .deleted
      .unwrap_or_default()
      .into_iter()
      .map(|d| DeletedObjectRef {
        digest:    d.digest,
        object_id: ObjectId(d.object_id),
        version:   d.version,
      })
      .collect();

    Ok(TxRecord {
      digest: self.digest,
      executed_epoch,
      changes,
      deletions,
    })
  }
}

// ─── Wire types: events ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
  parsed_json: WireEpochInfo,
}

#[derive(Debug, Deserialize)]
struct WireEpochInfo {
  /// Epoch arrives as a JSON string on mainnet but has been observed as a
  /// bare number on some nodes; accept both.
  epoch:                    Value,
  validator_address:        String,
  pool_token_exchange_rate: WireExchangeRate,
}

#[derive(Debug, Deserialize)]
struct WireExchangeRate {
  pool_token_amount: String,
  sui_amount:        String,
}

fn value_as_u64(v: &Value, what: &str) -> Result<u64> {
  match v {
    Value::Number(n) => n.as_u64(),
    Value::String(s) => s.parse().ok(),
    _ => None,
  }
  .ok_or_else(|| RpcError::Wire(format!("{what}: not a u64: {v}")))
}

impl WireEvent {
  fn into_snapshot(self) -> Result<ExchangeRateSnapshot> {
    let info = self.parsed_json;
    Ok(ExchangeRateSnapshot {
      epoch:             value_as_u64(&info.epoch, "epoch")?,
      validator_id:      ValidatorId(info.validator_address),
      pool_token_amount: info
        .pool_token_exchange_rate
        .pool_token_amount
        .parse()
        .map_err(|_| RpcError::Wire("bad pool_token_amount".into()))?,
      principal_amount:  info
        .pool_token_exchange_rate
        .sui_amount
        .parse()
        .map_err(|_| RpcError::Wire("bad sui_amount".into()))?,
    })
  }
}

// ─── Wire types: system state ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
  pub active_validators: Vec<ActiveValidator>,
  /// Parent object of the inactive staking pools table; the starting point
  /// for the inactive-pool fallback traversal.
  pub inactive_pools_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveValidator {
  pub sui_address:     String,
  pub staking_pool_id: String,
}

impl SystemState {
  pub fn active_pool_map(&self) -> HashMap<PoolId, ValidatorId> {
    self
      .active_validators
      .iter()
      .map(|v| {
        (
          PoolId(v.staking_pool_id.clone()),
          ValidatorId(v.sui_address.clone()),
        )
      })
      .collect()
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFieldInfo {
  pub object_id: String,
}

// ─── Wire types: past objects ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePastObject {
  status:  String,
  details: Option<Value>,
}

impl WirePastObject {
  /// Lower a past-object response into the core enum. Anything that is not
  /// a found staked or coin object becomes `Missing` — a fetch-side
  /// resolution gap, not an error.
  fn into_past_object(self, reference: &ObjectRef) -> PastObject {
    let missing = || PastObject::Missing {
      object_id: reference.object_id.clone(),
      version:   reference.version,
    };

    if self.status != "VersionFound" {
      return missing();
    }
    let Some(details) = self.details else {
      return missing();
    };

    let object_type = details.get("type").and_then(Value::as_str);
    let owner = details
      .pointer("/owner/AddressOwner")
      .and_then(Value::as_str);
    let fields = details.pointer("/content/fields");

    let (Some(object_type), Some(owner), Some(fields)) =
      (object_type, owner, fields)
    else {
      return missing();
    };

    let field_u64 = |name: &str| -> Option<u64> {
      match fields.get(name)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
      }
    };

    if object_type == STAKED_SUI_TYPE {
      let (Some(pool_id), Some(principal), Some(activation)) = (
        fields.get("pool_id").and_then(Value::as_str),
        field_u64("principal"),
        field_u64("stake_activation_epoch"),
      ) else {
        return missing();
      };
      PastObject::Staked {
        object_id:              reference.object_id.clone(),
        version:                reference.version,
        owner:                  Address(owner.to_owned()),
        pool_id:                PoolId(pool_id.to_owned()),
        principal,
        stake_activation_epoch: activation,
      }
    } else if object_type == SUI_COIN_TYPE {
      let Some(balance) = field_u64("balance") else {
        return missing();
      };
      PastObject::Coin {
        object_id: reference.object_id.clone(),
        version:   reference.version,
        owner:     Address(owner.to_owned()),
        balance,
      }
    } else {
      missing()
    }
  }
}
