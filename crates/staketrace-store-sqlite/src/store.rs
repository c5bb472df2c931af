//! [`SqliteSink`] — the SQLite implementation of
//! [`staketrace_core::source::PositionSink`].

use std::path::Path;

use chrono::Utc;
use staketrace_core::{
  event::{Address, Epoch},
  position::{CoinBalance, StakedPosition},
  source::PositionSink,
};

use crate::{
  Error, Result,
  encode::{RawCoinRow, RawStakedRow, encode_dt},
  schema::SCHEMA,
};

// ─── Sink ────────────────────────────────────────────────────────────────────

/// A position sink backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteSink {
  conn: tokio_rusqlite::Connection,
}

impl SqliteSink {
  /// Open (or create) a sink at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let sink = Self { conn };
    sink.init_schema().await?;
    Ok(sink)
  }

  /// Open an in-memory sink — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let sink = Self { conn };
    sink.init_schema().await?;
    Ok(sink)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PositionSink impl ───────────────────────────────────────────────────────

impl PositionSink for SqliteSink {
  type Error = Error;

  async fn record_staked(&self, rows: Vec<StakedPosition>) -> Result<()> {
    if rows.is_empty() {
      return Ok(());
    }
    let recorded_at = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO staked_positions (
               object_id, version, at_epoch, owner,
               pool_id, principal, stake_activation_epoch,
               deleted, recorded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          )?;

          for row in &rows {
            // Tombstones persist NULL staking fields; the live values are
            // not recoverable from a deletion record.
            let (pool_id, principal, activation) = if row.deleted {
              (None, None, None)
            } else {
              (
                Some(row.pool_id.as_str()),
                Some(row.principal),
                Some(row.stake_activation_epoch),
              )
            };

            stmt.execute(rusqlite::params![
              row.object_id.as_str(),
              row.version,
              row.at_epoch,
              row.owner.as_str(),
              pool_id,
              principal,
              activation,
              row.deleted,
              recorded_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn record_coins(&self, rows: Vec<CoinBalance>) -> Result<()> {
    if rows.is_empty() {
      return Ok(());
    }
    let recorded_at = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO coin_balances (
               object_id, version, at_epoch, owner,
               balance, deleted, recorded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;

          for row in &rows {
            let balance = (!row.deleted).then_some(row.balance);
            stmt.execute(rusqlite::params![
              row.object_id.as_str(),
              row.version,
              row.at_epoch,
              row.owner.as_str(),
              balance,
              row.deleted,
              recorded_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn staked_for(
    &self,
    owner: &Address,
    at_epoch: Epoch,
  ) -> Result<Vec<StakedPosition>> {
    let owner_str = owner.as_str().to_owned();

    let raws: Vec<RawStakedRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "WITH latest AS (
             SELECT object_id, MAX(version) AS max_version
             FROM staked_positions
             WHERE owner = ?1 AND at_epoch <= ?2
             GROUP BY object_id
           )
           SELECT
             p.object_id, p.version, p.at_epoch, p.owner,
             p.pool_id, p.principal, p.stake_activation_epoch, p.deleted
           FROM staked_positions p
           JOIN latest l
             ON p.object_id = l.object_id AND p.version = l.max_version
           WHERE NOT p.deleted
           ORDER BY p.object_id",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![owner_str, at_epoch], |row| {
            Ok(RawStakedRow {
              object_id:              row.get(0)?,
              version:                row.get(1)?,
              at_epoch:               row.get(2)?,
              owner:                  row.get(3)?,
              pool_id:                row.get(4)?,
              principal:              row.get(5)?,
              stake_activation_epoch: row.get(6)?,
              deleted:                row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawStakedRow::into_position).collect())
  }

  async fn coins_for(
    &self,
    owner: &Address,
    at_epoch: Epoch,
  ) -> Result<Vec<CoinBalance>> {
    let owner_str = owner.as_str().to_owned();

    let raws: Vec<RawCoinRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "WITH latest AS (
             SELECT object_id, MAX(version) AS max_version
             FROM coin_balances
             WHERE owner = ?1 AND at_epoch <= ?2
             GROUP BY object_id
           )
           SELECT
             c.object_id, c.version, c.at_epoch, c.owner,
             c.balance, c.deleted
           FROM coin_balances c
           JOIN latest l
             ON c.object_id = l.object_id AND c.version = l.max_version
           WHERE NOT c.deleted
           ORDER BY c.object_id",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![owner_str, at_epoch], |row| {
            Ok(RawCoinRow {
              object_id: row.get(0)?,
              version:   row.get(1)?,
              at_epoch:  row.get(2)?,
              owner:     row.get(3)?,
              balance:   row.get(4)?,
              deleted:   row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawCoinRow::into_balance).collect())
  }
}
