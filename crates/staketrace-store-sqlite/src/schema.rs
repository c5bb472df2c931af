//! SQL schema for the staketrace SQLite sink.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per observed (object, version) state. Re-syncing a wallet
-- replaces rows in place; historical states never change upstream.
CREATE TABLE IF NOT EXISTS staked_positions (
    object_id              TEXT    NOT NULL,
    version                INTEGER NOT NULL,
    at_epoch               INTEGER NOT NULL,  -- epoch this state was observed at
    owner                  TEXT    NOT NULL,
    pool_id                TEXT,              -- NULL on tombstones
    principal              INTEGER,           -- smallest unit; NULL on tombstones
    stake_activation_epoch INTEGER,           -- NULL on tombstones
    deleted                INTEGER NOT NULL DEFAULT 0,
    recorded_at            TEXT    NOT NULL,  -- ISO 8601 UTC; sink-assigned
    PRIMARY KEY (object_id, version)
);

CREATE TABLE IF NOT EXISTS coin_balances (
    object_id   TEXT    NOT NULL,
    version     INTEGER NOT NULL,
    at_epoch    INTEGER NOT NULL,
    owner       TEXT    NOT NULL,
    balance     INTEGER,           -- smallest unit; NULL on tombstones
    deleted     INTEGER NOT NULL DEFAULT 0,
    recorded_at TEXT    NOT NULL,
    PRIMARY KEY (object_id, version)
);

CREATE INDEX IF NOT EXISTS staked_owner_epoch_idx
  ON staked_positions(owner, at_epoch);
CREATE INDEX IF NOT EXISTS coin_owner_epoch_idx
  ON coin_balances(owner, at_epoch);

PRAGMA user_version = 1;
";
