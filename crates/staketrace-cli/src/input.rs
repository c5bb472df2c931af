//! Wallet list input — the CSV file naming the addresses to track.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use staketrace_core::event::Address;

/// One row of the wallet list. Only the address is required; the category
/// fills the report's `Name` column when present.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletEntry {
  #[serde(rename = "Wallet Address")]
  pub address:  Address,
  #[serde(rename = "Category")]
  pub category: Option<String>,
}

/// Read the wallet list at `path`. An empty list is not an error; the
/// caller decides whether doing nothing is acceptable.
pub fn read_wallets(path: impl AsRef<Path>) -> Result<Vec<WalletEntry>> {
  let path = path.as_ref();
  let mut reader = csv::Reader::from_path(path)
    .with_context(|| format!("opening wallet list {}", path.display()))?;

  reader
    .deserialize()
    .collect::<Result<Vec<WalletEntry>, _>>()
    .with_context(|| format!("parsing wallet list {}", path.display()))
}
