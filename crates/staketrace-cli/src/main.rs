//! staketrace binary.
//!
//! `staketrace sync` pulls each listed wallet's transaction history from a
//! Sui fullnode and persists every observed object state to SQLite.
//! `staketrace report` reads those states back at a range of epochs and
//! writes the balances-and-rewards CSV.

use std::{
  fs::{File, OpenOptions},
  path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use staketrace_core::event::Epoch;
use staketrace_store_sqlite::SqliteSink;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod directory;
mod input;
mod report;
mod rpc;
mod wallet;

const DEFAULT_RPC_URL: &str = "https://fullnode.mainnet.sui.io:443";
const DEFAULT_DB_PATH: &str = "staketrace.db";

#[derive(Parser)]
#[command(author, version, about = "Historical Sui staking tracker")]
struct Cli {
  /// Path to an optional TOML configuration file.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Fullnode JSON-RPC endpoint.
  #[arg(long, env = "STAKETRACE_RPC_URL")]
  rpc_url: Option<String>,

  /// SQLite database path.
  #[arg(long, env = "STAKETRACE_DB")]
  db: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Fetch and persist the object history of every wallet in the list.
  Sync {
    /// CSV file listing the wallets to track.
    #[arg(short, long, default_value = "input_addresses.csv")]
    input: PathBuf,
  },

  /// Write the per-epoch balances and reward estimates CSV.
  Report {
    /// CSV file listing the wallets to report on.
    #[arg(short, long, default_value = "input_addresses.csv")]
    input: PathBuf,

    /// First epoch column of the report.
    #[arg(long, default_value_t = 0)]
    start_epoch: Epoch,

    /// Last epoch column of the report.
    #[arg(long)]
    end_epoch: Epoch,

    /// Output CSV path.
    #[arg(short, long, default_value = "staking_report.csv")]
    output: PathBuf,

    /// Append to an existing report instead of overwriting it.
    #[arg(long)]
    append: bool,
  },
}

/// Optional TOML configuration. Flags beat the file; the file beats the
/// built-in defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
  rpc_url: Option<String>,
  db:      Option<PathBuf>,
}

struct Settings {
  rpc_url: String,
  db:      PathBuf,
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
  let file: ConfigFile = match &cli.config {
    Some(path) => {
      let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
      toml::from_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))?
    }
    None => ConfigFile::default(),
  };

  Ok(Settings {
    rpc_url: cli
      .rpc_url
      .clone()
      .or(file.rpc_url)
      .unwrap_or_else(|| DEFAULT_RPC_URL.to_owned()),
    db:      cli
      .db
      .clone()
      .or(file.db)
      .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
  })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = load_settings(&cli)?;

  match cli.command {
    Command::Sync { ref input } => run_sync(&settings, input).await,
    Command::Report {
      ref input,
      start_epoch,
      end_epoch,
      ref output,
      append,
    } => {
      run_report(&settings, input, start_epoch, end_epoch, output, append)
        .await
    }
  }
}

async fn run_sync(
  settings: &Settings,
  input: &PathBuf,
) -> anyhow::Result<()> {
  let wallets = input::read_wallets(input)?;
  if wallets.is_empty() {
    tracing::warn!(input = %input.display(), "wallet list is empty");
    return Ok(());
  }

  let client = rpc::SuiClient::new(&settings.rpc_url)
    .context("building RPC client")?;
  let sink = SqliteSink::open(&settings.db)
    .await
    .with_context(|| format!("opening database {}", settings.db.display()))?;

  // One wallet failing must not stop the rest.
  for entry in &wallets {
    match wallet::sync_wallet(&client, &sink, &entry.address).await {
      Ok(stats) => tracing::info!(
        wallet = %entry.address,
        staked_rows = stats.staked_rows,
        coin_rows = stats.coin_rows,
        "wallet synced"
      ),
      Err(err) => tracing::error!(
        wallet = %entry.address,
        error = %err,
        "sync failed; continuing with remaining wallets"
      ),
    }
  }

  Ok(())
}

async fn run_report(
  settings: &Settings,
  input: &PathBuf,
  start_epoch: Epoch,
  end_epoch: Epoch,
  output: &PathBuf,
  append: bool,
) -> anyhow::Result<()> {
  anyhow::ensure!(
    start_epoch <= end_epoch,
    "start epoch {start_epoch} is after end epoch {end_epoch}"
  );

  let wallets = input::read_wallets(input)?;
  let client = rpc::SuiClient::new(&settings.rpc_url)
    .context("building RPC client")?;
  let sink = SqliteSink::open(&settings.db)
    .await
    .with_context(|| format!("opening database {}", settings.db.display()))?;

  let rates = client
    .query_epoch_info_events()
    .await
    .context("fetching exchange-rate snapshots")?;
  tracing::info!(snapshots = rates.len(), "exchange-rate table loaded");

  let directory = directory::ChainValidatorDirectory::load(&client).await?;

  let out: File = if append {
    OpenOptions::new()
      .create(true)
      .append(true)
      .open(output)
      .with_context(|| format!("opening report {}", output.display()))?
  } else {
    File::create(output)
      .with_context(|| format!("creating report {}", output.display()))?
  };

  report::write_report(
    &sink,
    &directory,
    &rates,
    &wallets,
    report::ReportOptions { start_epoch, end_epoch, write_header: !append },
    out,
  )
  .await?;

  tracing::info!(report = %output.display(), "report written");
  Ok(())
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::{Cli, DEFAULT_DB_PATH, DEFAULT_RPC_URL, load_settings};

  #[test]
  fn flags_beat_config_file_beats_defaults() {
    let cli = Cli::parse_from([
      "staketrace",
      "--rpc-url",
      "http://localhost:9000",
      "sync",
    ]);
    let settings = load_settings(&cli).unwrap();
    assert_eq!(settings.rpc_url, "http://localhost:9000");
    assert_eq!(settings.db.to_str(), Some(DEFAULT_DB_PATH));
  }

  #[test]
  fn defaults_apply_without_flags_or_file() {
    let cli = Cli::parse_from(["staketrace", "sync"]);
    let settings = load_settings(&cli).unwrap();
    assert_eq!(settings.rpc_url, DEFAULT_RPC_URL);
  }
}
