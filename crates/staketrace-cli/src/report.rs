//! CSV report generation: per-wallet balances and reward estimates across a
//! range of epochs, one column per epoch.
//!
//! Each wallet gets four rows: liquid balance, staked principal, the reward
//! estimated to have accrued during each single epoch, and the running total
//! of those estimates. All amounts are converted from the smallest unit to
//! whole tokens with two decimals.

use std::io::Write;

use anyhow::{Context, Result};
use staketrace_core::{
  aggregate::{cumulative, totals_at_epoch},
  event::Epoch,
  position::StakedPosition,
  reward::{RewardResult, ValidatorDirectory, calculate_reward},
  snapshot::RateTable,
  source::PositionSink,
};
use tracing::info;

use crate::input::WalletEntry;

const MIST_PER_SUI: f64 = 1e9;

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
  pub start_epoch:  Epoch,
  pub end_epoch:    Epoch,
  /// Skipped when appending to a report that already has one.
  pub write_header: bool,
}

fn format_sui(mist: f64) -> String { format!("{:.2}", mist / MIST_PER_SUI) }

/// Reward accrued by one position during the single epoch ending at
/// `target`. The activation epoch is clamped into the one-epoch window so
/// the per-epoch rows sum to the full-lifetime estimate: a position active
/// before the window accrues from `target - 1`, one activating mid-window
/// from its own activation epoch, and one not yet active accrues nothing.
fn epoch_reward(
  position: &StakedPosition,
  target: Epoch,
  directory: &impl ValidatorDirectory,
  rates: &RateTable,
) -> Result<RewardResult> {
  let window_start = target.saturating_sub(1);
  let activation = position
    .stake_activation_epoch
    .clamp(window_start, target);

  calculate_reward(
    position.principal,
    &position.pool_id,
    activation,
    target,
    directory,
    rates,
  )
  .with_context(|| {
    format!("reward for {} at epoch {target}", position.object_id)
  })
}

/// Write the report for `wallets` over `options`' epoch range to `out`.
pub async fn write_report<K, D, W>(
  sink: &K,
  directory: &D,
  rates: &RateTable,
  wallets: &[WalletEntry],
  options: ReportOptions,
  out: W,
) -> Result<()>
where
  K: PositionSink,
  D: ValidatorDirectory,
  W: Write,
{
  let epochs: Vec<Epoch> = (options.start_epoch..=options.end_epoch).collect();
  let mut writer = csv::Writer::from_writer(out);

  if options.write_header {
    let mut header = vec!["Address".to_owned(), "Name".to_owned(), "Type".to_owned()];
    header.extend(epochs.iter().map(Epoch::to_string));
    writer.write_record(&header)?;
  }

  for wallet in wallets {
    let mut liquid = Vec::with_capacity(epochs.len());
    let mut staked = Vec::with_capacity(epochs.len());
    let mut rewards = Vec::with_capacity(epochs.len());

    for &epoch in &epochs {
      let coins = sink
        .coins_for(&wallet.address, epoch)
        .await
        .with_context(|| format!("reading coins at epoch {epoch}"))?;
      let positions = sink
        .staked_for(&wallet.address, epoch)
        .await
        .with_context(|| format!("reading positions at epoch {epoch}"))?;

      let epoch_rewards = positions
        .iter()
        .map(|position| epoch_reward(position, epoch, directory, rates))
        .collect::<Result<Vec<_>>>()?;

      let totals = totals_at_epoch(&coins, &positions, &epoch_rewards);
      liquid.push(totals.liquid as f64);
      staked.push(totals.staked as f64);
      rewards.push(totals.rewards);
    }

    let running = cumulative(&rewards);
    let name = wallet.category.as_deref().unwrap_or("");

    for (label, series) in [
      ("Liquid SUI", &liquid),
      ("Staked SUI", &staked),
      ("Estimated Reward for Epoch", &rewards),
      ("Cumulative to Epoch", &running),
    ] {
      let mut record =
        vec![wallet.address.as_str().to_owned(), name.to_owned(), label.to_owned()];
      record.extend(series.iter().copied().map(format_sui));
      writer.write_record(&record)?;
    }

    info!(wallet = %wallet.address, "report rows written");
  }

  writer.flush()?;
  Ok(())
}
