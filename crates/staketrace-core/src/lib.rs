//! Core types and reconstruction logic for the staketrace historical
//! staking tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! It turns an append-only stream of ownership-change events into per-object
//! timelines, resolves which object versions existed at any past epoch, and
//! computes time-weighted staking rewards from periodic pool exchange-rate
//! snapshots. Fetching the event stream and persisting the results are the
//! business of the collaborator traits in [`source`], implemented elsewhere.

pub mod aggregate;
pub mod error;
pub mod event;
pub mod filter;
pub mod position;
pub mod resolve;
pub mod reward;
pub mod snapshot;
pub mod source;
pub mod timeline;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
