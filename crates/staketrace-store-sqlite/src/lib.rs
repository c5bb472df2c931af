//! SQLite backend for the staketrace position sink.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Rows are keyed by
//! `(object_id, version)`; point-in-time queries pick the latest
//! non-tombstoned version of each object as of a query epoch.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteSink;
