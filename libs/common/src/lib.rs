//! Common library for the fitness registry
//!
//! This crate provides the storage infrastructure used by the registry
//! service: the snapshot codec, the snapshot file engine, and their error
//! types.
//!
//! ```rust,no_run
//! use common::snapshot::{SnapshotConfig, SnapshotStore};
//! # use serde::{Deserialize, Serialize};
//! # #[derive(Serialize, Deserialize)]
//! # struct Note { id: String }
//! # impl common::SnapshotRecord for Note {
//! #     fn record_key(&self) -> &str { &self.id }
//! # }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SnapshotConfig::from_env()?;
//!     let store = SnapshotStore::<Note>::new(&config)?;
//!     let report = store.load()?;
//!     println!("Loaded {} records", report.records.len());
//!     store.save(&report.records)?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod snapshot;

pub use codec::{Decoded, RejectedRecord, SnapshotRecord, check_record};
pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{LoadReport, SnapshotConfig, SnapshotStore};
