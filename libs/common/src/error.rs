//! Custom error types for the common library
//!
//! This module defines the error types raised while reading, decoding,
//! encoding and writing registry snapshots.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Custom error type for snapshot operations
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The snapshot exists but could not be read
    #[error("Snapshot read error at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The new snapshot could not be written or moved into place
    #[error("Snapshot write error at {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The snapshot text is not a JSON object
    #[error("Snapshot parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// The registry could not be serialized
    #[error("Snapshot encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// A single record inside an otherwise readable snapshot is invalid
    #[error("Malformed record '{key}': {reason}")]
    MalformedRecord { key: String, reason: String },

    /// Configuration error
    #[error("Snapshot configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with SnapshotError
pub type SnapshotResult<T> = Result<T, SnapshotError>;
