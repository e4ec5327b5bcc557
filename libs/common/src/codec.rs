//! Snapshot codec
//!
//! Converts a keyed registry map to and from its JSON text form. Decoding
//! isolates failures per record: one malformed entry is reported and skipped
//! while the rest of the snapshot still loads.

use std::collections::BTreeMap;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{SnapshotError, SnapshotResult};

/// A record stored under its own key in a snapshot
pub trait SnapshotRecord: Serialize + DeserializeOwned {
    /// The key this record must be stored under
    fn record_key(&self) -> &str;
}

/// An entry that was present in the snapshot but could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub key: String,
    pub reason: String,
}

impl From<RejectedRecord> for SnapshotError {
    fn from(rejected: RejectedRecord) -> Self {
        SnapshotError::MalformedRecord {
            key: rejected.key,
            reason: rejected.reason,
        }
    }
}

/// Result of decoding a snapshot document
#[derive(Debug)]
pub struct Decoded<T> {
    /// Records that decoded cleanly, keyed by record key
    pub records: BTreeMap<String, T>,
    /// Entries skipped because they were malformed
    pub rejected: Vec<RejectedRecord>,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            rejected: Vec::new(),
        }
    }
}

/// Encode a registry map as a pretty-printed JSON object
///
/// Keys are emitted in sorted order so identical registries produce
/// identical snapshots.
pub fn encode_records<T: SnapshotRecord>(records: &BTreeMap<String, T>) -> SnapshotResult<String> {
    serde_json::to_string_pretty(records).map_err(SnapshotError::Encode)
}

/// Check that a single record can be encoded
///
/// Lets callers refuse a record before it enters a registry whose next save
/// would fail on it.
pub fn check_record<T: SnapshotRecord>(record: &T) -> SnapshotResult<()> {
    serde_json::to_value(record)
        .map(drop)
        .map_err(SnapshotError::Encode)
}

/// Decode a snapshot document
///
/// # Returns
/// * `Err(SnapshotError::Parse)` - the document as a whole is not a JSON object
/// * `Ok(Decoded)` - every entry that decoded, plus the ones that did not
pub fn decode_records<T: SnapshotRecord>(bytes: &[u8]) -> SnapshotResult<Decoded<T>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Decoded::default());
    }

    let document: Map<String, Value> =
        serde_json::from_slice(bytes).map_err(SnapshotError::Parse)?;

    let mut decoded = Decoded::default();
    for (key, value) in document {
        match serde_json::from_value::<T>(value) {
            Ok(record) if record.record_key() == key => {
                decoded.records.insert(key, record);
            }
            Ok(record) => {
                let reason = format!(
                    "record key '{}' does not match entry key",
                    record.record_key()
                );
                decoded.rejected.push(RejectedRecord { key, reason });
            }
            Err(e) => {
                decoded.rejected.push(RejectedRecord {
                    key,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(decoded)
}
