//! Integration tests for the snapshot store
//!
//! These tests walk a snapshot file through the startup and save cycle a
//! service goes through: first start, normal saves, corruption on disk, and
//! recovery.

use std::collections::BTreeMap;
use std::fs;

use common::{SnapshotConfig, SnapshotRecord, SnapshotStore};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    date: String,
    amount: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Account {
    owner: String,
    #[serde(default)]
    entries: Vec<Entry>,
}

impl SnapshotRecord for Account {
    fn record_key(&self) -> &str {
        &self.owner
    }
}

fn account(owner: &str, amounts: &[u32]) -> (String, Account) {
    let entries = amounts
        .iter()
        .map(|&amount| Entry {
            date: "2023-10-15".to_string(),
            amount,
        })
        .collect();
    (
        owner.to_string(),
        Account {
            owner: owner.to_string(),
            entries,
        },
    )
}

#[test]
fn test_snapshot_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut config = SnapshotConfig::new(dir.path().join("accounts.json"));
    config.backup_suffix = ".prev".to_string();
    let store = SnapshotStore::<Account>::new(&config)?;

    // First start: nothing on disk
    let report = store.load()?;
    assert!(report.records.is_empty());

    // Two saves: the second leaves the first behind as backup
    let first: BTreeMap<_, _> = [account("ann", &[10, 20])].into_iter().collect();
    store.save(&first)?;
    let first_bytes = fs::read(store.path())?;

    let second: BTreeMap<_, _> = [account("ann", &[10, 20]), account("ben", &[5])]
        .into_iter()
        .collect();
    store.save(&second)?;
    assert_eq!(fs::read(dir.path().join("accounts.json.prev"))?, first_bytes);

    // Restart: a fresh handle sees the same registry, twice in a row
    let reopened = SnapshotStore::<Account>::new(&config)?;
    assert_eq!(reopened.load()?.records, second);
    assert_eq!(reopened.load()?.records, second);

    // Corruption on disk: startup still succeeds and the bytes are kept
    fs::write(store.path(), b"\xff\xfe not json")?;
    let report = reopened.load()?;
    assert!(report.records.is_empty());
    assert!(report.quarantined);
    assert_eq!(fs::read(store.quarantine_path())?, b"\xff\xfe not json");

    // Recovery: saving again produces a readable snapshot
    reopened.save(&second)?;
    assert_eq!(reopened.load()?.records, second);

    Ok(())
}
