//! Snapshot persistence for the registry
//!
//! This module owns the on-disk snapshot file. Loading recovers from corrupt
//! content instead of failing startup, and saving copies the previous
//! snapshot aside before atomically replacing it.

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::codec::{RejectedRecord, SnapshotRecord, decode_records, encode_records};
use crate::error::{SnapshotError, SnapshotResult};

/// Default snapshot file name
pub const DEFAULT_DATA_FILE: &str = "fitness_data.json";
/// Default suffix of the pre-overwrite backup
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";
/// Default suffix of the copy kept when a snapshot cannot be fully read
pub const DEFAULT_CORRUPT_SUFFIX: &str = ".corrupt";

/// Snapshot configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// Path of the snapshot file
    pub data_file: PathBuf,
    /// Suffix appended to the snapshot path for the pre-save backup
    pub backup_suffix: String,
    /// Suffix appended to the snapshot path for quarantined content
    pub corrupt_suffix: String,
}

impl SnapshotConfig {
    /// Create a configuration for an explicit snapshot path with default suffixes
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            corrupt_suffix: DEFAULT_CORRUPT_SUFFIX.to_string(),
        }
    }

    /// Create a new SnapshotConfig from environment variables
    ///
    /// # Environment Variables
    /// - `FITNESS_DATA_FILE`: Snapshot path (default: "fitness_data.json")
    /// - `FITNESS_BACKUP_SUFFIX`: Backup suffix (default: ".bak")
    /// - `FITNESS_CORRUPT_SUFFIX`: Quarantine suffix (default: ".corrupt")
    pub fn from_env() -> SnapshotResult<Self> {
        let data_file =
            env::var("FITNESS_DATA_FILE").unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string());
        let backup_suffix =
            env::var("FITNESS_BACKUP_SUFFIX").unwrap_or_else(|_| DEFAULT_BACKUP_SUFFIX.to_string());
        let corrupt_suffix =
            env::var("FITNESS_CORRUPT_SUFFIX").unwrap_or_else(|_| DEFAULT_CORRUPT_SUFFIX.to_string());

        let config = Self {
            data_file: PathBuf::from(data_file),
            backup_suffix,
            corrupt_suffix,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the snapshot path and its sibling paths are usable
    pub fn validate(&self) -> SnapshotResult<()> {
        if self.data_file.file_name().is_none() {
            return Err(SnapshotError::Configuration(format!(
                "Snapshot path {} has no file name",
                self.data_file.display()
            )));
        }

        if self.backup_suffix.is_empty() || self.corrupt_suffix.is_empty() {
            return Err(SnapshotError::Configuration(
                "Backup and corrupt suffixes must not be empty".to_string(),
            ));
        }

        if self.backup_suffix == self.corrupt_suffix {
            return Err(SnapshotError::Configuration(
                "Backup and corrupt suffixes must differ".to_string(),
            ));
        }

        Ok(())
    }
}

/// Outcome of loading a snapshot
#[derive(Debug)]
pub struct LoadReport<T> {
    /// Records that were recovered
    pub records: BTreeMap<String, T>,
    /// Entries skipped because they were malformed
    pub rejected: Vec<RejectedRecord>,
    /// Whether the snapshot was moved or copied to the quarantine path
    pub quarantined: bool,
}

impl<T> LoadReport<T> {
    fn empty() -> Self {
        Self {
            records: BTreeMap::new(),
            rejected: Vec::new(),
            quarantined: false,
        }
    }
}

/// A handle to the snapshot file and its sibling backup and quarantine files
#[derive(Debug)]
pub struct SnapshotStore<T> {
    path: PathBuf,
    backup_path: PathBuf,
    quarantine_path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T: SnapshotRecord> SnapshotStore<T> {
    /// Create a snapshot store from configuration
    pub fn new(config: &SnapshotConfig) -> SnapshotResult<Self> {
        config.validate()?;

        Ok(Self {
            path: config.data_file.clone(),
            backup_path: sibling_path(&config.data_file, &config.backup_suffix),
            quarantine_path: sibling_path(&config.data_file, &config.corrupt_suffix),
            _phantom: PhantomData,
        })
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the pre-overwrite backup
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Path where unreadable snapshot content is kept
    pub fn quarantine_path(&self) -> &Path {
        &self.quarantine_path
    }

    /// Load the snapshot
    ///
    /// A missing file yields an empty registry. A file that cannot be parsed
    /// as a whole is moved to the quarantine path and also yields an empty
    /// registry. Malformed individual records are skipped, and the file is
    /// copied to the quarantine path so the skipped entries stay recoverable.
    ///
    /// # Returns
    /// * `Err(SnapshotError::Read)` - the file exists but could not be read
    pub fn load(&self) -> SnapshotResult<LoadReport<T>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "Snapshot {} does not exist, starting with empty registry",
                    self.path.display()
                );
                return Ok(LoadReport::empty());
            }
            Err(source) => {
                error!("Failed to read snapshot {}: {}", self.path.display(), source);
                return Err(SnapshotError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let decoded = match decode_records::<T>(&bytes) {
            Ok(decoded) => decoded,
            Err(e) => {
                error!("Error decoding snapshot {}: {}", self.path.display(), e);
                let quarantined = self.quarantine_unreadable();
                return Ok(LoadReport {
                    quarantined,
                    ..LoadReport::empty()
                });
            }
        };

        let mut quarantined = false;
        if !decoded.rejected.is_empty() {
            for rejected in &decoded.rejected {
                warn!("Skipping record: {}", SnapshotError::from(rejected.clone()));
            }
            quarantined = self.quarantine_partial();
        }

        info!(
            "Loaded {} records from {} ({} skipped)",
            decoded.records.len(),
            self.path.display(),
            decoded.rejected.len()
        );

        Ok(LoadReport {
            records: decoded.records,
            rejected: decoded.rejected,
            quarantined,
        })
    }

    /// Save the full registry
    ///
    /// Records are encoded before anything on disk is touched, so a record
    /// that cannot be encoded leaves the snapshot and its backup as they
    /// were. The current snapshot is then copied to the backup path; a
    /// failed backup is logged and does not block the save. The new content
    /// is written to a temporary sibling file, synced, and renamed over the
    /// snapshot so readers see either the old or the new content. The
    /// containing directory is synced afterwards so the rename itself is
    /// durable.
    pub fn save(&self, records: &BTreeMap<String, T>) -> SnapshotResult<()> {
        let text = encode_records(records)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| SnapshotError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        self.backup_existing();

        let tmp_path = self.temp_path();
        if let Err(source) = write_synced(&tmp_path, text.as_bytes()) {
            error!("Failed to write snapshot {}: {}", tmp_path.display(), source);
            let _ = fs::remove_file(&tmp_path);
            return Err(SnapshotError::Write {
                path: tmp_path,
                source,
            });
        }

        if let Err(source) = fs::rename(&tmp_path, &self.path) {
            error!("Failed to replace snapshot {}: {}", self.path.display(), source);
            let _ = fs::remove_file(&tmp_path);
            return Err(SnapshotError::Write {
                path: self.path.clone(),
                source,
            });
        }

        if let Err(e) = sync_parent_dir(&self.path) {
            debug!("Failed to sync directory of {}: {}", self.path.display(), e);
        }

        info!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Copy the current snapshot to the backup path (best effort)
    fn backup_existing(&self) {
        if !self.path.exists() {
            return;
        }

        match fs::copy(&self.path, &self.backup_path) {
            Ok(_) => info!("Created backup of snapshot: {}", self.backup_path.display()),
            Err(e) => warn!(
                "Failed to create backup {} before saving: {}",
                self.backup_path.display(),
                e
            ),
        }
    }

    /// Move an unparseable snapshot out of the way
    fn quarantine_unreadable(&self) -> bool {
        match fs::rename(&self.path, &self.quarantine_path) {
            Ok(()) => {
                info!(
                    "Moved unreadable snapshot to {}",
                    self.quarantine_path.display()
                );
                true
            }
            Err(rename_err) => {
                warn!("Failed to move unreadable snapshot: {}", rename_err);
                self.quarantine_partial()
            }
        }
    }

    /// Copy a partially readable snapshot so skipped records are kept
    fn quarantine_partial(&self) -> bool {
        match fs::copy(&self.path, &self.quarantine_path) {
            Ok(_) => {
                info!(
                    "Copied snapshot with skipped records to {}",
                    self.quarantine_path.display()
                );
                true
            }
            Err(e) => {
                error!(
                    "Failed to copy snapshot to {}: {}",
                    self.quarantine_path.display(),
                    e
                );
                false
            }
        }
    }

    /// Temporary path used for atomic writes, in the snapshot's directory
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{}.tmp", file_name))
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Sync the directory holding `path` so a rename into it survives a crash
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()
}
