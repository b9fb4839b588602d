//! Checkpoint entry definitions.

use std::path::PathBuf;

use crate::scanner::FileRecord;

/// Last known state of one path, as persisted in the checkpoint store.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointEntry {
    /// Path of the file (primary key)
    pub path: PathBuf,
    /// Hex content fingerprint
    pub fingerprint: String,
    /// Size in bytes when hashed
    pub size: u64,
    /// Modification time when hashed, seconds since the Unix epoch
    pub modified: f64,
}

impl CheckpointEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(path: PathBuf, fingerprint: String, size: u64, modified: f64) -> Self {
        Self {
            path,
            fingerprint,
            size,
            modified,
        }
    }

    /// Whether this entry still describes a file with the given stat.
    ///
    /// Both values must match exactly.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_valid_for(&self, size: u64, modified: f64) -> bool {
        self.size == size && self.modified == modified
    }
}

impl From<&FileRecord> for CheckpointEntry {
    fn from(record: &FileRecord) -> Self {
        Self {
            path: record.path.clone(),
            fingerprint: record.fingerprint.clone(),
            size: record.size,
            modified: record.modified_secs(),
        }
    }
}
