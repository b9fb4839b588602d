//! Checkpoint store for resumable scans.
//!
//! This module persists per-file scan progress inside the scanned root so an
//! interrupted scan picks up where it left off instead of rehashing
//! everything.
//!
//! # Architecture
//!
//! * [`database`]: SQLite persistence, schema management and the store operations.
//! * [`entry`]: The persisted record and its trust check.
//! * [`lock`]: A lock file preventing two scans of the same root at once.
//!
//! # Trust
//!
//! Entries are keyed by path. A stored fingerprint is only reused when the
//! stored size and modification time exactly match the file's current stat;
//! any mismatch forces a rehash and an overwrite.

pub mod database;
pub mod entry;
pub mod lock;

pub use database::{
    artefact_paths, clear, db_path, CheckpointError, CheckpointResult, CheckpointStore,
    DB_FILENAME,
};
pub use entry::CheckpointEntry;
pub use lock::{release_held, ScanLock, LOCK_FILENAME};
