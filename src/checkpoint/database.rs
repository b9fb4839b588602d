//! SQLite-backed checkpoint database.
//!
//! One database file lives directly inside each scanned root. Every write is
//! issued in autocommit mode, so a record is durable as soon as
//! [`CheckpointStore::upsert`] returns.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use thiserror::Error;

use super::entry::CheckpointEntry;

/// File name of the checkpoint database inside the scanned root.
pub const DB_FILENAME: &str = ".dupfinder_cache.db";

/// Side files SQLite may create next to the database.
const SIDE_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS scanned_files (
        file_path TEXT PRIMARY KEY,
        md5 TEXT NOT NULL,
        file_size INTEGER NOT NULL,
        last_modified REAL NOT NULL
    );
";

/// Errors raised by the checkpoint store.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The underlying SQLite operation failed.
    #[error("checkpoint database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A filesystem operation on the checkpoint failed.
    #[error("checkpoint I/O error for {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Another scan holds the lock for this root.
    #[error("another scan of this directory is running (lock file {0}); if it is not, run `dupfinder clear --lock-only`")]
    Locked(PathBuf),
}

/// Result alias for checkpoint operations.
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Location of the checkpoint database for `root`.
#[must_use]
pub fn db_path(root: &Path) -> PathBuf {
    root.join(DB_FILENAME)
}

/// Every file the checkpoint machinery may create inside `root`.
///
/// The scanner excludes these from enumeration.
#[must_use]
pub fn artefact_paths(root: &Path) -> Vec<PathBuf> {
    let db = db_path(root);
    let mut paths = vec![db.clone(), root.join(super::LOCK_FILENAME)];
    paths.extend(SIDE_SUFFIXES.iter().map(|suffix| {
        let mut name = db.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }));
    paths
}

/// Delete the checkpoint database for `root`, forcing the next scan to start fresh.
///
/// Returns `true` if a database existed. The scan lock is held while the
/// files are removed, so the store of a running scan is never wiped.
///
/// # Errors
///
/// - [`CheckpointError::Locked`] if a scan of `root` is running
/// - [`CheckpointError::Io`] if a file exists but cannot be removed
pub fn clear(root: &Path) -> CheckpointResult<bool> {
    if !root.is_dir() {
        return Ok(false);
    }
    let _lock = super::ScanLock::acquire(root)?;

    let db = db_path(root);
    let existed = db.exists();

    for path in artefact_paths(root)
        .into_iter()
        .filter(|p| !p.ends_with(super::LOCK_FILENAME))
    {
        match std::fs::remove_file(&path) {
            Ok(()) => log::debug!("Removed checkpoint file {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(CheckpointError::Io { path, source }),
        }
    }

    if existed {
        log::info!("Cleared checkpoint {}", db.display());
    }
    Ok(existed)
}

/// Handle to an open checkpoint database.
///
/// The connection is closed when the handle is dropped, so holding the
/// store in a scope guarantees release on every exit path.
pub struct CheckpointStore {
    conn: Connection,
    path: PathBuf,
}

impl std::fmt::Debug for CheckpointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CheckpointStore {
    /// Open (creating if absent) the checkpoint for `root`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or is not a valid database.
    pub fn open(root: &Path) -> CheckpointResult<Self> {
        Self::open_at(&db_path(root))
    }

    /// Open (creating if absent) a checkpoint database at an explicit path.
    ///
    /// Schema creation is idempotent.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or is not a valid database.
    pub fn open_at(path: &Path) -> CheckpointResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Opened checkpoint {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// In-memory store, mainly for tests.
    ///
    /// # Errors
    ///
    /// Fails if SQLite cannot allocate the database.
    pub fn in_memory() -> CheckpointResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored record.
    ///
    /// # Errors
    ///
    /// Propagates SQLite failures.
    pub fn load_all(&self) -> CheckpointResult<HashMap<PathBuf, CheckpointEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT file_path, md5, file_size, last_modified FROM scanned_files")?;
        let rows = stmt.query_map([], |row| {
            Ok(CheckpointEntry::new(
                PathBuf::from(row.get::<_, String>(0)?),
                row.get(1)?,
                row.get::<_, i64>(2)? as u64,
                row.get(3)?,
            ))
        })?;

        let mut entries = HashMap::new();
        for entry in rows {
            let entry = entry?;
            entries.insert(entry.path.clone(), entry);
        }
        Ok(entries)
    }

    /// Look up a single path.
    ///
    /// # Errors
    ///
    /// Propagates SQLite failures.
    pub fn get(&self, path: &Path) -> CheckpointResult<Option<CheckpointEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT md5, file_size, last_modified FROM scanned_files WHERE file_path = ?1",
        )?;
        let mut rows = stmt.query(params![path_key(path)])?;
        match rows.next()? {
            Some(row) => Ok(Some(CheckpointEntry::new(
                path.to_path_buf(),
                row.get(0)?,
                row.get::<_, i64>(1)? as u64,
                row.get(2)?,
            ))),
            None => Ok(None),
        }
    }

    /// Insert or replace the record for `entry.path`.
    ///
    /// Runs in autocommit mode: the row is committed before this returns.
    ///
    /// # Errors
    ///
    /// Propagates SQLite failures.
    pub fn upsert(&self, entry: &CheckpointEntry) -> CheckpointResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO scanned_files (file_path, md5, file_size, last_modified)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                path_key(&entry.path),
                entry.fingerprint,
                entry.size as i64,
                entry.modified
            ],
        )?;
        log::trace!("Checkpointed {}", entry.path.display());
        Ok(())
    }

    /// Delete every record whose path is not in `existing_paths`.
    ///
    /// Returns the number of rows removed. The deletes run in one transaction.
    ///
    /// # Errors
    ///
    /// Propagates SQLite failures; on failure no row is removed.
    pub fn prune_missing(&self, existing_paths: &HashSet<PathBuf>) -> CheckpointResult<usize> {
        let stored: Vec<String> = {
            let mut stmt = self.conn.prepare("SELECT file_path FROM scanned_files")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let stale: Vec<String> = stored
            .into_iter()
            .filter(|p| !existing_paths.contains(Path::new(p)))
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM scanned_files WHERE file_path = ?1")?;
            for path in &stale {
                stmt.execute(params![path])?;
            }
        }
        tx.commit()?;

        log::debug!("Pruned {} stale checkpoint row(s)", stale.len());
        Ok(stale.len())
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Propagates SQLite failures.
    pub fn len(&self) -> CheckpointResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scanned_files", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// True if no records are stored.
    ///
    /// # Errors
    ///
    /// Propagates SQLite failures.
    pub fn is_empty(&self) -> CheckpointResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Close the connection explicitly, surfacing any error.
    ///
    /// # Errors
    ///
    /// Returns the SQLite error raised while closing.
    pub fn close(self) -> CheckpointResult<()> {
        self.conn.close().map_err(|(_, e)| CheckpointError::Sqlite(e))
    }
}

/// Text key stored for a path.
fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
