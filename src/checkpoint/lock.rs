//! Per-root scan lock.
//!
//! A scan holds `.dupfinder_cache.lock` inside the root for its whole
//! duration. The file is created with create-new semantics and records the
//! owner's PID, so a second scan of the same root fails fast instead of
//! interleaving checkpoint writes. The lock is released when the guard is
//! dropped, including on error and interruption paths.
//!
//! A process killed outright leaves the file behind. The next
//! [`ScanLock::acquire`] sees that the recorded PID is no longer running and
//! takes the lock over, so a resume after a crash keeps every committed
//! checkpoint row. A file whose PID cannot be read is treated as live;
//! [`ScanLock::force_release`] removes it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sysinfo::{Pid, System};

use super::database::{CheckpointError, CheckpointResult};

/// File name of the lock inside the scanned root.
pub const LOCK_FILENAME: &str = ".dupfinder_cache.lock";

/// Lock files held by this process, for [`release_held`].
static HELD: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// Guard for an exclusively held scan lock.
#[derive(Debug)]
pub struct ScanLock {
    path: PathBuf,
}

impl ScanLock {
    /// Acquire the lock for `root`, taking over a lock left by a dead process.
    ///
    /// # Errors
    ///
    /// - [`CheckpointError::Locked`] if a running process holds the lock
    /// - [`CheckpointError::Io`] if the lock file cannot be created
    pub fn acquire(root: &Path) -> CheckpointResult<Self> {
        let path = root.join(LOCK_FILENAME);
        let mut file = match create_lock_file(&path) {
            Ok(file) => file,
            Err(CheckpointError::Locked(_)) if remove_if_stale(&path)? => {
                create_lock_file(&path)?
            }
            Err(e) => return Err(e),
        };

        // The guard exists from here on, so a failed write still cleans up.
        let lock = Self { path };
        if let Ok(mut held) = HELD.lock() {
            held.push(lock.path.clone());
        }
        writeln!(file, "{}", std::process::id()).map_err(|source| CheckpointError::Io {
            path: lock.path.clone(),
            source,
        })?;

        log::debug!("Acquired scan lock {}", lock.path.display());
        Ok(lock)
    }

    /// Remove a leftover lock file for `root`. Returns `true` if one existed.
    ///
    /// The owner is not checked; only use this when no scan of `root` runs.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Io`] if the file exists but cannot be removed.
    pub fn force_release(root: &Path) -> CheckpointResult<bool> {
        let path = root.join(LOCK_FILENAME);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::warn!("Removed scan lock {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CheckpointError::Io { path, source }),
        }
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScanLock {
    fn drop(&mut self) {
        if let Ok(mut held) = HELD.lock() {
            held.retain(|p| p != &self.path);
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Released scan lock {}", self.path.display()),
            Err(e) => log::warn!(
                "Failed to release scan lock {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Remove every lock file this process holds.
///
/// For exit paths that skip destructors, such as an abort from the signal
/// handler.
pub fn release_held() {
    release_all(&HELD);
}

fn release_all(held: &Mutex<Vec<PathBuf>>) {
    let Ok(mut held) = held.lock() else {
        return;
    };
    for path in held.drain(..) {
        if std::fs::remove_file(&path).is_ok() {
            log::debug!("Released scan lock {} on abort", path.display());
        }
    }
}

fn create_lock_file(path: &Path) -> CheckpointResult<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::AlreadyExists {
                CheckpointError::Locked(path.to_path_buf())
            } else {
                CheckpointError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
}

/// PID recorded in the lock file, if it can be read.
fn owner_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn process_alive(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    let mut system = System::new();
    system.refresh_process(Pid::from_u32(pid))
}

/// Delete the lock at `path` if its owner is gone. Returns `true` if the
/// lock may be retried.
fn remove_if_stale(path: &Path) -> CheckpointResult<bool> {
    let Some(pid) = owner_pid(path) else {
        return Ok(false);
    };
    if process_alive(pid) {
        return Ok(false);
    }

    log::warn!(
        "Taking over scan lock {} left by process {} which is no longer running",
        path.display(),
        pid
    );
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(source) => Err(CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
