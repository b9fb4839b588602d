use dupfinder::checkpoint::{self, CheckpointEntry, CheckpointError, CheckpointStore, ScanLock};
use dupfinder::config::ScanConfig;
use dupfinder::scanner::{FinderError, Scanner};
use filetime::{set_file_mtime, FileTime};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8], mtime: i64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
    path
}

fn resume_config(root: &Path) -> ScanConfig {
    ScanConfig::builder(root).resume(true).build().unwrap()
}

#[test]
fn test_resume_reuses_checkpoint_without_rehash() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"same", 1_000);
    write(dir.path(), "b.txt", b"same", 2_000);
    write(dir.path(), "c.txt", b"other", 3_000);

    let (fresh_groups, fresh) = Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();
    assert_eq!(fresh.files_hashed, 3);
    assert_eq!(fresh.checkpoint_hits, 0);

    let (resumed_groups, resumed) = Scanner::new(resume_config(dir.path())).scan().unwrap();
    assert_eq!(resumed.files_hashed, 0);
    assert_eq!(resumed.checkpoint_hits, 3);
    assert_eq!(resumed_groups, fresh_groups);
}

#[test]
fn test_changed_mtime_forces_rehash() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"same", 1_000);
    write(dir.path(), "b.txt", b"same", 1_000);

    Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();

    // Same size, new content and a new mtime
    fs::write(&a, b"diff").unwrap();
    set_file_mtime(&a, FileTime::from_unix_time(5_000, 0)).unwrap();

    let (groups, summary) = Scanner::new(resume_config(dir.path())).scan().unwrap();
    assert_eq!(summary.files_hashed, 1);
    assert_eq!(summary.checkpoint_hits, 1);
    assert!(groups.is_empty());

    let store = CheckpointStore::open(dir.path()).unwrap();
    let key = std::path::absolute(&a).unwrap();
    let entry = store.get(&key).unwrap().unwrap();
    assert_eq!(entry.modified, 5_000.0);
}

#[test]
fn test_changed_size_forces_rehash() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"short", 1_000);

    Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();

    // Same mtime, different size
    fs::write(&a, b"much longer").unwrap();
    set_file_mtime(&a, FileTime::from_unix_time(1_000, 0)).unwrap();

    let (_, summary) = Scanner::new(resume_config(dir.path())).scan().unwrap();
    assert_eq!(summary.files_hashed, 1);
    assert_eq!(summary.checkpoint_hits, 0);
}

#[test]
fn test_resume_prunes_deleted_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"one", 1_000);
    let gone = write(dir.path(), "b.txt", b"two", 1_000);

    Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();
    fs::remove_file(&gone).unwrap();

    let (_, summary) = Scanner::new(resume_config(dir.path())).scan().unwrap();
    assert_eq!(summary.checkpoint_pruned, 1);

    let store = CheckpointStore::open(dir.path()).unwrap();
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_non_resume_scan_leaves_stale_rows() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"one", 1_000);
    let gone = write(dir.path(), "b.txt", b"two", 1_000);

    Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();
    fs::remove_file(&gone).unwrap();

    let (_, summary) = Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();
    assert_eq!(summary.checkpoint_pruned, 0);
    assert_eq!(summary.files_hashed, 1);
    assert_eq!(CheckpointStore::open(dir.path()).unwrap().len().unwrap(), 2);
}

#[test]
fn test_prune_missing_exact() {
    let store = CheckpointStore::in_memory().unwrap();
    for name in ["/r/a", "/r/b", "/r/c"] {
        store
            .upsert(&CheckpointEntry::new(name.into(), "f".into(), 1, 1.0))
            .unwrap();
    }

    let present: HashSet<PathBuf> = [PathBuf::from("/r/a"), PathBuf::from("/r/c")]
        .into_iter()
        .collect();
    assert_eq!(store.prune_missing(&present).unwrap(), 1);

    let rows = store.load_all().unwrap();
    let keys: HashSet<PathBuf> = rows.keys().cloned().collect();
    assert_eq!(keys, present);
}

#[test]
fn test_interrupted_scan_keeps_committed_rows() {
    use dupfinder::progress::ProgressCallback;

    // Raises the shutdown flag after the first visited file
    struct StopAfterFirst(Arc<AtomicBool>);
    impl ProgressCallback for StopAfterFirst {
        fn on_phase_start(&self, _phase: &str, _total: usize) {}
        fn on_progress(&self, _current: usize, _path: &Path) {
            self.0.store(true, Ordering::SeqCst);
        }
        fn on_phase_end(&self, _phase: &str) {}
    }

    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"same", 1_000);
    write(dir.path(), "b.txt", b"same", 1_000);
    write(dir.path(), "c.txt", b"same", 1_000);

    let flag = Arc::new(AtomicBool::new(false));
    let result = Scanner::new(ScanConfig::new(dir.path()))
        .with_shutdown_flag(flag.clone())
        .with_progress_callback(Arc::new(StopAfterFirst(flag)))
        .scan();
    assert!(matches!(result, Err(FinderError::Interrupted)));

    assert_eq!(CheckpointStore::open(dir.path()).unwrap().len().unwrap(), 1);
    assert!(!dir.path().join(checkpoint::LOCK_FILENAME).exists());

    let (groups, summary) = Scanner::new(resume_config(dir.path())).scan().unwrap();
    assert_eq!(summary.checkpoint_hits, 1);
    assert_eq!(summary.files_hashed, 2);
    assert_eq!(groups.values().next().unwrap().len(), 3);
}

#[test]
fn test_concurrent_scan_is_refused() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"x", 1_000);

    let _held = ScanLock::acquire(dir.path()).unwrap();
    let result = Scanner::new(ScanConfig::new(dir.path())).scan();

    assert!(matches!(
        result,
        Err(FinderError::Checkpoint(CheckpointError::Locked(_)))
    ));
}

#[test]
fn test_clear_forces_fresh_scan() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"x", 1_000);

    Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();
    assert!(checkpoint::db_path(dir.path()).exists());

    assert!(checkpoint::clear(dir.path()).unwrap());
    assert!(!checkpoint::db_path(dir.path()).exists());
    assert!(!checkpoint::clear(dir.path()).unwrap());

    let (_, summary) = Scanner::new(resume_config(dir.path())).scan().unwrap();
    assert_eq!(summary.checkpoint_hits, 0);
    assert_eq!(summary.files_hashed, 1);
}

#[test]
fn test_resume_after_crash_takes_over_dead_lock() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"same", 1_000);
    write(dir.path(), "b.txt", b"same", 2_000);
    Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();

    // A killed scan leaves its lock behind with a PID that no longer runs
    let lock_path = dir.path().join(checkpoint::LOCK_FILENAME);
    fs::write(&lock_path, format!("{}\n", u32::MAX)).unwrap();

    let (groups, summary) = Scanner::new(resume_config(dir.path())).scan().unwrap();
    assert_eq!(summary.checkpoint_hits, 2);
    assert_eq!(summary.files_hashed, 0);
    assert_eq!(groups.len(), 1);
    assert!(!lock_path.exists());
}

#[test]
fn test_clear_keeps_store_of_running_scan() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"x", 1_000);
    Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();

    let held = ScanLock::acquire(dir.path()).unwrap();
    assert!(matches!(
        checkpoint::clear(dir.path()),
        Err(CheckpointError::Locked(_))
    ));
    assert!(checkpoint::db_path(dir.path()).exists());
    drop(held);

    assert!(checkpoint::clear(dir.path()).unwrap());
}
