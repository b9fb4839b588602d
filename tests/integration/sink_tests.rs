use dupfinder::actions::{remove_files, DeleteError, SinkKind};
use dupfinder::config::ScanConfig;
use dupfinder::report::{generate_report, get_files_to_remove, load_report, KeepRule};
use dupfinder::scanner::Scanner;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_scan_report_remove_pipeline() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    for name in ["one.txt", "two.txt", "three.txt"] {
        fs::write(dir.path().join(name), b"payload").unwrap();
    }
    fs::write(dir.path().join("other.txt"), b"different").unwrap();

    let (groups, _) = Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();
    let report = out.path().join("report.txt");
    generate_report(&groups, &report, KeepRule::ShortestPath).unwrap();

    let to_remove = get_files_to_remove(&load_report(&report).unwrap());
    let summary = SinkKind::Delete.execute(&to_remove).unwrap();

    assert_eq!(summary.files, 2);
    assert_eq!(summary.bytes, 14);
    assert!(to_remove.iter().all(|p| !p.exists()));
    assert!(dir.path().join("one.txt").exists());
    assert!(dir.path().join("other.txt").exists());

    // Nothing left to group afterwards
    let (groups, _) = Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_remove_files_aborts_remaining_batch() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    fs::write(&first, b"1").unwrap();
    fs::write(&second, b"2").unwrap();
    let vanished: PathBuf = dir.path().join("vanished");

    let err = remove_files(&[first.clone(), vanished.clone(), second.clone()]).unwrap_err();

    assert!(matches!(err, DeleteError::NotFound(ref p) if *p == vanished));
    assert!(!first.exists());
    assert!(second.exists());
}

#[test]
fn test_empty_batch_is_noop() {
    let summary = SinkKind::Trash.execute(&[]).unwrap();
    assert_eq!(summary.files, 0);
    assert!(summary.trashed);
}
