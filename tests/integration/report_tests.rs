use dupfinder::config::ScanConfig;
use dupfinder::report::{
    generate_report, get_files_to_remove, load_report, sort_by_keep_rule, validate_report, Action,
    KeepRule, ReportError, ReportIssue, Validation,
};
use dupfinder::scanner::{DuplicateGroups, Scanner};
use filetime::{set_file_mtime, FileTime};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write(dir: &Path, name: &str, content: &[u8], mtime: i64) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
    path
}

fn scan(root: &Path) -> DuplicateGroups {
    Scanner::new(ScanConfig::new(root)).scan().unwrap().0
}

/// Report lives outside the scanned tree so it never shows up in a scan.
fn report_in(out: &TempDir) -> PathBuf {
    out.path().join("duplicate_report.txt")
}

fn kept_path(report: &Path) -> PathBuf {
    load_report(report)
        .unwrap()
        .into_iter()
        .find(|e| e.action == Action::Keep)
        .unwrap()
        .path
}

#[test]
fn test_oldest_keeps_earliest_file() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"same", 1_000);
    let b = write(dir.path(), "b.txt", b"same", 2_000);
    let c = write(dir.path(), "c.txt", b"same", 3_000);

    let report = report_in(&out);
    generate_report(&scan(dir.path()), &report, KeepRule::Oldest).unwrap();

    let entries = load_report(&report).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].action, Action::Keep);
    assert_eq!(entries[0].path, a);
    assert_eq!(get_files_to_remove(&entries), vec![b, c]);
}

#[test]
fn test_newest_keeps_latest_file() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    write(dir.path(), "a.txt", b"same", 1_000);
    let c = write(dir.path(), "c.txt", b"same", 3_000);
    write(dir.path(), "b.txt", b"same", 2_000);

    let report = report_in(&out);
    generate_report(&scan(dir.path()), &report, KeepRule::Newest).unwrap();

    assert_eq!(kept_path(&report), c);
}

#[test]
fn test_shortest_path_keeps_shortest() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    write(dir.path(), "dir/a.txt", b"same", 1_000);
    let b = write(dir.path(), "b.txt", b"same", 2_000);
    write(dir.path(), "dir/sub/c.txt", b"same", 3_000);

    let report = report_in(&out);
    generate_report(&scan(dir.path()), &report, KeepRule::ShortestPath).unwrap();

    assert_eq!(kept_path(&report), b);
}

#[test]
fn test_round_trip_removes_all_but_kept() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    for i in 0..3 {
        write(dir.path(), &format!("g1/{}.bin", i), b"first", 100 + i);
        write(dir.path(), &format!("g2/deeper/{}.bin", i), b"second", 300 - i);
    }
    write(dir.path(), "unique.bin", b"lonely", 1);

    let groups = scan(dir.path());
    assert_eq!(groups.len(), 2);

    for rule in KeepRule::ALL {
        let report = report_in(&out);
        generate_report(&groups, &report, rule).unwrap();
        assert!(validate_report(&report).is_valid());

        let removed: HashSet<PathBuf> = get_files_to_remove(&load_report(&report).unwrap())
            .into_iter()
            .collect();

        let mut expected = HashSet::new();
        for files in groups.values() {
            let sorted = sort_by_keep_rule(files, rule);
            expected.extend(sorted.iter().skip(1).map(|f| f.path.clone()));
        }
        assert_eq!(removed, expected, "rule {}", rule);
    }
}

#[test]
fn test_entries_carry_group_fingerprint() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    write(dir.path(), "a", b"hello", 1);
    write(dir.path(), "b", b"hello", 1);

    let report = report_in(&out);
    generate_report(&scan(dir.path()), &report, KeepRule::FirstFound).unwrap();

    let entries = load_report(&report).unwrap();
    assert!(entries
        .iter()
        .all(|e| e.fingerprint.as_deref() == Some("5d41402abc4b2a76b9719d911017c592")));
    assert!(entries.iter().all(|e| e.timestamp.len() == "YYYY-MM-DD HH:MM".len()));
}

#[test]
fn test_header_format() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let content = vec![0u8; 1536];
    write(dir.path(), "a", &content, 1);
    write(dir.path(), "b", &content, 1);

    let report = report_in(&out);
    generate_report(&scan(dir.path()), &report, KeepRule::FirstFound).unwrap();

    let text = fs::read_to_string(&report).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("# [md5: "));
    assert!(header.ends_with("] [size: 1.5KB] [2 files]"));
}

#[test]
fn test_two_groups_of_three_give_four_removals() {
    let out = tempdir().unwrap();
    let report = report_in(&out);
    fs::write(
        &report,
        "# [md5: aaa] [size: 1B] [3 files]\n\
         KEEP\t2024-01-01 00:00\t/data/a1\n\
         REMOVE\t2024-01-01 00:00\t/data/a2\n\
         REMOVE\t2024-01-01 00:00\t/data/a3\n\
         \n\
         # [md5: bbb] [size: 1B] [3 files]\n\
         REMOVE\t2024-01-01 00:00\t/data/b1\n\
         KEEP\t2024-01-01 00:00\t/data/b2\n\
         REMOVE\t2024-01-01 00:00\t/data/b3\n",
    )
    .unwrap();

    let to_remove = get_files_to_remove(&load_report(&report).unwrap());
    assert_eq!(to_remove.len(), 4);
    assert!(!to_remove.contains(&PathBuf::from("/data/b2")));
}

#[test]
fn test_edited_report_without_keep_is_rejected() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    write(dir.path(), "a", b"same", 1);
    write(dir.path(), "b", b"same", 2);

    let report = report_in(&out);
    generate_report(&scan(dir.path()), &report, KeepRule::Oldest).unwrap();

    // User flips the KEEP line to REMOVE
    let edited = fs::read_to_string(&report)
        .unwrap()
        .replace("KEEP\t", "REMOVE\t");
    fs::write(&report, edited).unwrap();

    let validation = validate_report(&report);
    assert!(!validation.is_valid());
    assert!(validation.message().contains("md5: "));
    assert!(validation.message().contains("has no KEEP entry"));

    assert!(matches!(
        load_report(&report),
        Err(ReportError::Invalid(ReportIssue::NoKeep { .. }))
    ));
}

#[test]
fn test_validate_reports_line_numbers() {
    let out = tempdir().unwrap();
    let report = report_in(&out);
    fs::write(
        &report,
        "# [md5: aaa] [size: 1B] [2 files]\nKEEP\tt\t/a\nMAYBE\tt\t/b\n",
    )
    .unwrap();

    match validate_report(&report) {
        Validation::Invalid(issue) => {
            assert_eq!(issue.line(), Some(3));
            assert_eq!(issue.to_string(), "Invalid action 'MAYBE' on line 3");
        }
        Validation::Valid => panic!("expected invalid report"),
    }
}

#[test]
fn test_validate_missing_report() {
    let out = tempdir().unwrap();
    let validation = validate_report(&out.path().join("missing.txt"));
    assert!(validation.message().starts_with("File not found"));
}

#[test]
fn test_all_keep_report_has_nothing_to_remove() {
    let out = tempdir().unwrap();
    let report = report_in(&out);
    fs::write(&report, "# [md5: a]\nKEEP\tt\t/a\nKEEP\tt\t/b\n").unwrap();

    assert!(get_files_to_remove(&load_report(&report).unwrap()).is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn test_report_never_names_a_mangled_path() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(dir.path().join(OsStr::from_bytes(b"a\xff.bin")), b"same").unwrap();
    fs::write(dir.path().join(OsStr::from_bytes(b"b\xff.bin")), b"same").unwrap();
    let plain_a = write(dir.path(), "c.bin", b"pair", 1_000);
    let plain_b = write(dir.path(), "d.bin", b"pair", 2_000);

    let groups = scan(dir.path());
    assert_eq!(groups.len(), 2);

    let report = report_in(&out);
    generate_report(&groups, &report, KeepRule::Oldest).unwrap();
    let entries = load_report(&report).unwrap();

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.path.exists()));
    assert_eq!(kept_path(&report), plain_a);
    assert_eq!(get_files_to_remove(&entries), vec![plain_b]);
}
