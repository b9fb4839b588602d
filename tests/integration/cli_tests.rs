use clap::Parser;
use dupfinder::checkpoint;
use dupfinder::cli::Cli;
use dupfinder::error::ExitCode;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["dupfinder", "-q"];
    argv.extend_from_slice(args);
    dupfinder::run_app(Cli::try_parse_from(argv).unwrap())
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_exit_code_no_duplicates() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(dir.path().join("unique.txt"), b"unique").unwrap();
    let report = out.path().join("r.txt");

    let code = run(&[
        "scan",
        path_str(dir.path()),
        "--no-progress",
        "--report",
        path_str(&report),
    ])
    .unwrap();

    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(!report.exists());
}

#[test]
fn test_scan_check_apply() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir.path().join("b.txt"), b"dup").unwrap();
    let report = out.path().join("r.txt");

    let code = run(&[
        "scan",
        path_str(dir.path()),
        "--no-progress",
        "--keep",
        "first-found",
        "--report",
        path_str(&report),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(report.exists());

    assert_eq!(run(&["check", path_str(&report)]).unwrap(), ExitCode::Success);

    let code = run(&["apply", path_str(&report), "--permanent", "-y"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
}

#[test]
fn test_resume_flag_reuses_checkpoint() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir.path().join("b.txt"), b"dup").unwrap();
    let report = out.path().join("r.txt");
    let scan = |extra: &str| {
        run(&[
            "scan",
            path_str(dir.path()),
            "--no-progress",
            "--report",
            path_str(&report),
            extra,
        ])
    };

    assert_eq!(scan("--fresh").unwrap(), ExitCode::Success);
    assert!(checkpoint::db_path(dir.path()).exists());
    assert_eq!(scan("--resume").unwrap(), ExitCode::Success);
}

#[test]
fn test_check_invalid_report() {
    let out = tempdir().unwrap();
    let report = out.path().join("r.txt");
    fs::write(&report, "# [md5: aa]\nREMOVE\tt\t/a\nREMOVE\tt\t/b\n").unwrap();

    assert_eq!(
        run(&["check", path_str(&report)]).unwrap(),
        ExitCode::InvalidReport
    );
}

#[test]
fn test_apply_invalid_report_is_error() {
    let dir = tempdir().unwrap();
    let victim = dir.path().join("victim.txt");
    fs::write(&victim, b"x").unwrap();
    let report = dir.path().join("r.txt");
    fs::write(
        &report,
        format!("# [md5: aa]\nREMOVE\tt\t{}\n", victim.display()),
    )
    .unwrap();

    let err = run(&["apply", path_str(&report), "--permanent", "-y"]).unwrap_err();

    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidReport);
    assert!(victim.exists());
}

#[test]
fn test_apply_all_keep_is_noop() {
    let out = tempdir().unwrap();
    let report = out.path().join("r.txt");
    fs::write(&report, "# [md5: aa]\nKEEP\tt\t/nonexistent/a\n").unwrap();

    assert_eq!(
        run(&["apply", path_str(&report), "--permanent", "-y"]).unwrap(),
        ExitCode::Success
    );
}

#[test]
fn test_invalid_path_is_error() {
    let result = run(&[
        "scan",
        "/non/existent/path/that/really/should/not/exist",
        "--no-progress",
    ]);
    let err = result.unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_inverted_size_range_is_error() {
    let dir = tempdir().unwrap();
    let result = run(&[
        "scan",
        path_str(dir.path()),
        "--min-size",
        "2",
        "--min-unit",
        "mb",
        "--max-size",
        "1",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_clear_removes_checkpoint() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"x").unwrap();
    run(&[
        "scan",
        path_str(dir.path()),
        "--no-progress",
        "--report",
        path_str(&out.path().join("r.txt")),
    ])
    .unwrap();
    assert!(checkpoint::db_path(dir.path()).exists());

    assert_eq!(run(&["clear", path_str(dir.path())]).unwrap(), ExitCode::Success);
    assert!(!checkpoint::db_path(dir.path()).exists());
}

#[test]
fn test_clear_lock_only_keeps_progress() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"x").unwrap();
    run(&[
        "scan",
        path_str(dir.path()),
        "--no-progress",
        "--report",
        path_str(&out.path().join("r.txt")),
    ])
    .unwrap();
    let lock = dir.path().join(checkpoint::LOCK_FILENAME);
    fs::write(&lock, b"unreadable").unwrap();

    assert_eq!(
        run(&["clear", path_str(dir.path()), "--lock-only"]).unwrap(),
        ExitCode::Success
    );
    assert!(!lock.exists());
    assert!(checkpoint::db_path(dir.path()).exists());
}
