use dupfinder::config::{size_to_bytes, ConfigError, ScanConfig, Settings, SizeUnit};
use dupfinder::report::KeepRule;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_conflicting_extension_filters_fail_at_build() {
    let result = ScanConfig::builder("/data")
        .ignore_extensions(["tmp"])
        .only_extensions(["pdf"])
        .build();
    assert!(matches!(result, Err(ConfigError::ConflictingExtensionFilters)));
}

#[test]
fn test_extensions_are_normalised() {
    let config = ScanConfig::builder("/data")
        .only_extensions(["PDF", ".Jpg"])
        .build()
        .unwrap();
    assert_eq!(
        config.only_extensions(),
        Some(&[".pdf".to_string(), ".jpg".to_string()][..])
    );
    assert_eq!(config.ignore_extensions(), None);
}

#[test]
fn test_size_bounds_validated() {
    let negative = ScanConfig::builder("/data")
        .min_size(-1.0, SizeUnit::KB)
        .build();
    assert!(matches!(negative, Err(ConfigError::InvalidSize { .. })));

    let inverted = ScanConfig::builder("/data")
        .min_size(2.0, SizeUnit::MB)
        .max_size(1.0, SizeUnit::MB)
        .build();
    assert!(matches!(inverted, Err(ConfigError::EmptySizeRange { .. })));

    let mixed_units = ScanConfig::builder("/data")
        .min_size(512.0, SizeUnit::KB)
        .max_size(1.0, SizeUnit::MB)
        .build();
    assert!(mixed_units.is_ok());
}

#[test]
fn test_size_conversion() {
    assert_eq!(size_to_bytes(1.0, SizeUnit::KB), 1024);
    assert_eq!(size_to_bytes(1.5, SizeUnit::MB), 1_572_864);
    assert_eq!(size_to_bytes(2.0, SizeUnit::GB), 2 * 1024 * 1024 * 1024);
}

#[test]
fn test_defaults() {
    let config = ScanConfig::new("/data");
    assert!(!config.resume());
    assert!(!config.verify());
    assert_eq!(config.report_path(), PathBuf::from("duplicate_report.txt"));
    assert!(config.min_size().is_none());
    assert!(config.max_size().is_none());
}

#[test]
fn test_settings_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "keep_rule = \"oldest\"\nuse_trash = false\nreport_path = \"/tmp/r.txt\"\n",
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.keep_rule, KeepRule::Oldest);
    assert!(!settings.use_trash);
    assert_eq!(settings.report_path, PathBuf::from("/tmp/r.txt"));
    assert!(!settings.skip_hidden);
}

#[test]
fn test_settings_missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let settings = Settings::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_settings_malformed_file_is_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "keep_rule = \"largest\"\n").unwrap();

    assert!(matches!(
        Settings::load_from(&path),
        Err(ConfigError::Settings(_))
    ));
}
