//! Scan configuration and persisted user settings.
//!
//! [`ScanConfig`] describes one scan invocation and is always constructed
//! through [`ScanConfigBuilder`], which rejects contradictory filter options
//! before any scanning can happen.
//!
//! [`Settings`] holds the user's preferred defaults (keep rule, report path,
//! trash vs. permanent delete). They are layered with figment:
//! built-in defaults < `config.toml` < `DUPFINDER_*` environment variables,
//! and the CLI overrides whatever comes out of that.
//!
//! # Example
//!
//! ```
//! use dupfinder::config::{ScanConfig, SizeUnit};
//!
//! let config = ScanConfig::builder("/data/photos")
//!     .only_extensions(["jpg", ".PNG"])
//!     .min_size(4.0, SizeUnit::KB)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.only_extensions(), Some(&[".jpg".to_string(), ".png".to_string()][..]));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::KeepRule;

/// Default file name of the generated report.
pub const DEFAULT_REPORT_PATH: &str = "duplicate_report.txt";

/// Prefix for environment variables that override [`Settings`].
pub const ENV_PREFIX: &str = "DUPFINDER_";

/// Errors raised while building a [`ScanConfig`] or loading [`Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Both extension filters were supplied.
    #[error("ignore_extensions and only_extensions are mutually exclusive")]
    ConflictingExtensionFilters,

    /// A size bound was negative, NaN or infinite.
    #[error("invalid {bound} size: {value}")]
    InvalidSize {
        /// Which bound was rejected ("min" or "max")
        bound: &'static str,
        /// The offending value
        value: f64,
    },

    /// The minimum size is larger than the maximum size.
    #[error("min size ({min} bytes) is larger than max size ({max} bytes)")]
    EmptySizeRange {
        /// Minimum in bytes
        min: u64,
        /// Maximum in bytes
        max: u64,
    },

    /// An unrecognised size unit string.
    #[error("unknown size unit '{0}' (expected KB, MB or GB)")]
    UnknownUnit(String),

    /// The settings file or environment could not be parsed.
    #[error("failed to load settings: {0}")]
    Settings(#[from] Box<figment::Error>),
}

/// Unit for a size bound. All units are 1024-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeUnit {
    /// 1024 bytes
    KB,
    /// 1024² bytes
    MB,
    /// 1024³ bytes
    GB,
}

impl SizeUnit {
    /// Number of bytes in one unit.
    #[must_use]
    pub fn multiplier(self) -> u64 {
        match self {
            Self::KB => 1024,
            Self::MB => 1024 * 1024,
            Self::GB => 1024 * 1024 * 1024,
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KB => write!(f, "KB"),
            Self::MB => write!(f, "MB"),
            Self::GB => write!(f, "GB"),
        }
    }
}

impl FromStr for SizeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KB" => Ok(Self::KB),
            "MB" => Ok(Self::MB),
            "GB" => Ok(Self::GB),
            _ => Err(ConfigError::UnknownUnit(s.to_string())),
        }
    }
}

/// A size threshold expressed as a value and a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBound {
    /// Numeric value, may be fractional (e.g. 1.5 MB)
    pub value: f64,
    /// Unit of `value`
    pub unit: SizeUnit,
}

impl SizeBound {
    /// Create a new size bound.
    #[must_use]
    pub fn new(value: f64, unit: SizeUnit) -> Self {
        Self { value, unit }
    }

    /// Threshold in bytes, truncating any fractional byte.
    #[must_use]
    pub fn to_bytes(self) -> u64 {
        (self.value * self.unit.multiplier() as f64) as u64
    }

    fn validate(self, bound: &'static str) -> Result<Self, ConfigError> {
        if self.value.is_finite() && self.value >= 0.0 {
            Ok(self)
        } else {
            Err(ConfigError::InvalidSize {
                bound,
                value: self.value,
            })
        }
    }
}

/// Convert a size value with a unit to bytes.
#[must_use]
pub fn size_to_bytes(value: f64, unit: SizeUnit) -> u64 {
    SizeBound::new(value, unit).to_bytes()
}

/// Configuration for a single duplicate scan.
///
/// Fields are read through accessors; the only way to construct one is
/// [`ScanConfig::builder`] (or [`ScanConfig::new`] for an unfiltered scan),
/// so an instance always satisfies the filter invariants.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    root_dir: PathBuf,
    resume: bool,
    report_path: PathBuf,
    ignore_extensions: Option<Vec<String>>,
    only_extensions: Option<Vec<String>>,
    min_size: Option<SizeBound>,
    max_size: Option<SizeBound>,
    skip_hidden: bool,
    verify: bool,
}

impl ScanConfig {
    /// An unfiltered, non-resuming scan of `root_dir`.
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            resume: false,
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            ignore_extensions: None,
            only_extensions: None,
            min_size: None,
            max_size: None,
            skip_hidden: false,
            verify: false,
        }
    }

    /// Start building a configuration for `root_dir`.
    #[must_use]
    pub fn builder(root_dir: impl Into<PathBuf>) -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::new(root_dir),
        }
    }

    /// Directory to scan.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Whether to reuse the checkpoint of a previous scan.
    #[must_use]
    pub fn resume(&self) -> bool {
        self.resume
    }

    /// Where the report should be written.
    #[must_use]
    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// Normalised extensions to skip (lowercase, leading dot).
    #[must_use]
    pub fn ignore_extensions(&self) -> Option<&[String]> {
        self.ignore_extensions.as_deref()
    }

    /// Normalised extensions to scan exclusively (lowercase, leading dot).
    #[must_use]
    pub fn only_extensions(&self) -> Option<&[String]> {
        self.only_extensions.as_deref()
    }

    /// Lower size bound, if any.
    #[must_use]
    pub fn min_size(&self) -> Option<SizeBound> {
        self.min_size
    }

    /// Upper size bound, if any.
    #[must_use]
    pub fn max_size(&self) -> Option<SizeBound> {
        self.max_size
    }

    /// Skip files and directories whose name starts with `.`.
    #[must_use]
    pub fn skip_hidden(&self) -> bool {
        self.skip_hidden
    }

    /// Confirm fingerprint groups with a byte-for-byte comparison.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.verify
    }
}

/// Builder for [`ScanConfig`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Resume from the checkpoint of a previous scan.
    #[must_use]
    pub fn resume(mut self, resume: bool) -> Self {
        self.config.resume = resume;
        self
    }

    /// Set the report output path.
    #[must_use]
    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.report_path = path.into();
        self
    }

    /// Skip files with any of these extensions.
    #[must_use]
    pub fn ignore_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.ignore_extensions = Some(normalize_extensions(extensions));
        self
    }

    /// Only scan files with one of these extensions.
    #[must_use]
    pub fn only_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.only_extensions = Some(normalize_extensions(extensions));
        self
    }

    /// Skip files smaller than `value` `unit`s.
    #[must_use]
    pub fn min_size(mut self, value: f64, unit: SizeUnit) -> Self {
        self.config.min_size = Some(SizeBound::new(value, unit));
        self
    }

    /// Skip files larger than `value` `unit`s.
    #[must_use]
    pub fn max_size(mut self, value: f64, unit: SizeUnit) -> Self {
        self.config.max_size = Some(SizeBound::new(value, unit));
        self
    }

    /// Skip hidden files and directories.
    #[must_use]
    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.config.skip_hidden = skip;
        self
    }

    /// Enable the byte-for-byte verification pass.
    #[must_use]
    pub fn verify(mut self, verify: bool) -> Self {
        self.config.verify = verify;
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ConflictingExtensionFilters`] if both extension lists are set
    /// - [`ConfigError::InvalidSize`] for a negative or non-finite bound
    /// - [`ConfigError::EmptySizeRange`] if min exceeds max
    pub fn build(self) -> Result<ScanConfig, ConfigError> {
        let config = self.config;

        if config.ignore_extensions.is_some() && config.only_extensions.is_some() {
            return Err(ConfigError::ConflictingExtensionFilters);
        }

        let min = config.min_size.map(|b| b.validate("min")).transpose()?;
        let max = config.max_size.map(|b| b.validate("max")).transpose()?;

        if let (Some(min), Some(max)) = (min, max) {
            let (min, max) = (min.to_bytes(), max.to_bytes());
            if min > max {
                return Err(ConfigError::EmptySizeRange { min, max });
            }
        }

        Ok(config)
    }
}

/// Lowercase each extension and ensure it carries a leading dot.
fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|e| {
            let e = e.as_ref().trim().to_lowercase();
            if e.starts_with('.') {
                e
            } else {
                format!(".{e}")
            }
        })
        .collect()
}

/// User defaults persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rule used to pick the KEEP file in each group.
    pub keep_rule: KeepRule,
    /// Report output path.
    pub report_path: PathBuf,
    /// Move removed files to the trash instead of deleting them.
    pub use_trash: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keep_rule: KeepRule::FirstFound,
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            use_trash: true,
            skip_hidden: false,
        }
    }
}

impl Settings {
    /// Load settings from the platform config file and the environment.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] if the file or environment fails to parse.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::debug!("No config directory available, using defaults");
                Self::figment(None).extract().map_err(|e| Box::new(e).into())
            }
        }
    }

    /// Load settings from an explicit file path (plus environment).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] if the file or environment fails to parse.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings: Self = Self::figment(Some(path))
            .extract()
            .map_err(Box::new)?;
        log::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Default platform-specific settings path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupfinder", "dupfinder")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
