//! Progress reporting utilities using indicatif.
//!
//! The scanner reports through the [`ProgressCallback`] trait: one
//! `on_progress` call per visited file, whether or not the file is later
//! filtered out. Callbacks run on the scanning thread, so implementations
//! must return quickly.
//!
//! [`Progress`] is the terminal implementation used by the binary.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress callback for scan phases.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ("scan", "verify")
    /// * `total` - Total number of items to process
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called once for each item visited.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &Path);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Terminal progress bar.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} {prefix:>7} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {wide_msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        let bar = if self.quiet {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new(total as u64)
        };
        bar.set_style(Self::style());
        bar.set_prefix(phase.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(old) = slot.replace(bar) {
                old.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, current: usize, path: &Path) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_position(current as u64);
                if let Some(name) = path.file_name() {
                    bar.set_message(name.to_string_lossy().into_owned());
                }
            }
        }
    }

    fn on_phase_end(&self, _phase: &str) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}
