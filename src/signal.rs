//! Ctrl+C handling for pausing a scan.
//!
//! A scan polls a shared `AtomicBool` between files. The first Ctrl+C sets
//! it; the scanner then stops at the next file boundary and returns
//! [`FinderError::Interrupted`](crate::scanner::FinderError::Interrupted)
//! with every completed file already in the checkpoint store. A second
//! Ctrl+C removes any held scan lock and exits immediately with
//! [`EXIT_CODE_INTERRUPTED`].
//!
//! ```rust,no_run
//! use dupfinder::signal::install_handler;
//! use dupfinder::scanner::Scanner;
//! use dupfinder::config::ScanConfig;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let scanner = Scanner::new(ScanConfig::new("/data"))
//!     .with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption: 128 + SIGINT.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared pause flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a pause without a signal.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag, for [`Scanner::with_shutdown_flag`](crate::scanner::Scanner::with_shutdown_flag).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag so the handler can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler, or return the installed one.
///
/// The returned handler is reset, so a driver running several commands in
/// one process starts each with a clear flag. If another component already
/// owns the signal hook, an unhooked handler is returned that still honours
/// [`ShutdownHandler::request_shutdown`].
///
/// # Errors
///
/// Currently always succeeds; the `Result` leaves room for platforms where
/// installation failure should be fatal.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();
    let presses = AtomicUsize::new(0);

    let installed = ctrlc::set_handler(move || {
        if presses.fetch_add(1, Ordering::SeqCst) > 0 {
            crate::checkpoint::release_held();
            let _ = writeln!(std::io::stderr(), "\nAborted.");
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(
            std::io::stderr(),
            "\nInterrupted. Saving progress (press Ctrl+C again to abort)..."
        );
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    if let Err(e) = installed {
        log::debug!("Ctrl+C handler not installed ({}), using unhooked handler", e);
    }

    let handler = GLOBAL_HANDLER.get_or_init(|| handler).clone();
    handler.reset();
    Ok(handler)
}
