//! Log initialisation.
//!
//! Levels are chosen by, in priority order:
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `-v`/`-vv` (debug/trace)
//! 3. Default: info
//!
//! Debug builds prefix each line with a timestamp (and the module path once
//! `-v` is given); release builds print only level and message.

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialise the `env_logger` backend.
///
/// Safe to call more than once; later calls are ignored with a debug note,
/// which lets integration tests drive [`run_app`](crate::run_app) repeatedly.
pub fn init_logging(verbose: u8, quiet: bool) {
    let use_env = env::var("RUST_LOG").is_ok();
    let level = determine_level(verbose, quiet);

    let mut builder = Builder::new();
    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level);
    }
    configure_format(&mut builder, verbose);

    match builder.try_init() {
        Ok(()) if use_env => log::debug!("Logging initialized from RUST_LOG"),
        Ok(()) => log::debug!("Logging initialized at level: {:?}", level),
        Err(_) => log::debug!("Logger already initialized"),
    }
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}
