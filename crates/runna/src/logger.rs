//! Logging infrastructure for Runna.
//!
//! Sets up a `tracing` subscriber with verbosity flags, colour detection and
//! `RUST_LOG` overrides.
//!
//! # Example
//!
//! ```rust,no_run
//! use runna::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false);
//! info!("Serving files");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used with `--verbose`: request traces and server internals.
const VERBOSE_FILTER: &str = "runna=debug,tower_http=debug";

/// Filter used with `--quiet`.
const QUIET_FILTER: &str = "runna=error";

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "runna=info";

/// Initialize the tracing subscriber with the specified options.
///
/// Should be called once at program start.
///
/// # Verbosity Levels
///
/// 1. `--verbose` flag: DEBUG for runna and request tracing
/// 2. `--quiet` flag: ERROR only
/// 3. `RUST_LOG` environment variable: custom filter
/// 4. Default: INFO for runna
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = build_filter(verbose, quiet);
    init_logger_with_filter(filter, no_color || !should_use_colors());
}

/// Initialize logger with custom environment filter.
///
/// Uses `try_init` so calling it twice (e.g. from tests) is harmless.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Check if colored output should be enabled.
///
/// - `NO_COLOR`: if set, disables colors
/// - `FORCE_COLOR`: if set, forces colors even in non-TTY
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::Term::stderr().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_verbose_wins_over_quiet() {
        let filter = build_filter(true, true);
        assert!(filter.to_string().to_lowercase().contains("runna=debug"));
    }

    #[test]
    fn test_build_filter_quiet() {
        let filter = build_filter(false, true);
        assert!(filter.to_string().to_lowercase().contains(QUIET_FILTER));
    }

    #[test]
    fn test_init_logger_twice_does_not_panic() {
        init_logger_with_filter(EnvFilter::new(QUIET_FILTER), true);
        init_logger_with_filter(EnvFilter::new(QUIET_FILTER), true);
    }
}
