//! Terminal status lines for the server and the remote control modes.
//!
//! Operator-facing notices ("Listening at ...", "Reloading.") go through
//! these helpers; diagnostic detail goes through `tracing`.

mod messages;

pub use messages::{error, info, success, warning};

use std::sync::atomic::{AtomicBool, Ordering};

static COLORS: AtomicBool = AtomicBool::new(true);
static QUIET: AtomicBool = AtomicBool::new(false);

/// Decide once whether status lines are coloured.
///
/// `--no-color` wins; otherwise `NO_COLOR`, `FORCE_COLOR` and the stderr
/// terminal decide, as for log output.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && crate::logger::should_use_colors();
    COLORS.store(enabled, Ordering::Relaxed);
}

/// Whether status lines are currently coloured.
pub fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}

/// Silence every status line except errors (`--quiet`).
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub(crate) fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}
