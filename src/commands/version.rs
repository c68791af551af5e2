//! Command: print version information.
use std::io::Write as _;

/// Version reported by `tuxsync version`.
#[must_use]
pub fn version() -> &'static str {
    option_env!("TUXSYNC_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the tuxsync version to stdout.
///
/// # Errors
///
/// Returns an error if stdout is closed.
pub fn run() -> std::io::Result<()> {
    writeln!(std::io::stdout(), "tuxsync {}", version())
}
