//! Miette diagnostic conversion for CLI errors.

use crate::error::{CliError, RemoteError};
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        CliError::Remote(e) => remote_error_to_miette(e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert RemoteError to miette Report
pub fn remote_error_to_miette(err: RemoteError) -> Report {
    match err {
        RemoteError::Request { url, source } if source.is_connect() => {
            miette::miette!(
                "Could not connect to {}: {}\n\nHint: Start a server first with `runna` or check --hostname/--port",
                url,
                source
            )
        }
        _ => miette::miette!("{}", err),
    }
}
