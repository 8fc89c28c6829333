//! Command implementations for the Runna CLI.
//!
//! - [`serve`] - start the development server
//! - [`remote`] - drive a running instance (`--reload` / `--exit`)
//!
//! [`execute`] picks one from the parsed flags.

pub mod remote;
pub mod serve;

use crate::cli::{Cli, Mode};
use crate::error::Result;

pub use remote::execute as remote_execute;
pub use serve::execute as serve_execute;

/// Run the mode selected by `cli`.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.mode() {
        Mode::Serve => serve_execute(&cli).await,
        mode @ (Mode::RemoteReload | Mode::RemoteExit) => remote_execute(&cli, mode).await,
    }
}
