//! Remote control command: `--reload` and `--exit`.
//!
//! No listener is started; the merged settings only name the instance to
//! contact and the credential to present.

use crate::cli::{Cli, Mode};
use crate::config::Settings;
use crate::error::{Result, ResultExt};
use crate::remote::RemoteClient;

/// Execute a remote control mode.
///
/// `Mode::Serve` is treated as a no-op; [`super::execute`] never passes it.
pub async fn execute(cli: &Cli, mode: Mode) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let settings = Settings::load(&cwd, cli.config.as_deref(), &cli.overrides())?;

    let client = RemoteClient::new(settings.hostname.clone(), settings.port)?
        .with_credential(settings.credential().map(str::to_string));

    match mode {
        Mode::RemoteReload => client.trigger_reload().await?,
        Mode::RemoteExit => client.trigger_exit().await?,
        Mode::Serve => {}
    }

    Ok(())
}
