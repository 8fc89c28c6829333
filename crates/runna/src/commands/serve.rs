//! Serve command: bind both listeners and run until killed or `/+exit`.

use crate::cli::Cli;
use crate::config::{ServerConfig, Settings};
use crate::error::{Result, ResultExt};
use crate::server::Server;
use crate::ui;

/// Execute the serve mode.
///
/// # Process Flow
///
/// 1. Merge settings from defaults, `runna.toml`, `RUNNA_*` and the flags
/// 2. Resolve the served root against the current directory
/// 3. Bind the HTTP and reload listeners
/// 4. Serve until the process ends
///
/// # Errors
///
/// Returns errors for invalid configuration or a served root that is not a
/// directory. A port that cannot be bound is reported and the command
/// returns `Ok`.
pub async fn execute(cli: &Cli) -> Result<()> {
    ui::info(&format!(
        "Runna webserver version {}.",
        env!("CARGO_PKG_VERSION")
    ));

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let settings = Settings::load(&cwd, cli.config.as_deref(), &cli.overrides())?;
    let config = ServerConfig::resolve(settings, &cwd)?;

    let http_host = config.http_host();
    let hostname = config.hostname.clone();
    let root = config.root.clone();
    let port = config.port;
    let guarded = config.credential.is_some();

    let bound = match Server::new(config).bind().await {
        Ok(bound) => bound,
        Err(err) => {
            ui::error(&format!("Unable to start server on port {}.", port));
            tracing::error!("{}", err);
            return Ok(());
        }
    };

    ui::success(&format!(
        "Listening at {} ({})...",
        http_host,
        root.display()
    ));
    if let Some(reload_addr) = bound.reload_addr() {
        ui::info(&format!(
            "Reload channel at ws://{}:{}/",
            hostname,
            reload_addr.port()
        ));
    }
    if guarded {
        ui::info("Basic authentication is required.");
    }

    bound.serve().await?;
    Ok(())
}
