//! Per-instance server context shared by every handler.

use crate::config::ServerConfig;
use crate::reload::ReloadChannel;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// Callback run by the exit route.
pub type ExitHook = Arc<dyn Fn() + Send + Sync>;

/// Everything a handler may touch: the immutable configuration, the reload
/// channel registry, and the shutdown operation.
///
/// Each [`Server`](super::Server) owns one, so several instances can run in
/// one process without sharing clients.
pub struct ServerState {
    config: ServerConfig,
    reload: Arc<ReloadChannel>,
    reload_port: AtomicU16,
    exit_hook: ExitHook,
}

impl ServerState {
    /// Create state for `config`; the exit route terminates the process.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            reload_port: AtomicU16::new(config.reload_port),
            config,
            reload: Arc::new(ReloadChannel::new()),
            exit_hook: Arc::new(|| std::process::exit(0)),
        }
    }

    /// Replace what the exit route does.
    pub fn with_exit_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.exit_hook = Arc::new(hook);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn reload_channel(&self) -> Arc<ReloadChannel> {
        Arc::clone(&self.reload)
    }

    /// Port browsers connect to for reload notifications.
    ///
    /// Starts as the configured port and is replaced by the bound port once
    /// the reload listener is up, which differs when the configured port is
    /// `0`.
    pub fn reload_port(&self) -> u16 {
        self.reload_port.load(Ordering::Relaxed)
    }

    pub(crate) fn set_reload_port(&self, port: u16) {
        self.reload_port.store(port, Ordering::Relaxed);
    }

    /// Run the exit hook. With the default hook this never returns and
    /// in-flight requests are not drained.
    pub fn request_exit(&self) {
        (self.exit_hook)();
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("reload_port", &self.reload_port())
            .field("clients", &self.reload.client_count())
            .finish_non_exhaustive()
    }
}

/// Shared state handle passed to handlers.
pub type SharedState = Arc<ServerState>;
