//! Development server with live reload.
//!
//! Two listeners per instance:
//! - the HTTP port, where every request passes the access gate and is then
//!   routed to the bundled assets, the control endpoints, or the content
//!   server, in that order
//! - the reload port (HTTP port + 1 by default), where each browser page
//!   keeps a WebSocket open to receive `reload`

pub mod assets;
pub mod auth;
pub mod content;
pub mod control;
pub mod state;

pub use state::{ExitHook, ServerState, SharedState};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::reload::reload_socket_handler;
use crate::ui;
use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// A configured, not yet listening, server instance.
#[derive(Debug, Clone)]
pub struct Server {
    state: SharedState,
}

impl Server {
    /// Create a server for `config` whose exit route ends the process.
    pub fn new(config: ServerConfig) -> Self {
        Self::from_state(ServerState::new(config))
    }

    /// Create a server around prepared state (e.g. with a custom exit hook).
    pub fn from_state(state: ServerState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Shared state of this instance.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Router of the HTTP port.
    ///
    /// Route order: access gate, `/__static/*`, `/+reload`, `/+exit`, then
    /// the content server as fallback.
    pub fn router(&self) -> Router {
        let static_route = format!("/{}/{{*path}}", assets::STATIC_FRAGMENT);

        Router::new()
            .route(&static_route, get(assets::serve_static_asset))
            .route(control::RELOAD_ROUTE, any(control::trigger_reload))
            .route(control::EXIT_ROUTE, any(control::trigger_exit))
            .fallback(content::serve_content)
            .layer(middleware::from_fn_with_state(
                self.state(),
                auth::authorize,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state())
    }

    /// Router of the reload port: every path upgrades to a reload socket.
    pub fn reload_router(&self) -> Router {
        Router::new()
            .fallback(reload_socket_handler)
            .with_state(self.state())
    }

    /// Bind both listeners.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP port cannot be bound. A reload port that cannot be
    /// bound is logged and the instance runs without live reload.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let config = self.state.config();

        let http = bind_listener(&config.hostname, config.port).await?;

        let reload = match bind_listener(&config.hostname, config.reload_port).await {
            Ok(listener) => {
                if let Ok(addr) = listener.local_addr() {
                    self.state.set_reload_port(addr.port());
                }
                Some(listener)
            }
            Err(err) => {
                ui::warning(&format!(
                    "Unable to start reload channel on port {}. Live reload is disabled.",
                    config.reload_port
                ));
                tracing::warn!("{}", err);
                None
            }
        };

        Ok(BoundServer {
            server: self,
            http,
            reload,
        })
    }
}

/// A server whose listeners are bound.
#[derive(Debug)]
pub struct BoundServer {
    server: Server,
    http: TcpListener,
    reload: Option<TcpListener>,
}

impl BoundServer {
    /// Address of the HTTP listener.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.http.local_addr()
    }

    /// Address of the reload listener, if it could be bound.
    pub fn reload_addr(&self) -> Option<SocketAddr> {
        self.reload
            .as_ref()
            .and_then(|listener| listener.local_addr().ok())
    }

    /// Shared state of this instance.
    pub fn state(&self) -> SharedState {
        self.server.state()
    }

    /// Accept connections on both listeners until the process ends.
    ///
    /// The reload listener runs on its own task; its failure is logged and
    /// does not stop the HTTP listener.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = self.local_addr().map_err(|source| ServerError::Bind {
            addr: self.server.state.config().http_host(),
            source,
        })?;

        if let Some(reload) = self.reload {
            let reload_router = self.server.reload_router();
            tokio::spawn(async move {
                if let Err(err) = axum::serve(reload, reload_router).await {
                    tracing::error!("Reload channel stopped: {}", err);
                }
            });
        }

        axum::serve(self.http, self.server.router())
            .await
            .map_err(|source| ServerError::Serve { addr, source })
    }
}

async fn bind_listener(hostname: &str, port: u16) -> Result<TcpListener, ServerError> {
    TcpListener::bind((hostname, port))
        .await
        .map_err(|source| ServerError::Bind {
            addr: format!("{}:{}", hostname, port),
            source,
        })
}
