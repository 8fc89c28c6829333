//! Runna - a static development web server with live reload.
//!
//! Serves a directory over HTTP, appends a reload client to every HTML page
//! and keeps a WebSocket open to each browser so a reload can be pushed to
//! all of them at once. A second invocation of the binary (or any HTTP
//! client) drives a running instance through two control routes:
//! `/+reload` and `/+exit`.
//!
//! # Architecture
//!
//! - [`server`] - the request pipeline: access gate, bundled assets,
//!   control routes, content server
//! - [`reload`] - the reload channel and its client registry
//! - [`listing`] - the HTML file listing shown on the not-found page
//! - [`remote`] - the remote control client
//! - [`config`] - settings merged from file, environment and flags
//! - [`cli`] / [`commands`] - the command-line front end
//! - [`error`] / [`logger`] / [`ui`] - errors, tracing setup, status lines
//!
//! # Example
//!
//! ```rust,no_run
//! use runna::{config::ServerConfig, server::Server};
//!
//! # async fn run() -> Result<(), runna::error::ServerError> {
//! let config = ServerConfig::new("/srv/site").with_port(8080);
//! Server::new(config).bind().await?.serve().await
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod listing;
pub mod logger;
pub mod reload;
pub mod remote;
pub mod server;
pub mod ui;

// Re-export commonly used types
pub use config::{ServerConfig, Settings};
pub use error::{CliError, ConfigError, RemoteError, Result, ResultExt, ServerError};
pub use remote::RemoteClient;
pub use server::{BoundServer, Server, ServerState};
