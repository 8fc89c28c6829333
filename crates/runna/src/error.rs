//! Error handling for the Runna CLI and server.
//!
//! The hierarchy mirrors the shape of the program:
//! - **Top-level errors** (`CliError`) are what commands return
//! - **Domain errors** (`ConfigError`, `ServerError`, `RemoteError`) carry
//!   the details for their part of the system
//! - Conversion into `CliError` is automatic via `#[from]`
//!
//! Per-request failures inside the HTTP server never surface here: they are
//! turned into `500` responses by the handlers themselves.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub mod miette;

pub use self::miette::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (bad root, invalid values, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server startup or runtime errors
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Remote control failures
    #[error("Remote control error: {0}")]
    Remote(#[from] RemoteError),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Served root does not exist
    #[error("Served root not found: {}\n\nHint: Pass an existing directory with --root", .0.display())]
    RootNotFound(PathBuf),

    /// Served root exists but is a file
    #[error("Served root is not a directory: {}\n\nHint: Pass a directory with --root", .0.display())]
    RootNotDirectory(PathBuf),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },

    /// I/O error while resolving configuration
    #[error("Failed to resolve configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while starting or running the listeners.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A listener could not be bound
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop terminated with an error
    #[error("Server on {addr} stopped: {source}")]
    Serve {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the remote control client.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request could not be delivered or no response arrived
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The running instance answered with a non-success status
    #[error("{url} answered with status {status}\n\nHint: {hint}")]
    Status {
        url: String,
        status: u16,
        hint: String,
    },

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}
