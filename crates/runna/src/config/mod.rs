//! Configuration system for the Runna server.
//!
//! Merges settings from CLI args, environment variables, and an optional
//! `runna.toml`. Priority: CLI > Environment > File > Defaults.
//!
//! [`Settings`] is the raw merged view (what the remote control modes
//! need); [`ServerConfig`] is the validated, immutable configuration a
//! serving instance runs with.

mod defaults;
mod loading;

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use defaults::*;
pub use loading::SettingsOverrides;

/// Raw settings as read from every configuration source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Settings {
    /// Hostname to bind (serve mode) or contact (remote modes)
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Primary HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Served root, relative to the process current directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Shared-secret credential in `username:password` form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,

    /// Reload channel port override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reload_port: Option<u16>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
            root: None,
            auth: None,
            reload_port: None,
        }
    }
}

impl Settings {
    /// The configured credential, with an empty string meaning "no auth".
    pub fn credential(&self) -> Option<&str> {
        self.auth.as_deref().filter(|auth| !auth.is_empty())
    }
}

/// Validated configuration of a serving instance.
///
/// Created once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Hostname both listeners bind to
    pub hostname: String,

    /// Primary HTTP port
    pub port: u16,

    /// Absolute path of the served root
    pub root: PathBuf,

    /// Credential required by the access gate, if any
    pub credential: Option<String>,

    /// Port of the reload channel
    pub reload_port: u16,
}

impl ServerConfig {
    /// Create a configuration for `root` with default host and ports.
    ///
    /// The root is used as given; callers are expected to pass the
    /// canonical path of an existing directory, since served files must
    /// canonicalize to a path below it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let port = default_port();
        Self {
            hostname: default_hostname(),
            port,
            root: root.into(),
            credential: None,
            reload_port: default_reload_port(port),
        }
    }

    /// Set the hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the primary port; the reload port follows it.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self.reload_port = default_reload_port(port);
        self
    }

    /// Set an explicit reload channel port.
    pub fn with_reload_port(mut self, port: u16) -> Self {
        self.reload_port = port;
        self
    }

    /// Require `credential` on every request. An empty string disables auth.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        let credential = credential.into();
        self.credential = (!credential.is_empty()).then_some(credential);
        self
    }

    /// Validate raw settings and resolve the served root against `cwd`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root does not exist, is not a directory, or
    /// the reload port cannot be derived from the primary port.
    pub fn resolve(settings: Settings, cwd: &Path) -> Result<Self> {
        let root = resolve_root(settings.root.as_deref(), cwd)?;

        let reload_port = match settings.reload_port {
            Some(port) => port,
            None if settings.port == u16::MAX => {
                return Err(ConfigError::InvalidValue {
                    field: "port".to_string(),
                    value: settings.port.to_string(),
                    hint: "The reload channel uses port + 1; choose a lower port or set --reload-port"
                        .to_string(),
                }
                .into());
            }
            None => default_reload_port(settings.port),
        };

        Ok(Self {
            credential: settings.credential().map(str::to_string),
            hostname: settings.hostname,
            port: settings.port,
            root,
            reload_port,
        })
    }

    /// `hostname:port` of the primary listener.
    pub fn http_host(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

fn resolve_root(root: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    let candidate = match root {
        Some(root) => cwd.join(root),
        None => cwd.to_path_buf(),
    };

    if !candidate.exists() {
        return Err(ConfigError::RootNotFound(candidate).into());
    }
    if !candidate.is_dir() {
        return Err(ConfigError::RootNotDirectory(candidate).into());
    }

    Ok(candidate.canonicalize().map_err(ConfigError::Io)?)
}
