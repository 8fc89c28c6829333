//! Command-line interface definition for Runna.
//!
//! A single flat command with three modes:
//!
//! - `runna` - serve the current (or `--root`) directory
//! - `runna --reload` - ask a running instance to reload its browsers
//! - `runna --exit` - ask a running instance to shut down
//!
//! `-h` selects the hostname, so clap's automatic `-h` help flag is
//! replaced by a long-only `--help`.


use crate::config::SettingsOverrides;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Runna - a development web server with live reload
#[derive(Parser, Debug)]
#[command(
    name = "runna",
    version,
    about = "A development web server with live reload",
    long_about = "Runna serves a directory over HTTP, injects a live-reload client into every\n\
                  HTML page and lets other tools trigger a browser reload (--reload) or shut\n\
                  the server down (--exit) over the network.",
    disable_help_flag = true
)]
pub struct Cli {
    /// Hostname to bind, or to contact with --reload/--exit [default: localhost]
    #[arg(short = 'h', long, value_name = "HOST")]
    pub hostname: Option<String>,

    /// HTTP port; the reload channel listens on the next port [default: 8000]
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Directory to serve, relative to the current directory [default: .]
    #[arg(short = 'w', long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Require HTTP Basic credentials, given as username:password
    #[arg(short = 'a', long, value_name = "USER:PASS")]
    pub auth: Option<String>,

    /// Port of the reload channel [default: PORT + 1]
    #[arg(long, value_name = "PORT")]
    pub reload_port: Option<u16>,

    /// Trigger a reload in every browser connected to a running instance
    #[arg(short = 'r', long)]
    pub reload: bool,

    /// Shut down a running instance
    #[arg(short = 'x', long, conflicts_with = "reload")]
    pub exit: bool,

    /// Configuration file [default: ./runna.toml when present]
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level, including request traces)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

/// What the invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Start both listeners
    Serve,
    /// Contact a running instance and trigger `/+reload`
    RemoteReload,
    /// Contact a running instance and trigger `/+exit`
    RemoteExit,
}

impl Cli {
    /// The mode selected by the flags.
    pub fn mode(&self) -> Mode {
        if self.reload {
            Mode::RemoteReload
        } else if self.exit {
            Mode::RemoteExit
        } else {
            Mode::Serve
        }
    }

    /// Settings given explicitly on the command line.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            hostname: self.hostname.clone(),
            port: self.port,
            root: self.root.clone(),
            auth: self.auth.clone(),
            reload_port: self.reload_port,
        }
    }
}
