/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "runna.toml";

/// Prefix of the environment variables read into [`Settings`](super::Settings).
pub const ENV_PREFIX: &str = "RUNNA_";

pub fn default_hostname() -> String {
    "localhost".to_string()
}

pub fn default_port() -> u16 {
    8000
}

/// The reload channel sits right next to the primary port.
///
/// Port `0` stays `0` so both listeners can bind ephemeral ports.
pub fn default_reload_port(port: u16) -> u16 {
    if port == 0 { 0 } else { port.saturating_add(1) }
}
