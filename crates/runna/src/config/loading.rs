use crate::config::{Settings, CONFIG_FILE_NAME, ENV_PREFIX};
use crate::error::{CliError, ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Keys read from `RUNNA_*` variables; anything else under the prefix is ignored.
const ENV_KEYS: [&str; 5] = ["hostname", "port", "root", "auth", "reload_port"];

/// Values given explicitly on the command line.
///
/// Only fields that are `Some` take part in the merge, so an absent flag
/// never masks a value from the environment or the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_port: Option<u16>,
}

impl Settings {
    /// Load settings from every source.
    /// Priority: CLI overrides > environment variables > config file > defaults
    ///
    /// `config_path` names an explicit file (which must exist); otherwise
    /// `runna.toml` in `cwd` is used when present.
    pub fn load(
        cwd: &Path,
        config_path: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<Self> {
        let figment = Self::figment(cwd, config_path)?
            .merge(Env::prefixed(ENV_PREFIX).only(&ENV_KEYS))
            .merge(Serialized::defaults(overrides));

        Self::extract(figment)
    }

    /// Same as [`Settings::load`] without reading the environment.
    pub fn load_without_env(
        cwd: &Path,
        config_path: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<Self> {
        let figment = Self::figment(cwd, config_path)?.merge(Serialized::defaults(overrides));
        Self::extract(figment)
    }

    fn figment(cwd: &Path, config_path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

        let config_file = match config_path {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    return Err(CliError::FileNotFound(path));
                }
                Some(path)
            }
            None => {
                let default_path = cwd.join(CONFIG_FILE_NAME);
                default_path.is_file().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            tracing::debug!("Loading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        figment.extract().map_err(|e| {
            ConfigError::InvalidValue {
                field: "configuration".to_string(),
                value: e.to_string(),
                hint: format!(
                    "Check {} syntax and {}* environment variables",
                    CONFIG_FILE_NAME, ENV_PREFIX
                ),
            }
            .into()
        })
    }
}
