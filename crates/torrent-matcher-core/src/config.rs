use config::{Config, ConfigError, Environment, File as ConfigFile};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub require_same_extension: bool,
    pub request_timeout_secs: u64,
    pub ignore_patterns: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            require_same_extension: true,
            request_timeout_secs: 30,
            ignore_patterns: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Connection fields persisted by `save_configuration`.
#[derive(Debug, Clone, Serialize)]
pub struct SavedConnection<'a> {
    pub url: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Per-user config file location, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "torrent-matcher")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Layers, lowest priority first: defaults, per-user file, `./Config.toml`,
/// then `QBT_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = user_config_path() {
        builder = builder.add_source(ConfigFile::from(path).required(false));
    }

    let config = builder
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("QBT"))
        .build()?;
    config.try_deserialize::<AppConfig>()
}

/// Writes connection settings to the per-user config file and returns its path.
pub fn save_configuration(config: &AppConfig) -> Result<PathBuf, Error> {
    let path = user_config_path()
        .ok_or_else(|| Error::Other("no user config directory on this platform".to_string()))?;
    save_configuration_to(config, &path)?;
    Ok(path)
}

pub fn save_configuration_to(config: &AppConfig, path: &std::path::Path) -> Result<(), Error> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let saved = SavedConnection {
        url: &config.url,
        username: &config.username,
        password: &config.password,
    };
    let content = toml::to_string_pretty(&saved)?;

    let temp_path = path.with_extension("toml.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Reads a single TOML file on top of the defaults, skipping the usual layers.
pub fn load_configuration_from(path: &std::path::Path) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(ConfigFile::from(path.to_path_buf()))
        .build()?
        .try_deserialize::<AppConfig>()
}
