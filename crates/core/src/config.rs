//! Application configuration.
//!
//! Values are layered with the `config` crate: built-in defaults, then
//! `<config_dir>/tablebank/config.toml`, then `TABLEBANK_*` environment
//! variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::ConfigError, models::DEFAULT_STARTING_BALANCE};

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = "tablebank";
/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Prefix for environment overrides (`TABLEBANK_STARTING_BALANCE`, ...).
pub const ENV_PREFIX: &str = "TABLEBANK";

const DEFAULT_CONFIG: &str = r#"# tablebank configuration

# Balance every new player starts with.
starting_balance = 1500

# Number of players seated when the bank opens.
initial_players = 2

# Maximum number of history entries shown on screen.
history_limit = 50
"#;

/// Settings shared by the core and the terminal UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Balance assigned by "add player".
    pub starting_balance: i64,
    /// Players present when a session starts.
    pub initial_players: usize,
    /// How many history lines the UI renders.
    pub history_limit: usize,
    /// Directory for the log file.
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE,
            initial_players: 2,
            history_limit: 50,
            log_dir: default_log_dir(),
        }
    }
}

impl AppConfig {
    /// Load from the default location plus environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(default_config_path()?)
    }

    /// Load from `path` plus environment overrides. A missing file is fine.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        info!(
            path = %path.display(),
            starting_balance = config.starting_balance,
            initial_players = config.initial_players,
            "Configuration loaded"
        );
        Ok(config)
    }
}

/// `<config_dir>/tablebank/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join("logs")
}

/// Write the commented default file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf, ConfigError> {
    let path = default_config_path()?;
    ensure_default_config_at(&path)?;
    Ok(path)
}

/// Write the commented default file at `path` unless it already exists.
pub fn ensure_default_config_at(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }
    let write_err = |source| ConfigError::WriteDefault {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, DEFAULT_CONFIG).map_err(write_err)?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.starting_balance, 1500);
        assert_eq!(config.initial_players, 2);
        assert_eq!(config.history_limit, 50);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "starting_balance = 2000\ninitial_players = 4\nlog_dir = \"/tmp/bank-logs\"\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.starting_balance, 2000);
        assert_eq!(config.initial_players, 4);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/bank-logs"));
        Ok(())
    }

    #[test]
    fn default_file_is_written_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        ensure_default_config_at(&path)?;
        assert!(path.exists());
        let loaded = AppConfig::load_from(&path)?;
        assert_eq!(loaded.starting_balance, DEFAULT_STARTING_BALANCE);

        fs::write(&path, "starting_balance = 10\n")?;
        ensure_default_config_at(&path)?;
        assert_eq!(AppConfig::load_from(&path)?.starting_balance, 10);
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "starting_balance = \"lots\"\n")?;
        assert!(AppConfig::load_from(&path).is_err());
        Ok(())
    }
}
