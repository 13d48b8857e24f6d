use std::path::{Path, PathBuf};

use questrade_api::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const APP_DIR: &str = "qtrade";
const CONFIG_FILE_NAME: &str = "config.toml";
const SYMBOL_CACHE_FILE_NAME: &str = "symbols.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the credential is persisted. Defaults to `~/.questrade_token.json`.
    pub token_path: Option<PathBuf>,
    /// Where resolved symbols are kept between runs.
    pub symbol_cache_path: Option<PathBuf>,
    pub client: ClientConfig,
}

impl AppConfig {
    /// Load from `path`, or the default location. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the config file with defaults.
    pub fn reset(path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, Self::default().show()?)?;
        Ok(())
    }

    pub fn show(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::Config("no config directory on this platform".into()))
    }

    /// Symbol cache file, `None` when there is nowhere to keep it.
    pub fn symbol_cache_path(&self) -> Option<PathBuf> {
        self.symbol_cache_path.clone().or_else(|| {
            dirs::cache_dir().map(|dir| dir.join(APP_DIR).join(SYMBOL_CACHE_FILE_NAME))
        })
    }
}
