use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::MaintainerError;
use crate::analytics::DEFAULT_SPENDING_HISTORY_MONTHS;
use crate::garage::FileBasedStorage;

const APP_DIR_NAME: &str = "maintainer";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Store location; the platform data directory when unset
    pub data_dir: Option<PathBuf>,
    /// Months of history kept in the monthly spending report
    pub spending_history_months: usize,
    /// Print template notes in listings
    pub show_notes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            spending_history_months: DEFAULT_SPENDING_HISTORY_MONTHS,
            show_notes: true,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf, MaintainerError> {
        Ok(dirs::config_dir()
            .ok_or(MaintainerError::NoConfigDir)?
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Read the user config file, `None` when there is none yet
    pub fn from_local_file() -> Result<Option<Self>, MaintainerError> {
        Self::from_path(&Self::config_path()?)
    }

    pub fn from_path(config_path: &Path) -> Result<Option<Self>, MaintainerError> {
        if !config_path.exists() {
            debug!("No config file at {:?}", config_path);
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| MaintainerError::ConfigIOError { source: e })?;
        let config = serde_json::from_reader(file)
            .map_err(|e| MaintainerError::ConfigSerializeError { source: e })?;
        Ok(Some(config))
    }

    /// Config file contents, or defaults when the file is missing or broken
    pub fn load_or_default() -> Self {
        match Self::from_local_file() {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Ignoring unusable config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), MaintainerError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), MaintainerError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MaintainerError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| MaintainerError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| MaintainerError::ConfigSerializeError { source: e })?;
        info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Store directory: the explicit override first, then the config value,
    /// then the platform default
    pub fn resolve_data_dir(&self, cli_override: Option<&Path>) -> Result<PathBuf, MaintainerError> {
        match cli_override.or(self.data_dir.as_deref()) {
            Some(dir) => Ok(dir.to_path_buf()),
            None => FileBasedStorage::default_storage_path(),
        }
    }
}
