use campaign_workspace::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "campaign.config.json";

/// Campaign project configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding one JSON record per campaign
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Autosave and history settings
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_store_dir() -> String {
    "campaigns".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to the record store
    pub fn get_store_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.store_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            sync: SyncConfig::default(),
        }
    }
}
