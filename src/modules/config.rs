use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default = "default_bin_id")]
    pub bin_id: String,
    #[serde(default = "default_master_key")]
    pub master_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_bin_id() -> String {
    "67551fb1e41b4d34e461b1d3".to_string()
}

fn default_master_key() -> String {
    "$2a$10$8Iblx7QYFXoRdZJlQKtG1.vYKlhodTx/6w0G1bsgIWjMRsthflNC2".to_string()
}

fn default_api_base() -> String {
    "https://api.jsonbin.io/v3/b".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bin_id: default_bin_id(),
            master_key: default_master_key(),
            api_base: default_api_base(),
            refresh_interval_secs: default_refresh_interval_secs(),
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// Full URL of the versioned bin holding the product array.
    pub fn api_url(&self) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), self.bin_id)
    }

    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::config_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("shelfmate"),
        }
    }
}

/// Loads `config.json` from the app data directory. Any failure (missing
/// file, unreadable, malformed JSON) falls back to the defaults so startup
/// never stalls on a bad config.
pub fn load_config() -> AppConfig {
    let config_path = AppConfig::default().data_dir().join("config.json");

    if !config_path.exists() {
        return AppConfig::default();
    }

    let config_str = match std::fs::read_to_string(&config_path) {
        Ok(contents) => contents,
        Err(e) => {
            log::error!("Failed to read config file: {}", e);
            return AppConfig::default();
        }
    };

    match serde_json::from_str(&config_str) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to parse config, using defaults: {}", e);
            AppConfig::default()
        }
    }
}
