use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Where the order ledger lives
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub data_dir: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default = "default_sync_on_write")]
    pub sync_on_write: bool,
}

fn default_file_name() -> String {
    "orders.csv".to_string()
}

fn default_sync_on_write() -> bool {
    true
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            file_name: default_file_name(),
            sync_on_write: default_sync_on_write(),
        }
    }
}

impl LedgerConfig {
    pub fn ledger_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.file_name)
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`
    pub fn load(env: &str) -> Result<Self> {
        Self::load_from(format!("config/{}.yaml", env))
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}
