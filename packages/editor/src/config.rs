use crate::errors::EditorResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "quire.config.json";

/// Quire configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Where the document is persisted, relative to the config directory
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Image URL seeded into the default document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_image: Option<String>,

    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("content.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(cwd: impl AsRef<Path>) -> EditorResult<Self> {
        let config_path = cwd.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }

    /// Get absolute path to the persisted document
    pub fn get_storage_path(&self, cwd: impl AsRef<Path>) -> PathBuf {
        cwd.as_ref().join(&self.storage_path)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            sample_image: None,
            log_level: default_log_level(),
        }
    }
}
