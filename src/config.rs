use crate::errors::{DownloaderError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the Yandex Music OAuth token
pub const TOKEN_ENV_VAR: &str = "YANDEX_MUSIC_TOKEN";

/// Application configuration
///
/// Loaded from `config.toml` in the platform config directory, with the
/// OAuth token overridable through the environment. Missing file falls back
/// to defaults and writes them out for the next run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Yandex Music OAuth token; anonymous (limited) access when absent
    pub token: Option<String>,

    /// Timeout for catalog API calls, in seconds
    pub request_timeout_secs: u64,

    /// Timeout for the raw audio download, in seconds
    pub download_timeout_secs: u64,

    /// Target bitrate for transcoded output, in kbps
    pub target_bitrate_kbps: u32,

    /// Minimum plausible size of a downloaded track, in bytes
    pub min_download_size: u64,

    /// Directory where finished tracks are placed
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            request_timeout_secs: 30,
            download_timeout_secs: 120,
            target_bitrate_kbps: 192,
            min_download_size: 1024,
            output_dir: dirs::audio_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Yandex Music Downloads"),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)
                .map_err(|e| DownloaderError::Internal(format!("Invalid config file: {}", e)))?
        } else {
            let config = Self::default();
            config.save().ok();
            config
        };

        // Environment token wins over the config file
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.is_empty() {
                config.token = Some(token);
            }
        }

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| DownloaderError::Internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    /// Path of the configuration file
    pub fn config_file_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("yandex-music-downloader")
            .join("config.toml")
    }

    /// Catalog request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Download timeout as a `Duration`
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
