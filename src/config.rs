//! Configuration management for the frontier using the prefer crate.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default cap on inflated archive size (1 GiB).
pub const DEFAULT_MAX_INFLATED_BYTES: u64 = 1 << 30;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Directory for temporary files. `None` uses the system temp directory.
    pub temp_dir: Option<PathBuf>,
    /// Largest inflated size accepted from a compressed download.
    pub max_inflated_bytes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to the platform data dir, e.g. ~/.local/share/frontier/
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("frontier");

        Self {
            data_dir,
            database_filename: "frontier.db".to_string(),
            temp_dir: None,
            max_inflated_bytes: DEFAULT_MAX_INFLATED_BYTES,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the full path to the database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        if let Some(ref temp_dir) = self.temp_dir {
            fs::create_dir_all(temp_dir)?;
        }
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target directory for data.
    #[serde(default)]
    pub target: Option<String>,
    /// Database filename.
    #[serde(default)]
    pub database: Option<String>,
    /// Directory for temporary files.
    #[serde(default)]
    pub temp_dir: Option<String>,
    /// Largest inflated size accepted from a compressed download.
    #[serde(default)]
    pub max_inflated_bytes: Option<u64>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers frontier config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("frontier").await {
            Ok(pref_config) => {
                let target: Option<String> = pref_config.get("target").ok();
                let database: Option<String> = pref_config.get("database").ok();
                let temp_dir: Option<String> = pref_config.get("temp_dir").ok();
                let max_inflated_bytes: Option<u64> =
                    pref_config.get("max_inflated_bytes").ok();

                Config {
                    target,
                    database,
                    temp_dir,
                    max_inflated_bytes,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref target) = self.target {
            settings.data_dir = expand_path(target);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref temp_dir) = self.temp_dir {
            settings.temp_dir = Some(expand_path(temp_dir));
        }
        if let Some(limit) = self.max_inflated_bytes {
            settings.max_inflated_bytes = limit;
        }
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Load settings from configuration (async version).
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings
}
