use serde::Deserialize;
use std::path::PathBuf;

use crate::db::BackendKind;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: PathBuf,
    /// Directory for the key-value fallback backend
    pub data_dir: PathBuf,
    /// Storage backend selection, decided once at startup
    pub backend: BackendKind,
    /// Whether local writes are mirrored to the external health ledger
    pub health_sync: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_home = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("macroscope");
        Self {
            database_path: data_home.join("macroscope.db"),
            data_dir: data_home,
            backend: BackendKind::Auto,
            health_sync: false,
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        if let Ok(db_path) = std::env::var("MACROSCOPE_DATABASE_PATH") {
            config.database_path = PathBuf::from(db_path);
        }
        if let Ok(data_dir) = std::env::var("MACROSCOPE_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(backend) = std::env::var("MACROSCOPE_BACKEND") {
            config.backend = serde_yaml::from_str(&backend)
                .map_err(|e| ConfigError::InvalidBackend(backend, e.to_string()))?;
        }
        if let Ok(health_sync) = std::env::var("MACROSCOPE_HEALTH_SYNC") {
            config.health_sync = health_sync == "1" || health_sync.eq_ignore_ascii_case("true");
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/macroscope/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("macroscope")
            .join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidBackend(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidBackend(value, e) => {
                write!(f, "Invalid backend '{}': {}", value, e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
