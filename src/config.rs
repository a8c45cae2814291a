use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_DATASET_PATH: &str = "data/dataset.json";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub data: Option<DataSection>,
    #[serde(default)]
    pub models: Option<ModelsSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSection {
    /// Path to the bundled dataset JSON (default: data/dataset.json)
    pub dataset_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsSection {
    /// Whether the occupancy regressor is served (default: true)
    pub occupancy_enabled: Option<bool>,
    /// Whether the enforcement classifier is served (default: true)
    pub enforcement_enabled: Option<bool>,
    pub occupancy_path: Option<PathBuf>,
    pub enforcement_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Returns the dataset path (default: data/dataset.json)
    pub fn dataset_path(&self) -> &Path {
        self.data
            .as_ref()
            .and_then(|d| d.dataset_path.as_deref())
            .unwrap_or(Path::new(DEFAULT_DATASET_PATH))
    }

    /// Whether the occupancy model should be loaded and served (default: true)
    pub fn occupancy_enabled(&self) -> bool {
        self.models
            .as_ref()
            .and_then(|m| m.occupancy_enabled)
            .unwrap_or(true)
    }

    /// Whether the enforcement model should be loaded and served (default: true)
    pub fn enforcement_enabled(&self) -> bool {
        self.models
            .as_ref()
            .and_then(|m| m.enforcement_enabled)
            .unwrap_or(true)
    }

    pub fn occupancy_model_path(&self) -> Option<&Path> {
        let path = self.models.as_ref()?.occupancy_path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    pub fn enforcement_model_path(&self) -> Option<&Path> {
        let path = self.models.as_ref()?.enforcement_path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }
}
