use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::MediatecaError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Record store location. Falls back to the platform data directory.
    pub store_path: Option<String>,
    pub sidecar_extension: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// When set, logs are also written to a file in this directory.
    pub log_dir: Option<String>,
}

impl AppConfig {
    /// Load config: user file (if exists) or built-in defaults.
    pub fn load() -> Result<Self, MediatecaError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, MediatecaError> {
        if !path.exists() {
            return Self::defaults();
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| MediatecaError::Config(e.to_string()))?;
        toml::from_str(&content).map_err(|e| MediatecaError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Default record store location in the platform data directory.
    pub fn default_store_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("database.csv"))
            .unwrap_or_else(|| PathBuf::from("database.csv"))
    }

    /// Configured store path, or the platform default.
    pub fn resolved_store_path(&self) -> PathBuf {
        self.catalog
            .store_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_store_path)
    }

    /// Ensure the store's directory exists and return the store path.
    pub fn ensure_store_dir(&self) -> Result<PathBuf, MediatecaError> {
        let path = self.resolved_store_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn defaults() -> Result<Self, MediatecaError> {
        toml::from_str(DEFAULT_CONFIG).map_err(|e| MediatecaError::Config(e.to_string()))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "mediateca")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.catalog.sidecar_extension, "tpoo");
        assert!(config.catalog.store_path.is_none());
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = AppConfig::default();
        config.catalog.store_path = Some("/data/catalog.csv".into());
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.catalog.store_path.as_deref(), Some("/data/catalog.csv"));
        assert_eq!(deserialized.catalog.sidecar_extension, config.catalog.sidecar_extension);
    }

    #[test]
    fn test_load_from_missing_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.catalog.sidecar_extension, "tpoo");
    }

    #[test]
    fn test_load_from_user_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.catalog.sidecar_extension = "meta".into();
        config.logging.log_dir = Some("/var/log/mediateca".into());
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.catalog.sidecar_extension, "meta");
        assert_eq!(loaded.logging.log_dir.as_deref(), Some("/var/log/mediateca"));
    }

    #[test]
    fn test_load_from_invalid_toml_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[catalog\nstore_path = ").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(MediatecaError::Config(_))));
    }

    #[test]
    fn test_resolved_store_path_prefers_configured() {
        let mut config = AppConfig::default();
        assert_eq!(config.resolved_store_path(), AppConfig::default_store_path());
        config.catalog.store_path = Some("/tmp/x.csv".into());
        assert_eq!(config.resolved_store_path(), PathBuf::from("/tmp/x.csv"));
    }
}
