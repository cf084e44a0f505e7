use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use shiori_api::kitsu::MAX_PAGE_LIMIT;

use crate::error::ShioriError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub search: SearchSettings,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub page_size: u32,
    pub dashboard_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    pub debounce_ms: u64,
    /// Keep already-loaded pages when a load-more request fails.
    pub retain_pages_on_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: bool,
}

impl SearchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, ShioriError> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ShioriError> {
        if !path.exists() {
            return Self::parse("");
        }
        let user_str = std::fs::read_to_string(path)?;
        Self::parse(&user_str)
    }

    /// Parse a (possibly partial) user TOML document over the defaults.
    pub fn parse(user_str: &str) -> Result<Self, ShioriError> {
        let defaults: toml::Table =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| ShioriError::Config(e.to_string()))?;
        let user: toml::Table =
            toml::from_str(user_str).map_err(|e| ShioriError::Config(e.to_string()))?;
        let mut merged = toml::Value::Table(defaults);
        merge(&mut merged, toml::Value::Table(user));

        let config: AppConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| ShioriError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ShioriError> {
        let limits = [
            ("api.page_size", self.api.page_size),
            ("api.dashboard_limit", self.api.dashboard_limit),
        ];
        for (name, value) in limits {
            if !(1..=MAX_PAGE_LIMIT).contains(&value) {
                return Err(ShioriError::Config(format!(
                    "{name} must be between 1 and {MAX_PAGE_LIMIT}, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ShioriError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ShioriError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Directory holding persisted collections and log files.
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    /// Ensure the data directory exists and return it.
    pub fn ensure_data_dir(&self) -> Result<PathBuf, ShioriError> {
        let dir = self.data_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "shiori")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

/// Recursively overlay `overlay` tables onto `base`.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "https://kitsu.io/api/edge");
        assert_eq!(config.api.page_size, 20);
        assert_eq!(config.api.dashboard_limit, 12);
        assert_eq!(config.search.debounce(), Duration::from_millis(500));
        assert!(!config.search.retain_pages_on_error);
        assert!(config.storage.data_dir.is_none());
        assert!(!config.logging.file);
    }

    #[test]
    fn test_partial_user_file_merges() {
        let config = AppConfig::parse(
            r#"
            [search]
            debounce_ms = 250

            [storage]
            data_dir = "/tmp/shiori"
            "#,
        )
        .unwrap();
        assert_eq!(config.search.debounce_ms, 250);
        assert!(!config.search.retain_pages_on_error);
        assert_eq!(config.api.page_size, 20);
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/shiori"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AppConfig::parse("[api]\npage_size = 0").unwrap_err();
        assert!(matches!(err, ShioriError::Config(_)));
        let err = AppConfig::parse("[api]\npage_size = 21").unwrap_err();
        assert!(err.to_string().contains("api.page_size must be between 1 and 20"));
        let err = AppConfig::parse("[api]\ndashboard_limit = 3000000000").unwrap_err();
        assert!(matches!(err, ShioriError::Config(_)));
        assert!(AppConfig::parse("[api]\npage_size = 20\ndashboard_limit = 1").is_ok());
        let err = AppConfig::parse("[search]\ndebounce_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ShioriError::Config(_)));
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.api.page_size = 40;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.api.page_size, 40);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.api.page_size, 20);
    }
}
