//! Configuration file support for vdat.
//!
//! The configuration is a versioned JSON file holding the log level, the
//! locations of the blob database and settings storage, and the list and
//! thumbnail limits.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{GALLERY_LIMIT, HISTORY_LIMIT, THUMBNAIL_SIZE};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Where persisted state lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// List and thumbnail limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// User preferences section of the config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Storage locations. Unset paths fall back to the platform data directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite blob database
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Key-value settings file
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
}

/// Limits section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_gallery_limit")]
    pub gallery_limit: usize,

    /// Longest thumbnail side in pixels
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
}

fn default_history_limit() -> usize {
    HISTORY_LIMIT
}

fn default_gallery_limit() -> usize {
    GALLERY_LIMIT
}

fn default_thumbnail_size() -> u32 {
    THUMBNAIL_SIZE
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            gallery_limit: default_gallery_limit(),
            thumbnail_size: default_thumbnail_size(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: UserPreferences::default(),
            storage: StorageConfig::default(),
            limits: LimitsConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "vdat-config.json"
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("vdat").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home| {
                home.join(".config")
                    .join("vdat")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }
        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Blob database location: configured, or `vdat.sqlite3` in the data directory.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage
            .database_path
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("vdat.sqlite3")))
    }

    /// Settings file location: configured, or `settings.json` in the data directory.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.storage
            .settings_path
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("settings.json")))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("vdat"))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let mut config = AppConfig::new();
        config.preferences.log_level = LogLevel::Debug;
        config.limits.history_limit = 10;
        config.storage.database_path = Some(PathBuf::from("/tmp/vdat.sqlite3"));

        let json = config.to_json().unwrap();
        assert_eq!(AppConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = AppConfig::from_json(r#"{"version": 1}"#).unwrap();
        assert_eq!(config.limits.history_limit, HISTORY_LIMIT);
        assert_eq!(config.limits.gallery_limit, GALLERY_LIMIT);
        assert_eq!(config.preferences.log_level, LogLevel::Info);
        assert_eq!(
            config.database_path().map(|p| p.ends_with("vdat/vdat.sqlite3")),
            dirs::data_dir().map(|_| true)
        );
    }

    #[test]
    fn test_version_too_new() {
        let result = AppConfig::from_json(r#"{"version": 99}"#);
        assert!(matches!(
            result,
            Err(ConfigError::VersionTooNew {
                file_version: 99,
                supported_version: CONFIG_VERSION
            })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(AppConfig::default_filename());

        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::new());

        let mut config = AppConfig::new();
        config.limits.thumbnail_size = 64;
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().limits.thumbnail_size, 64);
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Trace.name(), "Trace");
    }
}
