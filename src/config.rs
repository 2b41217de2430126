//! Configuration.
//!
//! Configuration is read from a TOML file; every field has a default so an
//! empty or missing file yields a working setup:
//!
//! ```toml
//! data_dir = "./phonecache"
//!
//! [storage]
//! sync_on_write = true
//! max_wal_size = 8388608
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the store file and its lock.
    pub data_dir: PathBuf,
    /// Storage engine settings.
    pub storage: StorageConfig,
    /// Logging settings for the binary.
    pub logging: LoggingConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./phonecache"),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })
    }

    /// Like [`CacheConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        config.validate()
    }

    /// Check every section, returning the configuration unchanged when valid.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "data_dir",
                reason: "must not be empty".to_string(),
            });
        }
        self.storage.clone().validate()?;
        self.logging.clone().validate()?;
        Ok(self)
    }
}

/// Storage engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Whether to fsync after every write (slower but safer).
    pub sync_on_write: bool,
    /// Log size (bytes) above which the log is compacted after an upsert.
    pub max_wal_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sync_on_write: true,
            max_wal_size: 8 * 1024 * 1024, // 8 MiB
        }
    }
}

impl StorageConfig {
    const MIN_WAL_SIZE: u64 = 4 * 1024; // 4 KiB

    /// Reject values the storage engine cannot work with.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.max_wal_size < Self::MIN_WAL_SIZE {
            return Err(ConfigError::Invalid {
                field: "storage.max_wal_size",
                reason: format!(
                    "must be at least {} bytes (got {})",
                    Self::MIN_WAL_SIZE,
                    self.max_wal_size
                ),
            });
        }
        Ok(self)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `phonecache=debug`.
    pub level: Option<String>,
    /// Output format: `pretty`, `compact` or `json`.
    pub format: Option<String>,
}

impl LoggingConfig {
    /// Accepted values for `format`.
    pub const FORMATS: [&'static str; 3] = ["pretty", "compact", "json"];

    /// Reject unknown output formats.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if let Some(format) = self.format.as_deref() {
            if !Self::FORMATS.contains(&format) {
                return Err(ConfigError::Invalid {
                    field: "logging.format",
                    reason: format!("unknown format '{format}', expected one of {:?}", Self::FORMATS),
                });
            }
        }
        Ok(self)
    }
}
