//! Error types for phonecache.
//!
//! All errors are strongly typed using thiserror. Derivation failures are
//! not errors at this level: the resolver turns them into degraded records.

use std::path::PathBuf;

use thiserror::Error;

use crate::resolver::ResolveError;
use crate::storage::StorageError;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or JSON for the expected shape.
    #[error("failed to parse config{}: {message}", path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    Parse {
        /// File being parsed, when the input came from a file.
        path: Option<PathBuf>,
        /// Parser message.
        message: String,
    },

    /// A value is out of range.
    #[error("invalid config value for '{field}': {reason}")]
    Invalid {
        /// Dotted path of the offending key.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Top-level error type for phonecache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resolution could not complete.
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unexpected internal failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl CacheError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if repeating the operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Resolve(e) => e.storage_error().is_transient(),
            Self::Config(_) | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for phonecache operations.
pub type CacheResult<T> = Result<T, CacheError>;
