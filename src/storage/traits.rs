//! Abstract storage trait for cached records.
//!
//! The resolver only depends on [`RecordStore`], so it can run against:
//! - the in-memory backend for tests and embedded use
//! - the persistent backend for the on-device cache

use std::io;

use thiserror::Error;

use crate::record::CacheRecord;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying file operation failed (disk full, permission denied, ...).
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// Persisted data failed validation (bad header, CRC mismatch, undecodable entry).
    #[error("Store is corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the store.
    #[error("Store is locked: {0}")]
    Locked(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl StorageError {
    /// Returns true if repeating the operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            Self::Locked(_) => true,
            Self::Corrupted(_) | Self::BackendError(_) | Self::SerializationError(_) => false,
        }
    }
}

/// Keyed persistence for [`CacheRecord`]s.
///
/// # Contract
/// - Keys are compared verbatim: no trimming, case folding or prefix matching
/// - `upsert` fully replaces any previous record for the same key, atomically
/// - Reads never modify a record
pub trait RecordStore: Send + Sync {
    /// Prepare the backing storage. Idempotent and never destroys existing records.
    fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Get the record stored under exactly `phone`.
    fn get(&self, phone: &str) -> Result<Option<CacheRecord>, StorageError>;

    /// Insert or replace the record keyed by `record.phone`.
    fn upsert(&self, record: CacheRecord) -> Result<(), StorageError>;

    /// Number of distinct keys currently stored.
    fn count(&self) -> Result<usize, StorageError>;
}
