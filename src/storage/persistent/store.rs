//! Persistent record store.
//!
//! Wraps:
//! - An in-memory index for reads
//! - The record log for durable writes
//! - A directory lock for single-process access

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::record::CacheRecord;
use crate::storage::traits::{RecordStore, StorageError};

use super::file_lock::DirLock;
use super::wal::{WalEntryKind, WriteAheadLog};

/// File name of the record log inside the data directory.
pub const STORE_FILE: &str = "phonecache.wal";

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Durable, file-backed [`RecordStore`].
///
/// Reads are served from memory. Writes go to the log first and reach the
/// index only once the append succeeded, so the index never shows a record
/// the file does not hold.
pub struct PersistentRecordStore {
    dir: PathBuf,
    _lock: DirLock,
    wal: WriteAheadLog,
    index: RwLock<HashMap<String, CacheRecord>>,
    config: StorageConfig,
    /// Log size right after the most recent compaction.
    compacted_size: AtomicU64,
    compactions: AtomicU64,
}

impl PersistentRecordStore {
    /// Open or create the store in `dir`, replaying its log.
    ///
    /// # Errors
    /// - If the directory cannot be created or accessed
    /// - If another process holds the store
    /// - If the log is corrupted before its tail
    pub fn open(dir: &Path, config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        let lock = DirLock::acquire(dir)?;

        let (wal, recovery) = WriteAheadLog::open(&dir.join(STORE_FILE), config.sync_on_write)?;

        let mut index = HashMap::new();
        for entry in recovery.entries.iter().cloned() {
            match entry.kind {
                WalEntryKind::Upsert(record) => {
                    index.insert(record.phone.clone(), record);
                }
            }
        }

        info!(
            dir = %dir.display(),
            entries = recovery.entries.len(),
            records = index.len(),
            "opened record store"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            _lock: lock,
            wal,
            index: RwLock::new(index),
            config,
            compacted_size: AtomicU64::new(0),
            compactions: AtomicU64::new(0),
        })
    }

    /// Rewrite the log so it holds exactly the latest record per key.
    ///
    /// Safe to call at any time: until the final rename the old log stays in place.
    pub fn compact(&self) -> Result<CompactionResult, StorageError> {
        let index = self.index.read().map_err(|_| lock_err("record.compact"))?;
        self.compact_locked(&index)
    }

    fn compact_locked(
        &self,
        index: &HashMap<String, CacheRecord>,
    ) -> Result<CompactionResult, StorageError> {
        let size_before = self.wal.size_bytes()?;
        let size_after = self.wal.rewrite(index.values())?;
        self.compacted_size.store(size_after, Ordering::Relaxed);
        self.compactions.fetch_add(1, Ordering::Relaxed);

        info!(
            records = index.len(),
            size_before,
            size_after,
            "compacted record log"
        );

        Ok(CompactionResult {
            records: index.len(),
            size_before,
            size_after,
        })
    }

    /// Current log size in bytes.
    pub fn wal_size(&self) -> Result<u64, StorageError> {
        self.wal.size_bytes()
    }

    /// Number of compactions run since the store was opened.
    #[must_use]
    pub fn compactions(&self) -> u64 {
        self.compactions.load(Ordering::Relaxed)
    }

    /// Log size above which an upsert triggers compaction.
    ///
    /// Never below twice the last compacted size, so a log made of live
    /// records is not rewritten on every write.
    fn compaction_threshold(&self) -> u64 {
        self.config
            .max_wal_size
            .max(self.compacted_size.load(Ordering::Relaxed).saturating_mul(2))
    }

    /// Path of the record log.
    #[must_use]
    pub fn store_path(&self) -> &Path {
        self.wal.path()
    }
}

impl RecordStore for PersistentRecordStore {
    fn ensure_schema(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        self.wal.check_header()
    }

    fn get(&self, phone: &str) -> Result<Option<CacheRecord>, StorageError> {
        let index = self.index.read().map_err(|_| lock_err("record.get"))?;
        Ok(index.get(phone).cloned())
    }

    fn upsert(&self, record: CacheRecord) -> Result<(), StorageError> {
        // Holding the index write lock across the append keeps log order and index order equal.
        let mut index = self.index.write().map_err(|_| lock_err("record.upsert"))?;

        let sequence = self.wal.append(WalEntryKind::Upsert(record.clone()))?;
        debug!(phone = %record.phone, sequence, "upserted record");
        index.insert(record.phone.clone(), record);

        if self.wal.size_bytes()? > self.compaction_threshold() {
            // The record is already durable; a failed compaction only leaves a longer log.
            if let Err(e) = self.compact_locked(&index) {
                warn!(error = %e, "record log compaction failed");
            }
        }
        Ok(())
    }

    fn count(&self) -> Result<usize, StorageError> {
        let index = self.index.read().map_err(|_| lock_err("record.count"))?;
        Ok(index.len())
    }
}

/// Result of a compaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionResult {
    /// Records in the rewritten log.
    pub records: usize,
    /// Log size before compaction.
    pub size_before: u64,
    /// Log size after compaction.
    pub size_after: u64,
}
