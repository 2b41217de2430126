//! In-memory storage backend.
//!
//! Thread-safe implementation of [`RecordStore`] without durability. It is
//! intended for embedded usage, tests, and as a reference implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::record::CacheRecord;
use crate::storage::traits::{RecordStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory record store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, CacheRecord>>,
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn ensure_schema(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn get(&self, phone: &str) -> Result<Option<CacheRecord>, StorageError> {
        let records = self.records.read().map_err(|_| lock_err("record.get"))?;
        Ok(records.get(phone).cloned())
    }

    fn upsert(&self, record: CacheRecord) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|_| lock_err("record.upsert"))?;
        records.insert(record.phone.clone(), record);
        Ok(())
    }

    fn count(&self) -> Result<usize, StorageError> {
        let records = self.records.read().map_err(|_| lock_err("record.count"))?;
        Ok(records.len())
    }
}
