//! Persistent storage backend.
//!
//! Durable, crash-safe storage for cached records with:
//! - An append-only record log with whole-record frames
//! - CRC32 checksums for corruption detection
//! - Torn-tail repair on open
//! - Directory locking for single-process access
//! - Log compaction by atomic rewrite
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//! ├── .lock            exclusive advisory lock
//! └── phonecache.wal   [header][frame][frame]...
//! ```

mod codec;
mod file_lock;
mod store;
mod wal;

pub use file_lock::{DirLock, LOCK_FILE};
pub use store::{CompactionResult, PersistentRecordStore, STORE_FILE};
pub use wal::{Recovery, WalEntry, WalEntryKind, WriteAheadLog};

use std::path::Path;

use crate::config::StorageConfig;
use crate::error::CacheResult;
use crate::storage::traits::RecordStore;

/// Open the store in `path` and make sure its schema is in place.
///
/// This is the startup entry point: a failure here means the cache cannot
/// operate and should be treated as fatal.
///
/// # Errors
/// - [`CacheError::Config`](crate::CacheError::Config) if `config` is out of range
/// - [`CacheError::Storage`](crate::CacheError::Storage) if the directory cannot be
///   used, another process holds it, or the log is corrupted
///
/// # Example
/// ```rust,ignore
/// use phonecache::storage::persistent::open_store;
///
/// let store = open_store("./phonecache", None)?;
/// let resolver = Resolver::new(Arc::new(store), Arc::new(PhoneNumberDeriver::new()));
/// ```
pub fn open_store(
    path: impl AsRef<Path>,
    config: Option<StorageConfig>,
) -> CacheResult<PersistentRecordStore> {
    let config = config.unwrap_or_default().validate()?;
    let store = PersistentRecordStore::open(path.as_ref(), config)?;
    store.ensure_schema()?;
    Ok(store)
}
