//! Crash recovery tests for persistent storage.
//!
//! These tests verify that the storage layer correctly handles:
//! - Partial writes (simulated crash mid-write)
//! - Replay idempotency across restarts
//! - CRC corruption detection
//! - Exclusive access to a store directory

#![cfg(feature = "persistent")]

use std::fs;
use std::io::{Read, Write};

use phonecache::storage::persistent::STORE_FILE;
use phonecache::{open_store, CacheError, CacheRecord, RecordStore, StorageConfig, StorageError};
use tempfile::tempdir;

fn config() -> Option<StorageConfig> {
    Some(StorageConfig {
        sync_on_write: true,
        ..StorageConfig::default()
    })
}

fn record(i: usize) -> CacheRecord {
    let mut record = CacheRecord::degraded(format!("+1555000{i:04}"));
    record.formatted = format!("+1 555-000-{i:04}");
    record.valid = true;
    record
}

/// A torn final entry is dropped and the store keeps working.
#[test]
fn test_partial_entry_recovery() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join(STORE_FILE);

    {
        let store = open_store(dir.path(), config()).unwrap();
        for i in 0..5 {
            store.upsert(record(i)).unwrap();
        }
    }

    // Cut the last entry short, as a crash mid-append would.
    {
        let file = fs::OpenOptions::new().write(true).open(&wal_path).unwrap();
        let size = file.metadata().unwrap().len();
        file.set_len(size - 7).unwrap();
    }

    let store = open_store(dir.path(), config()).unwrap();
    assert_eq!(store.count().unwrap(), 4);
    assert_eq!(store.get(&record(3).phone).unwrap().unwrap().formatted, record(3).formatted);
    assert!(store.get(&record(4).phone).unwrap().is_none());

    // New writes land after the repaired tail and survive another restart.
    store.upsert(record(9)).unwrap();
    drop(store);

    let store = open_store(dir.path(), config()).unwrap();
    assert_eq!(store.count().unwrap(), 5);
    assert!(store.get(&record(9).phone).unwrap().is_some());
}

/// Reopening repeatedly yields the same records.
#[test]
fn test_replay_idempotency() {
    let dir = tempdir().unwrap();
    let written = record(1);

    {
        let store = open_store(dir.path(), config()).unwrap();
        store.upsert(written.clone()).unwrap();
    }

    for _ in 0..3 {
        let store = open_store(dir.path(), config()).unwrap();
        assert_eq!(store.get(&written.phone).unwrap(), Some(written.clone()));
        assert_eq!(store.count().unwrap(), 1);
    }
}

/// A flipped byte before the tail is corruption, not a torn write.
#[test]
fn test_crc_corruption_detection() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join(STORE_FILE);

    {
        let store = open_store(dir.path(), config()).unwrap();
        for i in 0..3 {
            store.upsert(record(i)).unwrap();
        }
    }

    {
        let mut content = Vec::new();
        fs::File::open(&wal_path)
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();

        // Skip header (PHNC + version = 5 bytes) and the first frame prefix.
        content[20] ^= 0xFF;

        fs::File::create(&wal_path)
            .unwrap()
            .write_all(&content)
            .unwrap();
    }

    let err = open_store(dir.path(), config()).err().unwrap();
    assert!(
        matches!(err, CacheError::Storage(StorageError::Corrupted(_))),
        "unexpected error: {err}"
    );
}

/// A damaged length field must not hide the frames after it.
#[test]
fn test_bad_length_field_is_not_a_torn_tail() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join(STORE_FILE);

    {
        let store = open_store(dir.path(), config()).unwrap();
        for i in 0..10 {
            store.upsert(record(i)).unwrap();
        }
    }

    let mut content = fs::read(&wal_path).unwrap();
    let size = content.len() as u64;
    // Frame 1 starts after the 5-byte header; its length field is bytes 6..10.
    content[8] ^= 0x01;
    fs::write(&wal_path, &content).unwrap();

    let err = open_store(dir.path(), config()).err().unwrap();
    assert!(
        matches!(err, CacheError::Storage(StorageError::Corrupted(_))),
        "unexpected error: {err}"
    );
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), size);

    // Restoring the byte brings every record back.
    content[8] ^= 0x01;
    fs::write(&wal_path, &content).unwrap();
    let store = open_store(dir.path(), config()).unwrap();
    assert_eq!(store.count().unwrap(), 10);
}

/// A foreign file in place of the store is refused, never overwritten.
#[test]
fn test_foreign_file_is_not_overwritten() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join(STORE_FILE);
    fs::write(&wal_path, b"definitely not a phonecache store").unwrap();

    let err = open_store(dir.path(), config()).err().unwrap();
    assert!(matches!(err, CacheError::Storage(StorageError::Corrupted(_))));
    assert_eq!(
        fs::read(&wal_path).unwrap(),
        b"definitely not a phonecache store"
    );
}

/// Only one handle may own a store directory at a time.
#[test]
fn test_store_directory_is_exclusive() {
    let dir = tempdir().unwrap();

    let first = open_store(dir.path(), config()).unwrap();
    let err = open_store(dir.path(), config()).err().unwrap();
    assert!(matches!(err, CacheError::Storage(StorageError::Locked(_))));

    drop(first);
    open_store(dir.path(), config()).unwrap();
}
