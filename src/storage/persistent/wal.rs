//! Append-only record log.
//!
//! The log is the store's only file. Every upsert appends one frame holding
//! the complete record, so a write either lands whole or is discarded:
//! 1. Frames are written with a single `write_all` and optionally fsynced
//! 2. A failed append rolls the file back to its previous length
//! 3. On open, a frame torn by a crash at the tail is truncated away
//!
//! # File Format
//! ```text
//! [MAGIC: 4 bytes][VERSION: 1 byte]
//! [ENTRY 1: codec frame of WalEntry]
//! [ENTRY 2: codec frame of WalEntry]
//! ...
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::record::CacheRecord;
use crate::storage::traits::StorageError;

use super::codec;

fn lock_err() -> StorageError {
    StorageError::BackendError("poisoned lock: wal.writer".to_string())
}

fn corrupted(path: &Path, offset: u64, err: &std::io::Error) -> StorageError {
    StorageError::Corrupted(format!("{} at byte {offset}: {err}", path.display()))
}

/// A single entry in the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    /// Monotonically increasing sequence number.
    pub sequence: u64,
    /// When this entry was written.
    pub timestamp: DateTime<Utc>,
    /// The logged mutation.
    pub kind: WalEntryKind,
}

/// The mutation carried by a log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalEntryKind {
    /// Full replacement of the record under `record.phone`.
    Upsert(CacheRecord),
}

/// What was found while opening an existing log.
#[derive(Debug, Default)]
pub struct Recovery {
    /// Entries in log order.
    pub entries: Vec<WalEntry>,
    /// Bytes of torn tail that were cut off.
    pub truncated_bytes: u64,
}

struct Writer {
    file: File,
    len: u64,
    sequence: u64,
}

/// Append-only log of record upserts.
///
/// Thread-safe via internal mutex.
pub struct WriteAheadLog {
    path: PathBuf,
    writer: Mutex<Writer>,
    sync_on_write: bool,
}

impl WriteAheadLog {
    /// Open or create a log file, returning the entries it already holds.
    ///
    /// A new or empty file receives the header. A torn final frame is removed.
    /// Damage anywhere else is reported as [`StorageError::Corrupted`].
    pub fn open(path: &Path, sync_on_write: bool) -> Result<(Self, Recovery), StorageError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let file_len = file.metadata()?.len();
        let recovery = if file_len < codec::HEADER_LEN {
            // New file, or a crash while the header itself was being written.
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            codec::write_header(&mut file)?;
            if sync_on_write {
                file.sync_all()?;
            }
            Recovery::default()
        } else {
            let recovery = Self::scan(path, &file, file_len)?;
            if recovery.truncated_bytes > 0 {
                file.set_len(file_len - recovery.truncated_bytes)?;
                file.sync_all()?;
            }
            recovery
        };

        let len = file.seek(SeekFrom::End(0))?;
        let sequence = recovery.entries.last().map_or(0, |e| e.sequence);

        Ok((
            Self {
                path: path.to_path_buf(),
                writer: Mutex::new(Writer {
                    file,
                    len,
                    sequence,
                }),
                sync_on_write,
            },
            recovery,
        ))
    }

    fn scan(path: &Path, file: &File, file_len: u64) -> Result<Recovery, StorageError> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;
        codec::read_header(&mut reader).map_err(|e| corrupted(path, 0, &e))?;

        let mut offset = codec::HEADER_LEN;
        let mut entries = Vec::new();

        while offset < file_len {
            match codec::decode::<WalEntry>(&mut reader) {
                Ok((entry, consumed)) => {
                    offset += consumed;
                    entries.push(entry);
                }
                Err(e) => {
                    let rest = Self::read_rest(file, offset)?;
                    // A frame cut short by a crash is only torn if nothing intact follows it.
                    // Preallocated zeros after a crash look like a bad frame; anything else is damage.
                    let torn = if e.kind() == ErrorKind::UnexpectedEof {
                        codec::find_frame(&rest).is_none()
                    } else {
                        rest.iter().all(|&b| b == 0)
                    };
                    if !torn {
                        return Err(corrupted(path, offset, &e));
                    }
                    break;
                }
            }
        }

        let truncated_bytes = file_len - offset;
        if truncated_bytes > 0 {
            warn!(
                path = %path.display(),
                offset,
                truncated_bytes,
                "discarding torn tail of record log"
            );
        }

        Ok(Recovery {
            entries,
            truncated_bytes,
        })
    }

    fn read_rest(file: &File, offset: u64) -> Result<Vec<u8>, StorageError> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(offset))?;
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest)?;
        Ok(rest)
    }

    /// Append an entry, returning its sequence number.
    ///
    /// On failure the file is cut back to its previous length so no partial
    /// frame is left behind.
    pub fn append(&self, kind: WalEntryKind) -> Result<u64, StorageError> {
        let mut writer = self.writer.lock().map_err(|_| lock_err())?;

        let sequence = writer.sequence + 1;
        let entry = WalEntry {
            sequence,
            timestamp: Utc::now(),
            kind,
        };
        let frame = codec::encode(&entry)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let start = writer.len;
        if let Err(e) = self.write_frame(&mut writer.file, start, &frame) {
            if let Err(rollback) = writer.file.set_len(start) {
                warn!(error = %rollback, "failed to roll back partial log append");
            }
            return Err(e.into());
        }

        writer.len = start + frame.len() as u64;
        writer.sequence = sequence;
        Ok(sequence)
    }

    fn write_frame(&self, file: &mut File, at: u64, frame: &[u8]) -> std::io::Result<()> {
        file.seek(SeekFrom::Start(at))?;
        file.write_all(frame)?;
        file.flush()?;
        if self.sync_on_write {
            file.sync_data()?;
        }
        Ok(())
    }

    /// Replace the whole log with one entry per given record.
    ///
    /// The new log is written to a temporary file, fsynced and renamed over
    /// the old one, so a crash leaves either the old or the new log in place.
    pub fn rewrite<'a>(
        &self,
        records: impl IntoIterator<Item = &'a CacheRecord>,
    ) -> Result<u64, StorageError> {
        let mut writer = self.writer.lock().map_err(|_| lock_err())?;

        let temp_path = self.path.with_extension("wal.compact");
        let mut temp = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        let result = (|| -> Result<(u64, u64), StorageError> {
            let mut buf = Vec::new();
            codec::write_header(&mut buf)?;
            let now = Utc::now();
            let mut sequence = 0;
            for record in records {
                sequence += 1;
                let entry = WalEntry {
                    sequence,
                    timestamp: now,
                    kind: WalEntryKind::Upsert(record.clone()),
                };
                let frame = codec::encode(&entry)
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                buf.extend_from_slice(&frame);
            }
            temp.write_all(&buf)?;
            temp.sync_all()?;
            Ok((sequence, buf.len() as u64))
        })();

        let (sequence, len) = match result {
            Ok(v) => v,
            Err(e) => {
                drop(temp);
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };

        fs::rename(&temp_path, &self.path)?;

        // The renamed file is now the log; nothing fallible may run before the swap.
        *writer = Writer {
            file: temp,
            len,
            sequence,
        };
        sync_parent_dir(&self.path);
        Ok(len)
    }

    /// Re-read and validate the header of the open log file.
    pub fn check_header(&self) -> Result<(), StorageError> {
        let mut writer = self.writer.lock().map_err(|_| lock_err())?;
        writer.file.seek(SeekFrom::Start(0))?;
        let result = codec::read_header(&mut writer.file);
        let end = writer.len;
        writer.file.seek(SeekFrom::Start(end))?;
        result
            .map(|_| ())
            .map_err(|e| corrupted(&self.path, 0, &e))
    }

    /// Sequence number of the most recent entry.
    pub fn current_sequence(&self) -> Result<u64, StorageError> {
        Ok(self.writer.lock().map_err(|_| lock_err())?.sequence)
    }

    /// Size of the log file in bytes.
    pub fn size_bytes(&self) -> Result<u64, StorageError> {
        Ok(self.writer.lock().map_err(|_| lock_err())?.len)
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    if let Some(dir) = path.parent() {
        if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
            warn!(dir = %dir.display(), error = %e, "failed to fsync store directory");
        }
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}
