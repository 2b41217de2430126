//! Record storage.
//!
//! [`RecordStore`] is the abstract interface; [`InMemoryRecordStore`] and,
//! with the `persistent` feature, [`persistent::PersistentRecordStore`]
//! implement it.

mod memory;
mod traits;

#[cfg(feature = "persistent")]
pub mod persistent;

pub use memory::InMemoryRecordStore;
pub use traits::{RecordStore, StorageError};

#[cfg(feature = "persistent")]
pub use persistent::{open_store, PersistentRecordStore};
