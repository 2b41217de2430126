//! # phonecache - Offline phone-number metadata with a durable cache
//!
//! phonecache derives descriptive metadata for a phone number (formatted
//! form, validity, carrier, time zone) locally and remembers the result, so a
//! number is only ever derived once per installation.
//!
//! ## Core Concepts
//!
//! - **CacheRecord**: the stored metadata for one exact phone-number string
//! - **RecordStore**: keyed, atomic insert-or-replace persistence for records
//! - **Deriver**: the offline derivation routine, consulted only on a miss
//! - **Resolver**: the read-through cache tying the two together
//! - **ContactDetails**: ordered display lines with a provenance note
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use phonecache::{open_store, PhoneNumberDeriver, Resolver};
//!
//! let store = open_store("./phonecache", None)?;
//! let resolver = Resolver::new(Arc::new(store), Arc::new(PhoneNumberDeriver::new()));
//!
//! for line in resolver.resolve("+14155552671")?.lines() {
//!     println!("{line}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod contacts;
pub mod derive;
pub mod details;
pub mod error;
pub mod record;
pub mod resolver;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use config::{CacheConfig, LoggingConfig, StorageConfig};
pub use contacts::Contact;
pub use derive::{Derived, Deriver, ParseError, PhoneNumberDeriver};
pub use details::{ContactDetails, Provenance};
pub use error::{CacheError, CacheResult, ConfigError};
pub use record::CacheRecord;
pub use resolver::{ResolveError, Resolver};
pub use storage::{InMemoryRecordStore, RecordStore, StorageError};

#[cfg(feature = "persistent")]
pub use storage::{open_store, PersistentRecordStore};
