//! Read-through resolution of phone numbers.
//!
//! [`Resolver::resolve`] serves a number from the store when a record exists
//! under the exact key, and otherwise derives, stores and returns it:
//!
//! ```text
//! get(phone) ──hit──▶ details (Cached at ...)
//!     │
//!    miss
//!     ▼
//! derive(phone) ──ok──▶ record ─┐
//!     │                         ├─▶ upsert ─▶ details (Computed locally ...)
//!  ParseError ─▶ degraded record┘
//! ```

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

use crate::derive::Deriver;
use crate::details::ContactDetails;
use crate::record::CacheRecord;
use crate::storage::{RecordStore, StorageError};

/// Attempts made to persist a freshly derived record before giving up.
const UPSERT_ATTEMPTS: usize = 2;

/// Storage failure during resolution.
///
/// Derivation failures never appear here; they become degraded records.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The store could not be read, so it is unknown whether the number is cached.
    #[error("cache lookup failed for '{phone}': {source}")]
    Lookup {
        /// The number being resolved.
        phone: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// The number was resolved but the result could not be stored.
    #[error("failed to cache result for '{phone}': {source}")]
    Persist {
        /// The number being resolved.
        phone: String,
        /// The details that were computed but not stored.
        details: ContactDetails,
        /// Underlying storage failure of the last attempt.
        #[source]
        source: StorageError,
    },
}

impl ResolveError {
    /// The computed details, when resolution got far enough to produce them.
    #[must_use]
    pub const fn details(&self) -> Option<&ContactDetails> {
        match self {
            Self::Lookup { .. } => None,
            Self::Persist { details, .. } => Some(details),
        }
    }

    /// The underlying storage failure.
    #[must_use]
    pub const fn storage_error(&self) -> &StorageError {
        match self {
            Self::Lookup { source, .. } | Self::Persist { source, .. } => source,
        }
    }
}

/// Cache-or-compute front end over a [`RecordStore`] and a [`Deriver`].
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn RecordStore>,
    deriver: Arc<dyn Deriver>,
    miss_lock: Arc<Mutex<()>>,
}

impl Resolver {
    /// Create a resolver over the given store and deriver.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, deriver: Arc<dyn Deriver>) -> Self {
        Self {
            store,
            deriver,
            miss_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Run the store's idempotent schema initialization.
    pub fn ensure_schema(&self) -> Result<(), StorageError> {
        self.store.ensure_schema()
    }

    /// Resolve `phone` into display details.
    ///
    /// The key is used verbatim. On a hit the deriver is not called. On a miss
    /// the result, including the degraded record for unparseable input, is
    /// written back before returning.
    ///
    /// # Errors
    /// - [`ResolveError::Lookup`] if the store cannot be read; the deriver is not called
    /// - [`ResolveError::Persist`] if the result cannot be stored after a retry
    pub fn resolve(&self, phone: &str) -> Result<ContactDetails, ResolveError> {
        if let Some(record) = self.lookup(phone)? {
            debug!(phone, "cache hit");
            return Ok(ContactDetails::cached(&record));
        }

        // Misses are serialized so concurrent callers derive and write a key once.
        let _guard = self.miss_lock.lock().unwrap_or_else(|poisoned| {
            warn!("resolver miss lock was poisoned; continuing");
            poisoned.into_inner()
        });

        if let Some(record) = self.lookup(phone)? {
            debug!(phone, "cache hit after waiting for concurrent miss");
            return Ok(ContactDetails::cached(&record));
        }

        debug!(phone, "cache miss");
        let record = match self.deriver.derive(phone) {
            Ok(derived) => CacheRecord::from_derived(phone, derived),
            Err(e) => {
                debug!(phone, reason = %e.reason, "derivation failed; caching degraded record");
                CacheRecord::degraded(phone)
            }
        };

        let details = ContactDetails::computed(&record);
        match self.persist(record) {
            Ok(()) => Ok(details),
            Err(source) => Err(ResolveError::Persist {
                phone: phone.to_string(),
                details,
                source,
            }),
        }
    }

    fn lookup(&self, phone: &str) -> Result<Option<CacheRecord>, ResolveError> {
        self.store.get(phone).map_err(|source| ResolveError::Lookup {
            phone: phone.to_string(),
            source,
        })
    }

    fn persist(&self, record: CacheRecord) -> Result<(), StorageError> {
        let mut attempt = 1;
        loop {
            match self.store.upsert(record.clone()) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < UPSERT_ATTEMPTS => {
                    warn!(phone = %record.phone, attempt, error = %e, "cache write failed; retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::derive::{Derived, ParseError};
    use crate::details::Provenance;
    use crate::storage::InMemoryRecordStore;

    fn counting_resolver() -> (Resolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let deriver = move |phone: &str| -> Result<Derived, ParseError> {
            counter.fetch_add(1, Ordering::SeqCst);
            if phone.starts_with('+') {
                Ok(Derived {
                    formatted: format!("fmt {phone}"),
                    valid: true,
                    carrier: Some("Carrier".to_string()),
                    timezone: None,
                })
            } else {
                Err(ParseError::new(phone, "no country code"))
            }
        };
        let resolver = Resolver::new(Arc::new(InMemoryRecordStore::new()), Arc::new(deriver));
        (resolver, calls)
    }

    /// Store whose reads or writes always fail.
    struct FailingStore {
        fail_reads: bool,
        writes: AtomicUsize,
    }

    impl RecordStore for FailingStore {
        fn ensure_schema(&self) -> Result<(), StorageError> {
            Ok(())
        }

        fn get(&self, _phone: &str) -> Result<Option<CacheRecord>, StorageError> {
            if self.fail_reads {
                Err(StorageError::BackendError("read failed".to_string()))
            } else {
                Ok(None)
            }
        }

        fn upsert(&self, _record: CacheRecord) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::BackendError("disk full".to_string()))
        }

        fn count(&self) -> Result<usize, StorageError> {
            Ok(0)
        }
    }

    #[test]
    fn test_second_resolve_is_served_from_cache() {
        let (resolver, calls) = counting_resolver();

        let first = resolver.resolve("+15551234").unwrap();
        assert_eq!(first.provenance(), &Provenance::Computed);

        let second = resolver.resolve("+15551234").unwrap();
        assert!(second.is_cache_hit());
        assert_eq!(first.fields(), second.fields());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_parse_failure_is_cached_as_degraded() {
        let (resolver, calls) = counting_resolver();

        let first = resolver.resolve("garbage").unwrap();
        let second = resolver.resolve("garbage").unwrap();

        assert_eq!(first.fields(), second.fields());
        assert_eq!(first.lines()[0], "Phone: garbage");
        assert_eq!(first.lines()[1], "Valid: No");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stored = resolver.store().get("garbage").unwrap().unwrap();
        assert_eq!(stored.formatted, "garbage");
        assert!(!stored.valid);
    }

    #[test]
    fn test_lookup_failure_is_not_a_miss() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let store = Arc::new(FailingStore {
            fail_reads: true,
            writes: AtomicUsize::new(0),
        });
        let resolver = Resolver::new(
            store.clone(),
            Arc::new(move |_: &str| -> Result<Derived, ParseError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ParseError::new("", "unused"))
            }),
        );

        let err = resolver.resolve("+1").unwrap_err();
        assert!(matches!(err, ResolveError::Lookup { .. }));
        assert!(err.details().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_write_failure_is_retried_then_reported_with_details() {
        let store = Arc::new(FailingStore {
            fail_reads: false,
            writes: AtomicUsize::new(0),
        });
        let resolver = Resolver::new(
            store.clone(),
            Arc::new(|phone: &str| -> Result<Derived, ParseError> {
                Err(ParseError::new(phone, "bad"))
            }),
        );

        let err = resolver.resolve("abc").unwrap_err();
        assert_eq!(store.writes.load(Ordering::SeqCst), UPSERT_ATTEMPTS);
        let details = err.details().unwrap();
        assert_eq!(details.lines()[0], "Phone: abc");
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_keys_are_not_normalized() {
        let (resolver, calls) = counting_resolver();
        resolver.resolve("+1 555 1234").unwrap();
        resolver.resolve("+15551234").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.store().count().unwrap(), 2);
    }
}
