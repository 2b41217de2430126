//! Concurrent resolution of the same and of distinct numbers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use phonecache::{Derived, InMemoryRecordStore, ParseError, RecordStore, Resolver};

const THREADS: usize = 8;

fn slow_counting_resolver(store: Arc<dyn RecordStore>) -> (Resolver, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let deriver = move |phone: &str| -> Result<Derived, ParseError> {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(std::time::Duration::from_millis(5));
        Ok(Derived {
            formatted: format!("formatted {phone}"),
            valid: true,
            carrier: None,
            timezone: Some("Etc/UTC".to_string()),
        })
    };
    (Resolver::new(store, Arc::new(deriver)), calls)
}

#[test]
fn test_same_number_is_derived_once() {
    let store = Arc::new(InMemoryRecordStore::new());
    let (resolver, calls) = slow_counting_resolver(store.clone());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let resolver = resolver.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                resolver.resolve("+14155552671").unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(results.iter().filter(|d| !d.is_cache_hit()).count(), 1);
    assert!(results.iter().all(|d| d.fields() == results[0].fields()));
}

#[test]
fn test_distinct_numbers_each_stored() {
    let store = Arc::new(InMemoryRecordStore::new());
    let (resolver, calls) = slow_counting_resolver(store.clone());

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let resolver = resolver.clone();
            thread::spawn(move || {
                resolver.resolve(&format!("+4420794600{i:02}")).unwrap();
                resolver.resolve(&format!("+4420794600{i:02}")).unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_cache_hit());
    }
    assert_eq!(calls.load(Ordering::SeqCst), THREADS);
    assert_eq!(store.count().unwrap(), THREADS);
}

#[cfg(feature = "persistent")]
#[test]
fn test_concurrent_writers_survive_reopen() {
    use phonecache::open_store;

    let dir = tempfile::tempdir().unwrap();
    {
        let store = Arc::new(open_store(dir.path(), None).unwrap());
        let (resolver, _) = slow_counting_resolver(store);

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let resolver = resolver.clone();
                thread::spawn(move || resolver.resolve(&format!("+1212555{i:04}")).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    let store = open_store(dir.path(), None).unwrap();
    assert_eq!(store.count().unwrap(), THREADS);
    for i in 0..THREADS {
        let record = store.get(&format!("+1212555{i:04}")).unwrap().unwrap();
        assert_eq!(record.formatted, format!("formatted +1212555{i:04}"));
    }
}
