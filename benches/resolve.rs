use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use phonecache::{InMemoryRecordStore, PhoneNumberDeriver, RecordStore, Resolver};

fn make_resolver() -> Resolver {
    Resolver::new(
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(PhoneNumberDeriver::new()),
    )
}

fn bench_resolve_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(1));

    group.bench_function("cache_hit", |b| {
        let resolver = make_resolver();
        resolver.resolve("+14155552671").unwrap();

        b.iter(|| resolver.resolve("+14155552671").unwrap());
    });

    group.finish();
}

fn bench_resolve_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(1));

    group.bench_function("cache_miss", |b| {
        b.iter_custom(|iters| {
            // Fresh store per sample so every call is a miss.
            let resolver = make_resolver();
            let phones: Vec<String> = (0..iters).map(|i| format!("+1415{i:07}")).collect();

            let start = Instant::now();
            for phone in &phones {
                resolver.resolve(phone).unwrap();
            }
            let elapsed = start.elapsed();
            assert_eq!(resolver.store().count().unwrap(), phones.len());
            elapsed
        });
    });

    group.bench_function("cache_miss_unparseable", |b| {
        b.iter_custom(|iters| {
            let resolver = make_resolver();

            let start = Instant::now();
            for i in 0..iters {
                resolver.resolve(&format!("not-a-number-{i}")).unwrap();
            }
            start.elapsed()
        });
    });

    group.finish();
}

criterion_group!(resolve, bench_resolve_hit, bench_resolve_miss);
criterion_main!(resolve);
