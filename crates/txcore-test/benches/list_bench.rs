//! Benchmarks for observable list operations

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use txcore_collections::{FnListener, ListChange, ObservableList};
use txcore_test::CountingListener;

fn bench_push_unobserved(c: &mut Criterion) {
    let list = ObservableList::new();

    c.bench_function("push_unobserved", |b| {
        b.iter(|| {
            let _ = list.push(black_box(7u64));
        })
    });
}

fn bench_get(c: &mut Criterion) {
    let list = ObservableList::from((0..1000u64).collect::<Vec<_>>());

    c.bench_function("get_1000", |b| {
        b.iter(|| black_box(list.get(black_box(500))))
    });
}

fn bench_as_unmodifiable(c: &mut Criterion) {
    let list = ObservableList::from((0..1000u64).collect::<Vec<_>>());

    c.bench_function("as_unmodifiable_1000", |b| {
        b.iter(|| black_box(list.as_unmodifiable()))
    });
}

fn bench_dispatch_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_fan_out");

    for listeners in [1usize, 8, 64] {
        let list = ObservableList::new();
        let counters: Vec<Arc<CountingListener>> =
            (0..listeners).map(|_| Arc::new(CountingListener::new())).collect();
        for counter in &counters {
            list.add_listener(counter);
        }

        group.bench_with_input(BenchmarkId::from_parameter(listeners), &listeners, |b, _| {
            b.iter(|| {
                let _ = list.push(black_box(1u64));
            })
        });
    }

    group.finish();
}

fn bench_remove_where(c: &mut Criterion) {
    let seed: Vec<u64> = (0..1000).collect();

    c.bench_function("remove_where_half_of_1000", |b| {
        b.iter_batched(
            || ObservableList::from(seed.clone()),
            |list| black_box(list.remove_where(|v| v % 2 == 0)),
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_remove_where_no_match(c: &mut Criterion) {
    let list = ObservableList::from((0..1000u64).collect::<Vec<_>>());
    let sink = Arc::new(FnListener::new(|change: &ListChange<u64>| {
        black_box(change.kind());
    }));
    list.add_listener(&sink);

    c.bench_function("remove_where_no_match_1000", |b| {
        b.iter(|| black_box(list.remove_where(|v| *v > 5000)))
    });
}

fn bench_replace_all(c: &mut Criterion) {
    let list = ObservableList::from((0..100u64).collect::<Vec<_>>());
    let counter = Arc::new(CountingListener::new());
    list.add_listener(&counter);

    c.bench_function("replace_all_100", |b| {
        b.iter(|| {
            let _ = list.replace_all(black_box(0..100u64));
        })
    });
}

criterion_group!(
    benches,
    bench_push_unobserved,
    bench_get,
    bench_as_unmodifiable,
    bench_dispatch_fan_out,
    bench_remove_where,
    bench_remove_where_no_match,
    bench_replace_all,
);

criterion_main!(benches);
