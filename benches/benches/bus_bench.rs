//! # Event Bus Benchmarks
//!
//! Measures synchronous dispatch cost as the subscriber list grows.
//!
//! Run: `cargo bench --bench bus_bench`

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gate_core::prelude::*;

fn bench_notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_bus");

    for subscribers in [0usize, 1, 8, 64] {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicU64::new(0));
        for _ in 0..subscribers {
            let hits = hits.clone();
            bus.subscribe(EventKind::PersonIdAttempt, move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
            .unwrap();
        }

        let event = SecurityEvent::new(EventKind::PersonIdAttempt).with("id", 42);
        group.bench_with_input(BenchmarkId::new("notify", subscribers), &event, |b, event| {
            b.iter(|| black_box(bus.notify(event).unwrap()))
        });
    }

    group.bench_function("subscribe_unsubscribe", |b| {
        let bus = EventBus::new();
        b.iter(|| {
            let id = bus.subscribe(EventKind::PersonEnter, |_| Ok(())).unwrap();
            bus.unsubscribe(EventKind::PersonEnter, id).unwrap();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_notify);
criterion_main!(benches);
