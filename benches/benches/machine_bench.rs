//! # State Machine Benchmarks
//!
//! Full visitor cycles through the checkpoint machine, with and without
//! subscribers on the bus.
//!
//! Run: `cargo bench --bench machine_bench`

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gate_core::prelude::*;

fn config() -> MachineConfig {
    MachineConfig {
        allow_list: [42, 100, 55].into_iter().collect(),
        max_tries: 3,
    }
}

fn allowed_cycle(sm: &mut SecurityStateMachine) {
    sm.walk_up().unwrap();
    sm.open(42).unwrap();
    sm.identify().unwrap();
    sm.move_on().unwrap();
}

fn detained_cycle(sm: &mut SecurityStateMachine) {
    sm.walk_up().unwrap();
    sm.open(7).unwrap();
    for _ in 0..3 {
        sm.identify().unwrap();
    }
    sm.detain().unwrap();
    sm.move_on().unwrap();
}

fn bench_cycles(c: &mut Criterion) {
    let mut group = c.benchmark_group("machine");

    let mut quiet = SecurityStateMachine::new(EventBus::new(), config());
    group.bench_function("allowed_cycle", |b| b.iter(|| allowed_cycle(black_box(&mut quiet))));
    group.bench_function("detained_cycle", |b| b.iter(|| detained_cycle(black_box(&mut quiet))));

    let bus = EventBus::new();
    for kind in EventKind::ALL {
        bus.subscribe(kind, |event| {
            black_box(event.get("id"));
            Ok(())
        })
        .unwrap();
    }
    let mut observed = SecurityStateMachine::new(bus, config());
    group.bench_function("allowed_cycle_observed", |b| {
        b.iter(|| allowed_cycle(black_box(&mut observed)))
    });

    group.bench_function("perform_by_name", |b| {
        let mut sm = SecurityStateMachine::new(EventBus::new(), config());
        b.iter(|| {
            sm.perform("walk_up", &[]).unwrap();
            sm.perform("hack", &[]).unwrap();
            sm.perform("ignore", &[]).unwrap();
            sm.perform("move_on", &[]).unwrap();
        })
    });

    group.bench_function("rejected_action", |b| {
        let mut sm = SecurityStateMachine::new(EventBus::new(), config());
        b.iter(|| black_box(sm.detain().is_err()))
    });

    group.finish();
}

criterion_group!(benches, bench_cycles);
criterion_main!(benches);
