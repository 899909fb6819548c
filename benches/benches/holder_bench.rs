//! # Frame Holder Benchmarks
//!
//! Cost of publishing and snapshotting frames, alone and under a concurrent
//! writer.
//!
//! Run: `cargo bench --bench holder_bench`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gate_camera::{FrameHolder, Frame, Pixel};

fn bench_holder(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_holder");

    let holder = FrameHolder::new();
    let frame = Frame::filled(320, 240, Pixel::gray(128), 0);

    group.bench_function("publish_320x240", |b| {
        b.iter(|| black_box(holder.publish(frame.clone())))
    });

    group.bench_function("latest", |b| b.iter(|| black_box(holder.latest())));

    let shared = Arc::new(FrameHolder::new());
    let stop = Arc::new(AtomicBool::new(false));
    let writer = {
        let shared = shared.clone();
        let stop = stop.clone();
        let frame = Frame::filled(64, 48, Pixel::gray(1), 0);
        std::thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                shared.publish(frame.clone());
            }
        })
    };

    group.bench_function("latest_contended", |b| b.iter(|| black_box(shared.latest())));

    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
    group.finish();
}

criterion_group!(benches, bench_holder);
criterion_main!(benches);
