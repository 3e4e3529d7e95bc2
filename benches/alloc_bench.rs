//! Benchmarks for allocate/release round trips.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pinned_host_mem::runtime::{SimulatedRuntime, TrackingRuntime};
use pinned_host_mem::{HostAllocFlags, PinnedMemoryGateway};

fn bench_round_trip(c: &mut Criterion) {
    let gw = PinnedMemoryGateway::new(SimulatedRuntime::new(1 << 30));

    for size in [4096u64, 32 * 1024] {
        c.bench_function(&format!("simulated_alloc_release_{size}"), |b| {
            b.iter(|| {
                let addr = gw.allocate(black_box(size), HostAllocFlags::DEFAULT).unwrap();
                gw.release(black_box(addr)).unwrap();
            })
        });
    }
}

fn bench_tracking_overhead(c: &mut Criterion) {
    let gw = PinnedMemoryGateway::new(TrackingRuntime::new(SimulatedRuntime::new(1 << 30)));

    c.bench_function("tracked_alloc_release_4096", |b| {
        b.iter(|| {
            let addr = gw.allocate(black_box(4096), HostAllocFlags::DEFAULT).unwrap();
            gw.release(black_box(addr)).unwrap();
        })
    });
}

criterion_group!(benches, bench_round_trip, bench_tracking_overhead);
criterion_main!(benches);
