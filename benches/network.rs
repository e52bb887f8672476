//! Criterion benchmarks for the hebbnet tick loop.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use hebbnet::observer::SimSnapshot;
use hebbnet::prelude::*;

fn make_net(neurons_per_region: usize, seed: u64) -> Network {
    let cfg = NetworkConfig::default()
        .with_neurons_per_region(neurons_per_region)
        .with_seed(seed);
    Network::new(cfg).unwrap()
}

/// Benchmark the full tick with varying region sizes.
fn bench_tick_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_size");

    for size in [15, 30, 60, 120].iter() {
        // Six regions plus the 20-neuron hub.
        group.throughput(Throughput::Elements((*size * 6 + 20) as u64));

        group.bench_with_input(BenchmarkId::new("update", size), size, |b, &size| {
            let mut net = make_net(size, 42);

            // Warm up: get some activity going.
            for _ in 0..50 {
                net.stimulate_region("sensory", 1.0).unwrap();
                net.update(1.0, true, 0.02, 0.1);
            }

            b.iter(|| {
                net.inject_input(&[1.0, 0.0, 1.0]).unwrap();
                net.update(1.0, true, 0.02, 0.1);
                black_box(net.stats().active_neurons)
            });
        });
    }

    group.finish();
}

/// Benchmark the tick with plasticity on versus off at a fixed size.
fn bench_tick_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_mode");

    let size = 60;
    group.throughput(Throughput::Elements((size * 6 + 20) as u64));

    group.bench_function("learning_on_60", |b| {
        let mut net = make_net(size, 42);
        for _ in 0..50 {
            net.stimulate_region("sensory", 1.0).unwrap();
            net.update(1.0, true, 0.02, 0.1);
        }

        b.iter(|| {
            net.inject_input(&[1.0, 0.0, 1.0]).unwrap();
            net.update(1.0, true, 0.02, 0.1);
            black_box(net.stats().active_neurons)
        });
    });

    group.bench_function("learning_off_60", |b| {
        let mut net = make_net(size, 42);
        for _ in 0..50 {
            net.stimulate_region("sensory", 1.0).unwrap();
            net.update(1.0, true, 0.02, 0.1);
        }

        b.iter(|| {
            net.inject_input(&[1.0, 0.0, 1.0]).unwrap();
            net.update(1.0, false, 0.02, 0.1);
            black_box(net.stats().active_neurons)
        });
    });

    group.finish();
}

/// Benchmark the global reward broadcast over all connections.
fn bench_reward(c: &mut Criterion) {
    let mut group = c.benchmark_group("reward");

    for size in [30, 60, 120].iter() {
        let probe = make_net(*size, 42);
        group.throughput(Throughput::Elements(probe.connection_count() as u64));

        group.bench_with_input(BenchmarkId::new("broadcast", size), size, |b, &size| {
            let mut net = make_net(size, 42);
            for _ in 0..50 {
                net.stimulate_region("sensory", 1.0).unwrap();
                net.update(1.0, true, 0.02, 0.1);
            }

            b.iter(|| {
                net.apply_global_reward(1.5, 0.08);
                black_box(net.mean_last_weight_change())
            });
        });
    }

    group.finish();
}

/// Benchmark snapshot capture and JSON encoding.
fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    let mut sim = Simulation::new(SimConfig::default().with_seed(42)).unwrap();
    for _ in 0..120 {
        sim.step();
    }

    group.bench_function("capture", |b| {
        b.iter(|| black_box(SimSnapshot::capture(&sim).neurons.len()));
    });

    group.bench_function("capture_to_json", |b| {
        b.iter(|| {
            let snap = SimSnapshot::capture(&sim);
            black_box(serde_json::to_string(&snap).unwrap().len())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_tick_sizes,
    bench_tick_modes,
    bench_reward,
    bench_snapshot,
);

criterion_main!(benches);
