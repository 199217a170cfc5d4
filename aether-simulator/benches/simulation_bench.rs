#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use aether_config::AetherConfig;
use aether_simulator::{puzzles::sleep_sort, run_walkers};

/// Benchmark a full walker run: spawning, ticking, journaling and hashing.
fn benchmark_walker_run(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("walker_run");
    for walkers in [16, 256, 2048] {
        let mut config = AetherConfig::default();
        config.demo.walkers = walkers;
        config.demo.seed = 42;
        config.driver.max_ticks = 10_000;

        group.throughput(criterion::Throughput::Elements(walkers as u64));
        group.bench_function(format!("walkers_{walkers}"), |b| {
            b.to_async(&runtime)
                .iter(|| async { black_box(run_walkers(&config, None).await.unwrap()) });
        });
    }
    group.finish();
}

fn benchmark_sleep_sort(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let values: Vec<u32> = (0..1_000u32).map(|i| (i * 7_919) % 1_000).collect();

    c.bench_function("sleep_sort_1000", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(sleep_sort(&values).await.unwrap()) });
    });
}

criterion_group!(benches, benchmark_walker_run, benchmark_sleep_sort);
criterion_main!(benches);
