#[macro_use]
extern crate criterion;

use std::sync::Arc;

use criterion::{black_box, Criterion};

use aether_core::time::{Duration, Instant};
use aether_core::Scheduler;

/// Spawns `waiters` tasks spread over `instants` distinct instants and drives the
/// clock through all of them.
async fn fire_and_drain(waiters: usize, instants: i64) -> Instant {
    let scheduler = Arc::new(Scheduler::new());
    for i in 0..waiters {
        let scheduler = scheduler.clone();
        let wake = Instant::from_flickers(i as i64 % instants + 1);
        tokio::spawn(async move { scheduler.wait_until(wake).await });
    }
    while scheduler.waiting() < waiters {
        tokio::task::yield_now().await;
    }
    scheduler.advance(Duration::flickers(instants)).await
}

fn bench_advance_throughput(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("advance_throughput");
    for (waiters, instants) in [(128, 1), (1024, 64), (8192, 1024)] {
        group.throughput(criterion::Throughput::Elements(waiters as u64));
        group.bench_function(format!("waiters_{waiters}_instants_{instants}"), |b| {
            b.to_async(&runtime)
                .iter(|| async move { black_box(fire_and_drain(waiters, instants).await) });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_advance_throughput);
criterion_main!(benches);
