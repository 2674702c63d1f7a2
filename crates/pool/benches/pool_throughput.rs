// Pool throughput benchmarks.
//
// Measures raw add/get overhead with a zero-cost entry (no native resource,
// instant recycle), plus the cost of a resize pass over a full bucket.

use std::hint::black_box;

use atlas_pool::{PoolConfig, PoolManager, Poolable};
use criterion::{Criterion, criterion_group, criterion_main};

// -- Minimal no-op entry for measuring pool overhead only --

struct NoOp(u64);

impl Poolable for NoOp {
    fn recycle(&mut self) {
        self.0 = 0;
    }
}

fn bench_add_get_cycle(c: &mut Criterion) {
    let manager = PoolManager::new();
    manager.add_to_pool(NoOp(0));

    c.bench_function("add_get_cycle", |b| {
        b.iter(|| {
            let entry = manager.get_from_pool::<NoOp>().expect("entry pooled");
            manager.add_to_pool(black_box(entry));
        });
    });
}

fn bench_get_miss(c: &mut Criterion) {
    struct Missing;
    impl Poolable for Missing {
        fn recycle(&mut self) {}
    }

    let manager = PoolManager::new();
    manager.add_to_pool(NoOp(0));

    c.bench_function("get_miss", |b| {
        b.iter(|| black_box(manager.get_from_pool::<Missing>()));
    });
}

fn bench_resize_pass(c: &mut Criterion) {
    let config = PoolConfig {
        max_size: 1024,
        destroy_count: 64,
        ..Default::default()
    };

    c.bench_function("resize_pass_at_cap", |b| {
        let manager = PoolManager::with_config(config.clone()).expect("valid config");
        for serial in 0..1024 {
            manager.add_to_pool(NoOp(serial));
        }
        // Bucket sits exactly at the cap: the pass scans and evicts nothing.
        b.iter(|| manager.resize_pools());
    });
}

criterion_group!(
    benches,
    bench_add_get_cycle,
    bench_get_miss,
    bench_resize_pass
);
criterion_main!(benches);
