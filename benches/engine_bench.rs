use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use crossbeam_utils::thread;
use rand::prelude::*;
use rand::rngs::SmallRng;
use tabletkv::{ShardedTablet, Tablet, TabletEngine};

const ROWS: usize = 1_000;

/// random row and column keys, rows drawn from a fixed key space so that reads hit
fn keys(count: usize) -> Vec<(String, String)> {
    let mut rng = SmallRng::seed_from_u64(1);
    (0..count)
        .map(|_| {
            (
                format!("row{}", rng.gen_range(0..ROWS)),
                format!("col{}", rng.gen_range(0..4)),
            )
        })
        .collect()
}

fn populated<E: TabletEngine>(engine: E, keys: &[(String, String)]) -> E {
    for (row, col) in keys {
        engine.put(row, col, vec![0; 64]).unwrap();
    }
    engine
}

fn put_bench(c: &mut Criterion) {
    let keys = keys(ROWS);
    let mut group = c.benchmark_group("put");
    group.bench_function("tablet", |b| {
        b.iter_batched(
            Tablet::new,
            |tablet| populated(tablet, &keys),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("sharded", |b| {
        b.iter_batched(
            ShardedTablet::new,
            |tablet| populated(tablet, &keys),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn get_bench(c: &mut Criterion) {
    let keys = keys(ROWS);
    let tablet = populated(Tablet::new(), &keys);
    let sharded = populated(ShardedTablet::new(), &keys);

    let mut group = c.benchmark_group("get");
    group.bench_function("tablet", |b| {
        b.iter(|| {
            for (row, col) in &keys {
                tablet.get(row, col).unwrap();
            }
        })
    });
    group.bench_function("sharded", |b| {
        b.iter(|| {
            for (row, col) in &keys {
                sharded.get(row, col).unwrap();
            }
        })
    });
    group.finish();
}

/// every thread repeatedly fills and empties its own row
fn churn<E: TabletEngine + Sync>(engine: &E, threads: usize) {
    thread::scope(|s| {
        for t in 0..threads {
            let engine = engine.clone();
            s.spawn(move |_| {
                let row = format!("row{}", t);
                for _ in 0..100 {
                    engine.put(&row, "col", vec![1; 16]).unwrap();
                    engine.delete(&row, "col").unwrap();
                }
            });
        }
    })
    .unwrap();
}

fn churn_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    for threads in [1usize, 4, 8].iter() {
        let tablet = Tablet::new();
        group.bench_with_input(BenchmarkId::new("tablet", threads), threads, |b, &threads| {
            b.iter(|| churn(&tablet, threads))
        });
        let sharded = ShardedTablet::new();
        group.bench_with_input(BenchmarkId::new("sharded", threads), threads, |b, &threads| {
            b.iter(|| churn(&sharded, threads))
        });
    }
    group.finish();
}

criterion_group!(benches, put_bench, get_bench, churn_bench);
criterion_main!(benches);
